//! In-memory backends for tests
//!
//! Each engine implements a native client seam with the server's own
//! semantics, so adapters run unchanged against them. All of them share
//! state across clones and follow a [`FaultPlan`].

mod chroma;
mod faults;
mod qdrant;

pub use chroma::MemoryChroma;
pub use faults::{FaultPlan, Op};
pub use qdrant::MemoryQdrant;
