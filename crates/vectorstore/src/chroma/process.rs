//! Local Chroma server process
//!
//! The embedded-local backend persists into a caller-supplied directory by
//! running `chroma run` as a child process. The child lives exactly as long
//! as the session that started it.

use super::api::ChromaApi;
use super::http::ChromaHttp;
use crate::config::ChromaConfig;
use crate::error::{VectorError, VectorResult};
use std::process::{Child, Command, Stdio};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

const BACKEND: &str = "chroma";
const POLL_INTERVAL: Duration = Duration::from_millis(200);

/// A spawned `chroma run` process, killed on drop
#[derive(Debug)]
pub struct LocalChromaServer {
    child: Child,
}

impl LocalChromaServer {
    /// Start a server for the configured persistence directory
    ///
    /// Creates the directory, launches the server and waits until it
    /// answers heartbeats (or the startup timeout passes).
    pub fn start(config: &ChromaConfig, client: &ChromaHttp) -> VectorResult<Self> {
        let dir = config.persist_dir.as_ref().ok_or_else(|| {
            VectorError::Config("chroma.persist_dir is required to spawn a server".to_string())
        })?;
        std::fs::create_dir_all(dir).map_err(|e| {
            VectorError::fault(
                BACKEND,
                format!("cannot create persist dir {}: {}", dir.display(), e),
            )
        })?;

        let child = Command::new(&config.executable)
            .arg("run")
            .arg("--path")
            .arg(dir)
            .arg("--host")
            .arg(&config.host)
            .arg("--port")
            .arg(config.port.to_string())
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| {
                VectorError::fault(
                    BACKEND,
                    format!("failed to launch '{}': {}", config.executable, e),
                )
            })?;
        info!(pid = child.id(), dir = %dir.display(), port = config.port, "started local chroma server");

        let mut server = LocalChromaServer { child };
        server.wait_ready(client, Duration::from_millis(config.startup_timeout_ms))?;
        Ok(server)
    }

    fn wait_ready(&mut self, client: &ChromaHttp, timeout: Duration) -> VectorResult<()> {
        let deadline = Instant::now() + timeout;
        loop {
            if let Ok(Some(status)) = self.child.try_wait() {
                return Err(VectorError::fault(
                    BACKEND,
                    format!("local server exited during startup ({})", status),
                ));
            }
            match client.heartbeat() {
                Ok(()) => return Ok(()),
                Err(e) if Instant::now() >= deadline => {
                    return Err(VectorError::fault(
                        BACKEND,
                        format!("local server not ready after {:?}: {}", timeout, e),
                    ))
                }
                Err(e) => debug!(error = %e, "waiting for local chroma server"),
            }
            std::thread::sleep(POLL_INTERVAL);
        }
    }

    /// Process id
    pub fn pid(&self) -> u32 {
        self.child.id()
    }
}

impl Drop for LocalChromaServer {
    fn drop(&mut self) {
        let pid = self.child.id();
        if let Err(e) = self.child.kill() {
            warn!(pid, error = %e, "failed to stop local chroma server");
            return;
        }
        match self.child.wait() {
            Ok(status) => debug!(pid, %status, "stopped local chroma server"),
            Err(e) => debug!(pid, error = %e, "local chroma server not reaped"),
        }
    }
}
