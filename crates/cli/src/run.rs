//! Action execution against the configured clients.

use crate::format::Output;
use crate::parse::{Action, Input};
use dataclients::{
    AsyncDataClients, Backend, ClientsConfig, DataClients, Document, Error, Payload, Result,
    RetentionPolicy, SearchRequest, VectorRecord,
};
use dataclients_vectorstore::ChromaStore;
use tracing::debug;

fn request(input: Input, n_results: usize) -> SearchRequest {
    match input {
        Input::Vector(v) => SearchRequest::vector(v, n_results),
        Input::Text(t) => SearchRequest::text(t, n_results),
    }
}

fn record(id: String, vector: Vec<f32>, payload: Payload) -> VectorRecord {
    VectorRecord::new(id, vector).with_payload(payload)
}

fn paired(ids: Vec<String>, records: Vec<Option<VectorRecord>>) -> Output {
    Output::Records(ids.into_iter().zip(records).collect())
}

/// Run one action, closing the clients afterwards.
pub fn execute(action: Action, config: ClientsConfig) -> Result<Output> {
    debug!(backend = %config.store.backend, collection = action.collection(), "executing");
    if let Action::Prune {
        collection,
        default_days,
    } = action
    {
        return prune(&collection, default_days, config);
    }
    if config.store.backend.is_async() {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;
        return runtime.block_on(async {
            let clients = AsyncDataClients::open(config).await?;
            let output = execute_async(action, &clients).await;
            clients.close().await?;
            output
        });
    }
    let clients = DataClients::open(config)?;
    let output = execute_sync(action, &clients);
    clients.close()?;
    output
}

fn execute_sync(action: Action, clients: &DataClients) -> Result<Output> {
    match action {
        Action::Upsert {
            collection,
            id,
            input: Input::Text(text),
            payload,
        } => {
            let doc = Document::new(id, text).with_payload(payload);
            clients.upsert_documents(&collection, &[doc])?;
            Ok(Output::Ok)
        }
        Action::Upsert {
            collection,
            id,
            input: Input::Vector(vector),
            payload,
        } => {
            clients.upsert(&collection, &[record(id, vector, payload)])?;
            Ok(Output::Ok)
        }
        Action::Search {
            collection,
            input,
            n_results,
            filter,
            with_vectors,
        } => {
            let mut req = request(input, n_results).with_vectors(with_vectors);
            if let Some(filter) = filter {
                req = req.with_filter(filter);
            }
            Ok(Output::Hits(clients.search(&collection, &req)?))
        }
        Action::Get { collection, ids } => {
            let records = clients.get(&collection, &ids)?;
            Ok(paired(ids, records))
        }
        Action::Delete { collection, ids } => {
            clients.delete(&collection, &ids)?;
            Ok(Output::Ok)
        }
        Action::Count { collection } => Ok(Output::Count(clients.count(&collection)?)),
        Action::Prune { .. } => Err(Error::Config("prune runs outside a client session".to_string())),
    }
}

async fn execute_async(action: Action, clients: &AsyncDataClients) -> Result<Output> {
    match action {
        Action::Upsert {
            collection,
            id,
            input: Input::Text(text),
            payload,
        } => {
            let doc = Document::new(id, text).with_payload(payload);
            clients.upsert_documents(&collection, &[doc]).await?;
            Ok(Output::Ok)
        }
        Action::Upsert {
            collection,
            id,
            input: Input::Vector(vector),
            payload,
        } => {
            clients
                .upsert(&collection, &[record(id, vector, payload)])
                .await?;
            Ok(Output::Ok)
        }
        Action::Search {
            collection,
            input,
            n_results,
            filter,
            with_vectors,
        } => {
            let mut req = request(input, n_results).with_vectors(with_vectors);
            if let Some(filter) = filter {
                req = req.with_filter(filter);
            }
            Ok(Output::Hits(clients.search(&collection, &req).await?))
        }
        Action::Get { collection, ids } => {
            let records = clients.get(&collection, &ids).await?;
            Ok(paired(ids, records))
        }
        Action::Delete { collection, ids } => {
            clients.delete(&collection, &ids).await?;
            Ok(Output::Ok)
        }
        Action::Count { collection } => Ok(Output::Count(clients.count(&collection).await?)),
        Action::Prune { .. } => Err(Error::Config("prune runs outside a client session".to_string())),
    }
}

fn prune(collection: &str, default_days: Option<i64>, config: ClientsConfig) -> Result<Output> {
    if config.store.backend != Backend::EmbeddedLocal {
        return Err(Error::Config(format!(
            "prune needs the embedded-local backend, config uses {}",
            config.store.backend
        )));
    }
    let mut policy = RetentionPolicy::default();
    if let Some(days) = default_days {
        policy.default_days = days;
    }
    let store = ChromaStore::new(config.store, None)?;
    let deleted = store.prune(collection, &policy)?;
    dataclients::VectorStore::close(&store)?;
    Ok(Output::Pruned(deleted))
}
