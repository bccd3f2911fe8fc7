//! Chroma REST client (blocking)

use super::api::{ChromaApi, ChromaCollection, ChromaHits, ChromaRecords};
use crate::native::{NativeError, NativeResult};
use reqwest::blocking::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use std::time::Duration;

/// Blocking client for Chroma's `/api/v1` REST API
#[derive(Debug)]
pub struct ChromaHttp {
    client: Client,
    base: String,
}

impl ChromaHttp {
    /// Build a client for a server at `base_url`
    pub fn new(base_url: &str, timeout: Duration) -> NativeResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| NativeError::Connect(format!("failed to build HTTP client: {}", e)))?;
        Ok(ChromaHttp {
            client,
            base: format!("{}/api/v1", base_url.trim_end_matches('/')),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }

    fn send(&self, request: RequestBuilder) -> NativeResult<Response> {
        let response = request.send()?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().unwrap_or_default();
        Err(match status.as_u16() {
            429 => NativeError::RateLimited(body),
            code => NativeError::status(code, body),
        })
    }

    fn json<T: DeserializeOwned>(&self, request: RequestBuilder) -> NativeResult<T> {
        Ok(self.send(request)?.json()?)
    }
}

#[derive(Deserialize)]
struct PreFlight {
    max_batch_size: Option<usize>,
}

/// Query response: one inner list per query embedding
#[derive(Deserialize)]
struct QueryResponse {
    ids: Vec<Vec<String>>,
    #[serde(default)]
    distances: Option<Vec<Vec<f32>>>,
    #[serde(default)]
    metadatas: Option<Vec<Vec<Option<Map<String, Value>>>>>,
    #[serde(default)]
    documents: Option<Vec<Vec<Option<String>>>>,
    #[serde(default)]
    embeddings: Option<Vec<Vec<Vec<f32>>>>,
}

fn first<T>(outer: Option<Vec<Vec<T>>>) -> Option<Vec<T>> {
    outer.and_then(|v| v.into_iter().next())
}

/// Chroma reports a missing collection with several statuses depending on
/// version; the message is the stable part.
fn is_missing_collection(err: &NativeError) -> bool {
    match err {
        NativeError::Status { status, message } => {
            *status == 404 || message.contains("does not exist")
        }
        _ => false,
    }
}

impl ChromaApi for ChromaHttp {
    fn heartbeat(&self) -> NativeResult<()> {
        self.send(self.client.get(self.url("/heartbeat")))?;
        Ok(())
    }

    fn max_batch_size(&self) -> NativeResult<Option<usize>> {
        match self.json::<PreFlight>(self.client.get(self.url("/pre-flight-checks"))) {
            Ok(checks) => Ok(checks.max_batch_size),
            // Older servers have no pre-flight endpoint
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn get_collection(&self, name: &str) -> NativeResult<Option<ChromaCollection>> {
        match self.json(self.client.get(self.url(&format!("/collections/{}", name)))) {
            Ok(collection) => Ok(Some(collection)),
            Err(e) if is_missing_collection(&e) => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn create_collection(
        &self,
        name: &str,
        metadata: Map<String, Value>,
    ) -> NativeResult<ChromaCollection> {
        let body = json!({ "name": name, "metadata": metadata, "get_or_create": false });
        self.json(self.client.post(self.url("/collections")).json(&body))
    }

    fn upsert(&self, collection_id: &str, records: &ChromaRecords) -> NativeResult<()> {
        let url = self.url(&format!("/collections/{}/upsert", collection_id));
        self.send(self.client.post(url).json(records))?;
        Ok(())
    }

    fn query(
        &self,
        collection_id: &str,
        embedding: &[f32],
        n_results: usize,
        where_filter: Option<&Value>,
        include_embeddings: bool,
    ) -> NativeResult<ChromaHits> {
        let mut include = vec!["metadatas", "documents", "distances"];
        if include_embeddings {
            include.push("embeddings");
        }
        let mut body = json!({
            "query_embeddings": [embedding],
            "n_results": n_results,
            "include": include,
        });
        if let Some(filter) = where_filter {
            body["where"] = filter.clone();
        }
        let url = self.url(&format!("/collections/{}/query", collection_id));
        let response: QueryResponse = self.json(self.client.post(url).json(&body))?;

        let ids = response.ids.into_iter().next().unwrap_or_default();
        let n = ids.len();
        let distances = first(response.distances).unwrap_or_else(|| vec![0.0; n]);
        if distances.len() != n {
            return Err(NativeError::Decode(format!(
                "{} ids but {} distances",
                n,
                distances.len()
            )));
        }
        Ok(ChromaHits {
            ids,
            distances,
            metadatas: first(response.metadatas).unwrap_or_else(|| vec![None; n]),
            documents: first(response.documents).unwrap_or_else(|| vec![None; n]),
            embeddings: first(response.embeddings),
        })
    }

    fn get(
        &self,
        collection_id: &str,
        ids: Option<&[String]>,
        include_embeddings: bool,
    ) -> NativeResult<ChromaRecords> {
        let mut include = vec!["metadatas", "documents"];
        if include_embeddings {
            include.push("embeddings");
        }
        let mut body = json!({ "include": include });
        if let Some(ids) = ids {
            body["ids"] = json!(ids);
        }
        let url = self.url(&format!("/collections/{}/get", collection_id));
        self.json(self.client.post(url).json(&body))
    }

    fn delete(&self, collection_id: &str, ids: &[String]) -> NativeResult<()> {
        let url = self.url(&format!("/collections/{}/delete", collection_id));
        self.send(self.client.post(url).json(&json!({ "ids": ids })))?;
        Ok(())
    }

    fn count(&self, collection_id: &str) -> NativeResult<usize> {
        let url = self.url(&format!("/collections/{}/count", collection_id));
        self.json(self.client.get(url))
    }
}
