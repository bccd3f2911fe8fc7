//! Qdrant REST clients
//!
//! [`QdrantHttp`] (blocking) and [`AsyncQdrantHttp`] share URL layout,
//! request bodies and response decoding; only the transport differs.

use super::api::{
    AsyncQdrantApi, QdrantApi, QdrantPoint, RetrievedPoint, ScoredPoint, SearchPoints, VectorParams,
};
use crate::native::{NativeError, NativeResult};
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use std::fmt;
use std::time::Duration;

const API_KEY_HEADER: &str = "api-key";

/// Every Qdrant response wraps its payload in `result`
#[derive(Deserialize)]
struct Envelope<T> {
    result: T,
}

#[derive(Deserialize)]
struct CollectionDescription {
    config: CollectionConfigBody,
}

#[derive(Deserialize)]
struct CollectionConfigBody {
    params: CollectionParams,
}

#[derive(Deserialize)]
struct CollectionParams {
    vectors: Value,
}

#[derive(Deserialize)]
struct CountResult {
    count: usize,
}

struct Endpoint {
    base: String,
    api_key: Option<String>,
}

impl Endpoint {
    fn new(url: &str, api_key: Option<String>) -> Self {
        Endpoint {
            base: url.trim_end_matches('/').to_string(),
            api_key,
        }
    }

    fn health(&self) -> String {
        format!("{}/healthz", self.base)
    }

    fn collection(&self, name: &str) -> String {
        format!("{}/collections/{}", self.base, name)
    }

    fn points(&self, name: &str, suffix: &str) -> String {
        format!("{}/collections/{}/points{}", self.base, name, suffix)
    }
}

fn check_status(status: StatusCode, body: String) -> NativeResult<String> {
    if status.is_success() {
        return Ok(body);
    }
    Err(match status.as_u16() {
        429 => NativeError::RateLimited(body),
        code => NativeError::status(code, body),
    })
}

fn decode<T: DeserializeOwned>(body: &str) -> NativeResult<T> {
    Ok(serde_json::from_str::<Envelope<T>>(body)?.result)
}

fn vector_params(body: &str) -> NativeResult<VectorParams> {
    let description: CollectionDescription = decode(body)?;
    serde_json::from_value(description.config.params.vectors).map_err(|_| {
        NativeError::Decode("collection uses named vectors, which are not supported".to_string())
    })
}

fn create_body(params: &VectorParams) -> Value {
    json!({ "vectors": params })
}

fn upsert_body(points: &[QdrantPoint]) -> Value {
    json!({ "points": points })
}

fn retrieve_body(ids: &[String], with_vector: bool) -> Value {
    json!({ "ids": ids, "with_payload": true, "with_vector": with_vector })
}

fn delete_body(ids: &[String]) -> Value {
    json!({ "points": ids })
}

fn count_body() -> Value {
    json!({ "exact": true })
}

/// Blocking Qdrant client
pub struct QdrantHttp {
    client: reqwest::blocking::Client,
    endpoint: Endpoint,
}

impl fmt::Debug for QdrantHttp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QdrantHttp")
            .field("url", &self.endpoint.base)
            .field("has_api_key", &self.endpoint.api_key.is_some())
            .finish()
    }
}

impl QdrantHttp {
    /// Client for a server at `url`
    pub fn new(url: &str, api_key: Option<String>, timeout: Duration) -> NativeResult<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| NativeError::Connect(format!("failed to build HTTP client: {}", e)))?;
        Ok(QdrantHttp {
            client,
            endpoint: Endpoint::new(url, api_key),
        })
    }

    fn send(&self, request: reqwest::blocking::RequestBuilder) -> NativeResult<String> {
        let request = match &self.endpoint.api_key {
            Some(key) => request.header(API_KEY_HEADER, key),
            None => request,
        };
        let response = request.send()?;
        let status = response.status();
        let body = response.text()?;
        check_status(status, body)
    }
}

impl QdrantApi for QdrantHttp {
    fn health(&self) -> NativeResult<()> {
        self.send(self.client.get(self.endpoint.health()))?;
        Ok(())
    }

    fn collection(&self, name: &str) -> NativeResult<Option<VectorParams>> {
        match self.send(self.client.get(self.endpoint.collection(name))) {
            Ok(body) => vector_params(&body).map(Some),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn create_collection(&self, name: &str, params: &VectorParams) -> NativeResult<()> {
        let request = self
            .client
            .put(self.endpoint.collection(name))
            .json(&create_body(params));
        self.send(request)?;
        Ok(())
    }

    fn upsert_points(&self, name: &str, points: &[QdrantPoint]) -> NativeResult<()> {
        let request = self
            .client
            .put(self.endpoint.points(name, "?wait=true"))
            .json(&upsert_body(points));
        self.send(request)?;
        Ok(())
    }

    fn search(&self, name: &str, search: &SearchPoints) -> NativeResult<Vec<ScoredPoint>> {
        let request = self
            .client
            .post(self.endpoint.points(name, "/search"))
            .json(search);
        decode(&self.send(request)?)
    }

    fn retrieve(
        &self,
        name: &str,
        ids: &[String],
        with_vector: bool,
    ) -> NativeResult<Vec<RetrievedPoint>> {
        let request = self
            .client
            .post(self.endpoint.points(name, ""))
            .json(&retrieve_body(ids, with_vector));
        decode(&self.send(request)?)
    }

    fn delete_points(&self, name: &str, ids: &[String]) -> NativeResult<()> {
        let request = self
            .client
            .post(self.endpoint.points(name, "/delete?wait=true"))
            .json(&delete_body(ids));
        self.send(request)?;
        Ok(())
    }

    fn count(&self, name: &str) -> NativeResult<usize> {
        let request = self
            .client
            .post(self.endpoint.points(name, "/count"))
            .json(&count_body());
        Ok(decode::<CountResult>(&self.send(request)?)?.count)
    }
}

/// Non-blocking Qdrant client
pub struct AsyncQdrantHttp {
    client: reqwest::Client,
    endpoint: Endpoint,
}

impl fmt::Debug for AsyncQdrantHttp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AsyncQdrantHttp")
            .field("url", &self.endpoint.base)
            .field("has_api_key", &self.endpoint.api_key.is_some())
            .finish()
    }
}

impl AsyncQdrantHttp {
    /// Client for a server at `url`
    pub fn new(url: &str, api_key: Option<String>, timeout: Duration) -> NativeResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| NativeError::Connect(format!("failed to build HTTP client: {}", e)))?;
        Ok(AsyncQdrantHttp {
            client,
            endpoint: Endpoint::new(url, api_key),
        })
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> NativeResult<String> {
        let request = match &self.endpoint.api_key {
            Some(key) => request.header(API_KEY_HEADER, key),
            None => request,
        };
        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;
        check_status(status, body)
    }
}

#[async_trait]
impl AsyncQdrantApi for AsyncQdrantHttp {
    async fn health(&self) -> NativeResult<()> {
        self.send(self.client.get(self.endpoint.health())).await?;
        Ok(())
    }

    async fn collection(&self, name: &str) -> NativeResult<Option<VectorParams>> {
        match self.send(self.client.get(self.endpoint.collection(name))).await {
            Ok(body) => vector_params(&body).map(Some),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn create_collection(&self, name: &str, params: &VectorParams) -> NativeResult<()> {
        let request = self
            .client
            .put(self.endpoint.collection(name))
            .json(&create_body(params));
        self.send(request).await?;
        Ok(())
    }

    async fn upsert_points(&self, name: &str, points: &[QdrantPoint]) -> NativeResult<()> {
        let request = self
            .client
            .put(self.endpoint.points(name, "?wait=true"))
            .json(&upsert_body(points));
        self.send(request).await?;
        Ok(())
    }

    async fn search(&self, name: &str, search: &SearchPoints) -> NativeResult<Vec<ScoredPoint>> {
        let request = self
            .client
            .post(self.endpoint.points(name, "/search"))
            .json(search);
        decode(&self.send(request).await?)
    }

    async fn retrieve(
        &self,
        name: &str,
        ids: &[String],
        with_vector: bool,
    ) -> NativeResult<Vec<RetrievedPoint>> {
        let request = self
            .client
            .post(self.endpoint.points(name, ""))
            .json(&retrieve_body(ids, with_vector));
        decode(&self.send(request).await?)
    }

    async fn delete_points(&self, name: &str, ids: &[String]) -> NativeResult<()> {
        let request = self
            .client
            .post(self.endpoint.points(name, "/delete?wait=true"))
            .json(&delete_body(ids));
        self.send(request).await?;
        Ok(())
    }

    async fn count(&self, name: &str) -> NativeResult<usize> {
        let request = self
            .client
            .post(self.endpoint.points(name, "/count"))
            .json(&count_body());
        Ok(decode::<CountResult>(&self.send(request).await?)?.count)
    }
}
