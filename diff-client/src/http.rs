use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use reqwest::header::ACCEPT;
use reqwest::header::CONTENT_TYPE;
use reqwest::header::HeaderMap;
use reqwest::header::HeaderValue;
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::api::DiffApi;
use crate::api::NodePoll;
use crate::api::StructurePoll;
use crate::error::ApiError;
use crate::error::ApiResult;
use crate::types::DiffTarget;
use crate::types::NodePageResponse;
use crate::types::NodeRecord;
use crate::types::NodeResponse;
use crate::types::StructureResponse;

const STRUCTURE_PATH: &str = "/api/objectdiffs/structure/";
const NODES_PATH: &str = "/api/objectdiffs/nodes/";
const NODE_PATH: &str = "/api/objectdiffs/node/";

/// Header the server's CSRF middleware reads.
const CSRF_HEADER: &str = "X-CSRFToken";

/// Longest slice of an error body we keep in [`ApiError::Status`].
const MAX_ERROR_BODY: usize = 512;

#[derive(Debug, Clone)]
pub struct HttpDiffApiConfig {
    /// Scheme and host of the diff server, e.g. `http://localhost:8000`.
    pub server_url: String,
    /// Per-request timeout; `None` waits forever.
    pub request_timeout: Option<Duration>,
    pub csrf_token: Option<String>,
}

impl Default for HttpDiffApiConfig {
    fn default() -> Self {
        Self {
            server_url: "http://localhost:8000".to_string(),
            request_timeout: Some(Duration::from_secs(30)),
            csrf_token: None,
        }
    }
}

#[derive(Serialize)]
struct StructureRequest<'a> {
    model: &'a str,
    identity: &'a str,
    left_time: i64,
    right_time: i64,
}

impl<'a> From<&'a DiffTarget> for StructureRequest<'a> {
    fn from(target: &'a DiffTarget) -> Self {
        Self {
            model: &target.model,
            identity: &target.object_id,
            left_time: target.left_time,
            right_time: target.right_time,
        }
    }
}

#[derive(Serialize)]
struct NodesRequest<'a> {
    #[serde(flatten)]
    target: StructureRequest<'a>,
    offset: usize,
    limit: usize,
}

#[derive(Serialize)]
struct NodeRequest<'a> {
    #[serde(flatten)]
    target: StructureRequest<'a>,
    node_model: &'a str,
    node_identity: &'a str,
}

/// [`DiffApi`] over HTTP. Every call is a JSON `POST`.
#[derive(Debug, Clone)]
pub struct HttpDiffApi {
    client: reqwest::Client,
    base_url: String,
}

impl HttpDiffApi {
    pub fn new(config: HttpDiffApiConfig) -> ApiResult<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        if let Some(token) = config.csrf_token.as_deref() {
            let value = HeaderValue::from_str(token)
                .map_err(|_| ApiError::InvalidConfig("invalid CSRF token".to_string()))?;
            headers.insert(CSRF_HEADER, value);
        }

        let mut builder = reqwest::Client::builder()
            .user_agent(concat!("snitch-diff/", env!("CARGO_PKG_VERSION")))
            .default_headers(headers);
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build()?;

        Ok(Self::with_client(client, config.server_url))
    }

    /// Use a preconfigured client. Default headers are the caller's business.
    pub fn with_client(client: reqwest::Client, server_url: impl Into<String>) -> Self {
        let server_url = server_url.into();
        Self {
            client,
            base_url: server_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// POST `body` to `path`. A 404 is reported as `Ok(None)` so the single
    /// node lookup can tell "not in this diff" from a failure.
    async fn post<B, T>(&self, path: &str, body: &B) -> ApiResult<Option<T>>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = format!("{}{path}", self.base_url);
        let response = self.client.post(&url).json(body).send().await?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            let mut message = response.text().await.unwrap_or_default();
            if message.len() > MAX_ERROR_BODY {
                let mut cut = MAX_ERROR_BODY;
                while !message.is_char_boundary(cut) {
                    cut -= 1;
                }
                message.truncate(cut);
            }
            tracing::warn!(%url, status = status.as_u16(), "diff request failed");
            return Err(ApiError::Status {
                status: status.as_u16(),
                message,
            });
        }

        if status == StatusCode::ACCEPTED {
            tracing::debug!(%url, "diff job still running");
        }

        let text = response.text().await?;
        serde_json::from_str(&text)
            .map(Some)
            .map_err(|e| ApiError::Decode(format!("{path}: {e}")))
    }

    /// Same as [`Self::post`] but a 404 is a failure.
    async fn post_required<B, T>(&self, path: &str, body: &B) -> ApiResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.post(path, body).await?.ok_or_else(|| ApiError::Status {
            status: StatusCode::NOT_FOUND.as_u16(),
            message: format!("{path} not found"),
        })
    }
}

#[async_trait]
impl DiffApi for HttpDiffApi {
    async fn structure(&self, target: &DiffTarget) -> ApiResult<StructurePoll> {
        let resp: StructureResponse = self
            .post_required(STRUCTURE_PATH, &StructureRequest::from(target))
            .await?;
        Ok(resp.into())
    }

    async fn nodes(
        &self,
        target: &DiffTarget,
        offset: usize,
        limit: usize,
    ) -> ApiResult<NodePoll> {
        let body = NodesRequest {
            target: target.into(),
            offset,
            limit,
        };
        let resp: NodePageResponse = self.post_required(NODES_PATH, &body).await?;
        Ok(resp.into())
    }

    async fn node(
        &self,
        target: &DiffTarget,
        node_model: &str,
        node_id: &str,
    ) -> ApiResult<Option<NodeRecord>> {
        let body = NodeRequest {
            target: target.into(),
            node_model,
            node_identity: node_id,
        };
        let resp: Option<NodeResponse> = self.post(NODE_PATH, &body).await?;
        Ok(resp.and_then(|r| r.node.flatten()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn request_bodies_use_server_field_names() {
        let target = DiffTarget::new("Environment", "env-1", 1_000, 2_000);
        let body = NodesRequest {
            target: (&target).into(),
            offset: 500,
            limit: 500,
        };
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            json!({
                "model": "Environment",
                "identity": "env-1",
                "left_time": 1_000,
                "right_time": 2_000,
                "offset": 500,
                "limit": 500,
            })
        );

        let body = NodeRequest {
            target: (&target).into(),
            node_model: "Host",
            node_identity: "h1",
        };
        let value = serde_json::to_value(&body).unwrap();
        assert_eq!(value["node_model"], "Host");
        assert_eq!(value["node_identity"], "h1");
        assert_eq!(value["identity"], "env-1");
    }

    #[test]
    fn trailing_slash_is_trimmed_from_base_url() {
        let api = HttpDiffApi::with_client(reqwest::Client::new(), "http://snitch.local:8000/");
        assert_eq!(api.base_url(), "http://snitch.local:8000");
    }

    #[test]
    fn bad_csrf_token_is_a_config_error() {
        let err = HttpDiffApi::new(HttpDiffApiConfig {
            csrf_token: Some("bad\ntoken".to_string()),
            ..Default::default()
        })
        .unwrap_err();
        assert!(matches!(err, ApiError::InvalidConfig(_)));
    }
}
