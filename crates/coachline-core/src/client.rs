use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::classify::classify_detail;
use crate::endpoint::{resolve_base_url, BaseUrl, ExecutionContext};
use crate::error::ClientError;
use crate::state::{ChatError, ChatRequest, ChatResponse};

/// Sends one user message to the chat backend and returns its reply.
///
/// The conversation controller depends on this seam rather than on
/// [`ChatClient`] so it can be driven without a network.
#[async_trait]
pub trait ChatApi: Send + Sync {
    async fn send(&self, message: &str) -> Result<ChatResponse, ClientError>;
}

#[derive(Deserialize)]
struct HealthResponse {
    status: String,
}

#[derive(Clone)]
pub struct ChatClient {
    client: Client,
    base_url: BaseUrl,
}

impl ChatClient {
    pub fn new(base_url: BaseUrl) -> Self {
        Self {
            client: Client::new(),
            base_url,
        }
    }

    pub fn from_context(ctx: &ExecutionContext) -> Self {
        Self::new(resolve_base_url(ctx))
    }

    pub fn base_url(&self) -> &BaseUrl {
        &self.base_url
    }

    /// `GET /` on the backend. Succeeds when it answers 2xx with `status: ok`.
    pub async fn health(&self) -> Result<(), ClientError> {
        let url = self.base_url.join("/");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(transport_error)?;

        if !response.status().is_success() {
            return Err(ClientError::backend(format!(
                "Backend health check failed with status: {}",
                response.status().as_u16()
            )));
        }

        let health: HealthResponse = response
            .json()
            .await
            .map_err(|e| ClientError::backend(format!("Invalid health response: {}", e)))?;

        if health.status != "ok" {
            return Err(ClientError::backend(format!(
                "Backend reported status: {}",
                health.status
            )));
        }
        Ok(())
    }

    async fn failure(response: Response) -> ClientError {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();

        let detail = serde_json::from_str::<ChatError>(&body)
            .unwrap_or_else(|_| ChatError::from_status(status))
            .detail;

        let classified = classify_detail(&detail);
        warn!(
            status,
            kind = classified.kind.as_str(),
            "chat request rejected by backend"
        );
        classified.into()
    }
}

#[async_trait]
impl ChatApi for ChatClient {
    async fn send(&self, message: &str) -> Result<ChatResponse, ClientError> {
        let url = self.base_url.chat_url();
        debug!(url = %url, len = message.len(), "sending chat request");

        let request = ChatRequest {
            message: message.to_string(),
        };

        let response = self
            .client
            .post(&url)
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(transport_error)?;

        if !response.status().is_success() {
            return Err(Self::failure(response).await);
        }

        let chat_response: ChatResponse = response
            .json()
            .await
            .map_err(|e| ClientError::backend(format!("Invalid response from backend: {}", e)))?;

        info!(reply_len = chat_response.reply.len(), "chat request succeeded");
        Ok(chat_response)
    }
}

/// Shown when the request could not even be built, e.g. a malformed base URL.
pub const INVALID_REQUEST_MESSAGE: &str =
    "The chat request could not be created. Please check the configured backend address.";

/// Errors raised before any response arrived. Every network-level failure
/// becomes the fixed connectivity error; raw transport text is only logged.
fn transport_error(e: reqwest::Error) -> ClientError {
    if e.is_connect() || e.is_timeout() || e.is_request() {
        warn!(error = %e, "backend unreachable");
        ClientError::connectivity()
    } else {
        warn!(error = %e, "chat request could not be sent");
        ClientError::backend(INVALID_REQUEST_MESSAGE)
    }
}
