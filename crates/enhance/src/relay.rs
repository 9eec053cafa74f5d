//! Hands the finished image to the Nexora backend.
//!
//! The backend stores the creation, re-hosts the image, and updates the
//! user's free-usage count. Each call obtains a fresh bearer token from a
//! [`TokenProvider`]; tokens are never cached here.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::api::read_capped_body;
use crate::config::EnhanceConfig;
use crate::error::EnhanceError;

/// Default message when the backend reports failure without one.
const DEFAULT_FAILURE_MESSAGE: &str = "Failed to save enhanced image";

/// Source of session tokens for the backend.
#[async_trait]
pub trait TokenProvider: Send + Sync {
    /// Return a currently valid token. Called once per relay request.
    async fn bearer_token(&self) -> Result<String, EnhanceError>;
}

/// A fixed token, e.g. read from the environment by the CLI.
pub struct StaticToken(pub String);

#[async_trait]
impl TokenProvider for StaticToken {
    async fn bearer_token(&self) -> Result<String, EnhanceError> {
        Ok(self.0.clone())
    }
}

/// Envelope returned by the backend's enhance-image endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelayResponse {
    pub success: bool,
    /// URL of the stored image.
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Destination for finished enhancement results.
#[async_trait]
pub trait ResultRelay: Send + Sync {
    async fn save_enhanced_image(
        &self,
        image_url: &str,
        publish: bool,
    ) -> Result<RelayResponse, EnhanceError>;
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SaveEnhancedImageRequest<'a> {
    enhanced_image_url: &'a str,
    publish: bool,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

/// HTTP client for `POST /api/ai/enhance-image` on the Nexora backend.
#[derive(Clone)]
pub struct BackendRelay {
    client: reqwest::Client,
    backend_url: String,
    tokens: Arc<dyn TokenProvider>,
}

impl BackendRelay {
    pub fn new(config: &EnhanceConfig, tokens: Arc<dyn TokenProvider>) -> Self {
        Self::with_client(reqwest::Client::new(), config, tokens)
    }

    pub fn with_client(
        client: reqwest::Client,
        config: &EnhanceConfig,
        tokens: Arc<dyn TokenProvider>,
    ) -> Self {
        Self {
            client,
            backend_url: config.backend_url.clone(),
            tokens,
        }
    }
}

#[async_trait]
impl ResultRelay for BackendRelay {
    async fn save_enhanced_image(
        &self,
        image_url: &str,
        publish: bool,
    ) -> Result<RelayResponse, EnhanceError> {
        let token = self.tokens.bearer_token().await?;

        let response = self
            .client
            .post(format!("{}/api/ai/enhance-image", self.backend_url))
            .bearer_auth(token)
            .json(&SaveEnhancedImageRequest {
                enhanced_image_url: image_url,
                publish,
            })
            .send()
            .await?;

        let status = response.status();
        let body = String::from_utf8_lossy(&read_capped_body(response).await?).into_owned();

        if !status.is_success() {
            // Prefer the backend's own message when it sent one.
            if let Some(message) = serde_json::from_str::<ErrorBody>(&body)
                .ok()
                .and_then(|b| b.message)
            {
                return Err(EnhanceError::Backend(message));
            }
            return Err(EnhanceError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let envelope: RelayResponse = serde_json::from_str(&body)
            .map_err(|e| EnhanceError::MalformedResponse(format!("Invalid backend response: {e}")))?;

        if !envelope.success {
            return Err(EnhanceError::Backend(
                envelope
                    .message
                    .unwrap_or_else(|| DEFAULT_FAILURE_MESSAGE.to_string()),
            ));
        }

        tracing::info!(publish, stored_url = ?envelope.content, "Enhanced image saved");
        Ok(envelope)
    }
}
