//! REST client for the upscaler's task endpoints.
//!
//! Wraps task creation (multipart upload) and task-status reads using
//! [`reqwest`], behind the [`TaskQueue`] trait so the poller and the
//! pipeline can run against in-memory fakes.

use std::time::Duration;

use async_trait::async_trait;
use nexora_core::image::ImageAsset;
use reqwest::multipart::{Form, Part};

use crate::config::EnhanceConfig;
use crate::error::EnhanceError;
use crate::messages::{CreateTaskResponse, TaskStatus, TaskStatusResponse};

/// Size cap applied to uploads and to response bodies (16 MiB).
pub const MAX_TRANSFER_BYTES: u64 = 16 * 1024 * 1024;

/// Header carrying the upscaler credential.
const API_KEY_HEADER: &str = "X-API-KEY";

/// A remote queue that accepts images and reports task progress.
#[async_trait]
pub trait TaskQueue: Send + Sync {
    /// Upload `asset` and return the opaque task id.
    async fn create_task(&self, asset: &ImageAsset) -> Result<String, EnhanceError>;

    /// Read the current status of `task_id`.
    async fn fetch_status(&self, task_id: &str) -> Result<TaskStatus, EnhanceError>;
}

/// HTTP client for the upscaler's visual-scale task API.
#[derive(Clone)]
pub struct UpscaleApi {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    upload_timeout: Duration,
    status_timeout: Duration,
}

impl UpscaleApi {
    /// Create a client from the enhancement configuration.
    pub fn new(config: &EnhanceConfig) -> Self {
        Self::with_client(reqwest::Client::new(), config)
    }

    /// Create a client reusing an existing [`reqwest::Client`]
    /// (shares the connection pool with the backend relay).
    pub fn with_client(client: reqwest::Client, config: &EnhanceConfig) -> Self {
        Self {
            client,
            base_url: config.base_url.clone(),
            api_key: config.api_key.clone(),
            upload_timeout: config.upload_timeout,
            status_timeout: config.status_timeout,
        }
    }

    fn tasks_url(&self) -> String {
        format!("{}/api/tasks/visual/scale", self.base_url)
    }
}

#[async_trait]
impl TaskQueue for UpscaleApi {
    /// Sends `POST /api/tasks/visual/scale` with the image as
    /// `image_file` and asynchronous, URL-returning, 1x-scale options.
    async fn create_task(&self, asset: &ImageAsset) -> Result<String, EnhanceError> {
        if asset.byte_size() > MAX_TRANSFER_BYTES {
            return Err(EnhanceError::RequestTooLarge {
                size: asset.byte_size(),
                limit: MAX_TRANSFER_BYTES,
            });
        }

        let part = Part::bytes(asset.data.clone())
            .file_name(asset.file_name.clone())
            .mime_str(&asset.mime_type)
            .map_err(|e| EnhanceError::Validation(format!("Invalid MIME type: {e}")))?;

        let form = Form::new()
            .part("image_file", part)
            .text("sync", "0")
            .text("return_type", "1")
            .text("scale_factor", "1");

        let response = self
            .client
            .post(self.tasks_url())
            .header(API_KEY_HEADER, &self.api_key)
            .timeout(self.upload_timeout)
            .multipart(form)
            .send()
            .await?;

        let body = read_success_body(response).await?;
        let envelope: CreateTaskResponse = serde_json::from_slice(&body)
            .map_err(|e| EnhanceError::MalformedResponse(format!("Failed to create task: {e}")))?;

        let task_id = envelope.task_id().ok_or_else(|| {
            EnhanceError::MalformedResponse(format!(
                "Failed to create task: {}",
                String::from_utf8_lossy(&body)
            ))
        })?;

        tracing::info!(task_id = %task_id, bytes = asset.byte_size(), "Enhancement task created");
        Ok(task_id)
    }

    /// Sends `GET /api/tasks/visual/scale/{task_id}`.
    async fn fetch_status(&self, task_id: &str) -> Result<TaskStatus, EnhanceError> {
        let response = self
            .client
            .get(format!("{}/{}", self.tasks_url(), task_id))
            .header(API_KEY_HEADER, &self.api_key)
            .timeout(self.status_timeout)
            .send()
            .await?;

        let body = read_success_body(response).await?;
        let envelope: TaskStatusResponse = serde_json::from_slice(&body)
            .map_err(|e| EnhanceError::MalformedResponse(format!("Invalid status response: {e}")))?;

        envelope
            .data
            .ok_or_else(|| EnhanceError::MalformedResponse("No data in response".to_string()))
    }
}

// ---- private helpers ----

/// Ensure the response has a success status code and return its body,
/// bounded by [`MAX_TRANSFER_BYTES`]. A non-2xx status becomes an
/// [`EnhanceError::Api`] carrying the status and body text.
pub(crate) async fn read_success_body(
    response: reqwest::Response,
) -> Result<Vec<u8>, EnhanceError> {
    let status = response.status();
    if !status.is_success() {
        let body = read_capped_body(response)
            .await
            .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
            .unwrap_or_else(|_| "<unreadable body>".to_string());
        return Err(EnhanceError::Api {
            status: status.as_u16(),
            body,
        });
    }

    read_capped_body(response).await
}

/// Read a response body chunk by chunk, failing with
/// [`EnhanceError::RequestTooLarge`] once it passes [`MAX_TRANSFER_BYTES`].
pub(crate) async fn read_capped_body(
    mut response: reqwest::Response,
) -> Result<Vec<u8>, EnhanceError> {
    if let Some(len) = response.content_length() {
        if len > MAX_TRANSFER_BYTES {
            return Err(EnhanceError::RequestTooLarge {
                size: len,
                limit: MAX_TRANSFER_BYTES,
            });
        }
    }

    let mut body = Vec::new();
    while let Some(chunk) = response.chunk().await? {
        let size = (body.len() + chunk.len()) as u64;
        if size > MAX_TRANSFER_BYTES {
            return Err(EnhanceError::RequestTooLarge {
                size,
                limit: MAX_TRANSFER_BYTES,
            });
        }
        body.extend_from_slice(&chunk);
    }
    Ok(body)
}
