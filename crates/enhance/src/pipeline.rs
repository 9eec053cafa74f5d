//! End-to-end image enhancement.
//!
//! [`Enhancer`] runs the stages in order: validate, probe, resize if
//! needed, submit, poll, relay. Every stage surfaces its failure
//! immediately; the backend is only called after the remote task has
//! succeeded, so nothing is persisted for a failed request.

use std::sync::Arc;

use nexora_core::image::{validate_image_file, ImageAsset, MAX_DIMENSION};

use crate::api::{TaskQueue, UpscaleApi};
use crate::config::EnhanceConfig;
use crate::error::EnhanceError;
use crate::imaging::{probe_dimensions, shrink_to_fit, DimensionProbe};
use crate::poller::{poll_task, PollOptions};
use crate::relay::{BackendRelay, RelayResponse, ResultRelay, TokenProvider};
use crate::state_codes::StateCodeTable;

/// Message when the backend acknowledged the save but returned no URL.
const MISSING_CONTENT: &str = "No enhanced image received";

/// Runs one enhancement request at a time against a task queue and a
/// result relay.
///
/// The enhancer holds no per-request state and places no lock; callers
/// that must prevent overlapping requests do so themselves.
pub struct Enhancer {
    queue: Arc<dyn TaskQueue>,
    relay: Arc<dyn ResultRelay>,
    table: StateCodeTable,
    poll: PollOptions,
    max_dimension: u32,
}

impl Enhancer {
    /// Enhancer with default timings and the v1 state-code table.
    pub fn new(queue: Arc<dyn TaskQueue>, relay: Arc<dyn ResultRelay>) -> Self {
        Self {
            queue,
            relay,
            table: StateCodeTable::default(),
            poll: PollOptions::default(),
            max_dimension: MAX_DIMENSION,
        }
    }

    /// Enhancer talking to the real upscaler and backend described by
    /// `config`. Both clients share one connection pool.
    pub fn from_config(config: &EnhanceConfig, tokens: Arc<dyn TokenProvider>) -> Self {
        let client = reqwest::Client::new();
        let queue = Arc::new(UpscaleApi::with_client(client.clone(), config));
        let relay = Arc::new(BackendRelay::with_client(client, config, tokens));

        Self::new(queue, relay)
            .with_poll_options(PollOptions::from(config))
            .with_max_dimension(config.max_dimension)
    }

    pub fn with_poll_options(mut self, poll: PollOptions) -> Self {
        self.poll = poll;
        self
    }

    pub fn with_state_codes(mut self, table: StateCodeTable) -> Self {
        self.table = table;
        self
    }

    pub fn with_max_dimension(mut self, max_dimension: u32) -> Self {
        self.max_dimension = max_dimension;
        self
    }

    /// Enhance `asset` and store the result with the given `publish` flag.
    ///
    /// `on_progress` is called with the remote completion percentage each
    /// time a status read finds the task still running.
    pub async fn enhance<F>(
        &self,
        asset: ImageAsset,
        publish: bool,
        on_progress: F,
    ) -> Result<RelayResponse, EnhanceError>
    where
        F: FnMut(u8) + Send,
    {
        validate_image_file(&asset.mime_type, asset.byte_size())?;

        let prepared = self.prepare(asset).await?;
        let task_id = self.queue.create_task(&prepared).await?;
        drop(prepared);

        let image_url = poll_task(
            self.queue.as_ref(),
            &task_id,
            &self.table,
            &self.poll,
            on_progress,
        )
        .await?;

        let saved = self.relay.save_enhanced_image(&image_url, publish).await?;
        if saved.content.is_none() {
            return Err(EnhanceError::Backend(MISSING_CONTENT.to_string()));
        }
        Ok(saved)
    }

    /// Make `asset` fit within the maximum dimension, resizing when
    /// necessary. Fails if the image cannot be decoded.
    pub async fn prepare(&self, asset: ImageAsset) -> Result<ImageAsset, EnhanceError> {
        match probe_dimensions(&asset) {
            DimensionProbe::Failed(message) => Err(EnhanceError::Dimension(message)),
            DimensionProbe::Decoded(dims) if dims.fits_within(self.max_dimension) => Ok(asset),
            DimensionProbe::Decoded(dims) => {
                tracing::info!(
                    width = dims.width,
                    height = dims.height,
                    max_dimension = self.max_dimension,
                    "Image exceeds maximum dimension, resizing",
                );
                shrink_to_fit(asset, dims, self.max_dimension).await
            }
        }
    }
}
