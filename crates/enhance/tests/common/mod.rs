//! Shared fakes and fixtures for the enhancement integration tests.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::io::Cursor;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use nexora_core::image::ImageAsset;
use nexora_enhance::api::TaskQueue;
use nexora_enhance::error::EnhanceError;
use nexora_enhance::messages::TaskStatus;
use nexora_enhance::relay::{RelayResponse, ResultRelay};

// ---------------------------------------------------------------------------
// Status builders
// ---------------------------------------------------------------------------

pub fn running(progress: i32) -> TaskStatus {
    TaskStatus {
        progress,
        state: 1,
        image: None,
    }
}

pub fn queued() -> TaskStatus {
    TaskStatus {
        progress: 0,
        state: 0,
        image: None,
    }
}

pub fn failed(state: i32) -> TaskStatus {
    TaskStatus {
        progress: 0,
        state,
        image: None,
    }
}

pub fn done(image_url: &str) -> TaskStatus {
    TaskStatus {
        progress: 100,
        state: 1,
        image: Some(image_url.to_string()),
    }
}

// ---------------------------------------------------------------------------
// ScriptedQueue
// ---------------------------------------------------------------------------

/// A [`TaskQueue`] that replays a fixed list of status reads.
///
/// Once the script is exhausted, the last successful snapshot is repeated.
pub struct ScriptedQueue {
    task_id: String,
    script: Mutex<VecDeque<Result<TaskStatus, EnhanceError>>>,
    last: Mutex<Option<TaskStatus>>,
    uploads: Mutex<Vec<ImageAsset>>,
    status_calls: AtomicUsize,
}

impl ScriptedQueue {
    pub fn new(script: Vec<Result<TaskStatus, EnhanceError>>) -> Self {
        Self {
            task_id: "task-1".to_string(),
            script: Mutex::new(script.into()),
            last: Mutex::new(None),
            uploads: Mutex::new(Vec::new()),
            status_calls: AtomicUsize::new(0),
        }
    }

    pub fn of(statuses: Vec<TaskStatus>) -> Self {
        Self::new(statuses.into_iter().map(Ok).collect())
    }

    pub fn status_calls(&self) -> usize {
        self.status_calls.load(Ordering::SeqCst)
    }

    pub fn uploads(&self) -> Vec<ImageAsset> {
        self.uploads.lock().unwrap().clone()
    }

    pub fn remaining(&self) -> usize {
        self.script.lock().unwrap().len()
    }
}

#[async_trait]
impl TaskQueue for ScriptedQueue {
    async fn create_task(&self, asset: &ImageAsset) -> Result<String, EnhanceError> {
        self.uploads.lock().unwrap().push(asset.clone());
        Ok(self.task_id.clone())
    }

    async fn fetch_status(&self, task_id: &str) -> Result<TaskStatus, EnhanceError> {
        assert_eq!(task_id, self.task_id, "polled an unknown task");
        self.status_calls.fetch_add(1, Ordering::SeqCst);

        let next = self.script.lock().unwrap().pop_front();
        match next {
            Some(Ok(status)) => {
                *self.last.lock().unwrap() = Some(status.clone());
                Ok(status)
            }
            Some(Err(e)) => Err(e),
            None => Ok(self
                .last
                .lock()
                .unwrap()
                .clone()
                .expect("script exhausted before any status")),
        }
    }
}

// ---------------------------------------------------------------------------
// RecordingRelay
// ---------------------------------------------------------------------------

/// A [`ResultRelay`] that records calls and answers with a fixed response.
pub struct RecordingRelay {
    response: Result<RelayResponse, String>,
    calls: Mutex<Vec<(String, bool)>>,
}

impl RecordingRelay {
    /// Relay that stores successfully under `stored_url`.
    pub fn storing(stored_url: &str) -> Self {
        Self::answering(RelayResponse {
            success: true,
            content: Some(stored_url.to_string()),
            message: Some("Image enhanced successfully".to_string()),
        })
    }

    pub fn answering(response: RelayResponse) -> Self {
        Self {
            response: Ok(response),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Relay whose backend refuses with `message`.
    pub fn refusing(message: &str) -> Self {
        Self {
            response: Err(message.to_string()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<(String, bool)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ResultRelay for RecordingRelay {
    async fn save_enhanced_image(
        &self,
        image_url: &str,
        publish: bool,
    ) -> Result<RelayResponse, EnhanceError> {
        self.calls
            .lock()
            .unwrap()
            .push((image_url.to_string(), publish));
        self.response.clone().map_err(EnhanceError::Backend)
    }
}

// ---------------------------------------------------------------------------
// Image fixtures
// ---------------------------------------------------------------------------

/// Smooth gradient; compresses well, so large sizes stay small on disk.
pub fn gradient_image(width: u32, height: u32, format: ImageFormat) -> Vec<u8> {
    let img = RgbImage::from_fn(width, height, |x, y| {
        Rgb([(x % 256) as u8, (y % 256) as u8, ((x / 16 + y / 16) % 256) as u8])
    });
    encode(DynamicImage::ImageRgb8(img), format)
}

/// Pseudo-random pixels; barely compressible, so small sizes clear the
/// 1 KiB minimum.
pub fn noise_image(width: u32, height: u32, format: ImageFormat) -> Vec<u8> {
    let mut seed: u32 = 0x9E37_79B9;
    let img = RgbImage::from_fn(width, height, |_, _| {
        seed ^= seed << 13;
        seed ^= seed >> 17;
        seed ^= seed << 5;
        let [a, b, c, _] = seed.to_le_bytes();
        Rgb([a, b, c])
    });
    encode(DynamicImage::ImageRgb8(img), format)
}

pub fn dimensions_of(data: &[u8]) -> (u32, u32) {
    let img = image::load_from_memory(data).expect("fixture should decode");
    (img.width(), img.height())
}

fn encode(img: DynamicImage, format: ImageFormat) -> Vec<u8> {
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, format).expect("fixture should encode");
    out.into_inner()
}
