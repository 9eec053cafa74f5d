//! Upscaler task state codes and their user-facing messages.
//!
//! The mapping is an implicit contract with the upscaling provider. It is
//! kept as data, versioned, so new codes can be added with
//! [`StateCodeTable::with_entry`] without touching the polling loop.

use std::collections::BTreeMap;

/// State code the provider uses for "queue congested, keep waiting".
pub const STATE_QUEUED: i32 = 0;

/// Version 1 of the provider's state table.
const V1_ENTRIES: &[(i32, &str)] = &[
    (-8, "Processing timeout. Try a smaller image."),
    (-7, "Image exceeds resolution limit or unsupported format."),
    (-5, "Image exceeds size limit (15MB maximum)."),
    (-3, "Failed to download image from URL."),
    (-2, "Processing completed but result upload failed."),
    (-1, "Task failed due to unknown error."),
    (STATE_QUEUED, "Too many requests. Your task is in queue."),
];

/// Lookup table from provider state code to message.
#[derive(Debug, Clone)]
pub struct StateCodeTable {
    version: u32,
    messages: BTreeMap<i32, String>,
}

impl StateCodeTable {
    /// The table as documented by the provider at integration time.
    pub fn v1() -> Self {
        Self {
            version: 1,
            messages: V1_ENTRIES
                .iter()
                .map(|(code, msg)| (*code, (*msg).to_string()))
                .collect(),
        }
    }

    /// Add or replace one entry, bumping the version.
    pub fn with_entry(mut self, code: i32, message: impl Into<String>) -> Self {
        self.messages.insert(code, message.into());
        self.version += 1;
        self
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    /// Message for `code`, or a generic one naming the code.
    pub fn message_for(&self, code: i32) -> String {
        self.messages
            .get(&code)
            .cloned()
            .unwrap_or_else(|| format!("Unknown error (state: {code})"))
    }

    /// Whether `code` ends the task as a failure.
    ///
    /// Only negative codes are fatal. [`STATE_QUEUED`] shares the table
    /// but means the task is waiting behind others.
    pub fn is_failure(&self, code: i32) -> bool {
        code < 0
    }
}

impl Default for StateCodeTable {
    fn default() -> Self {
        Self::v1()
    }
}
