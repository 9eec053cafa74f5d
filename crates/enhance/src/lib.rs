//! Nexora image-enhancement client library.
//!
//! Validates and downsizes input images, submits them to the upscaler's
//! task queue, polls the task to completion, and relays the result to
//! the Nexora backend. The `nexora-enhance` binary in `main.rs` drives
//! the same pipeline from the command line.

pub mod api;
pub mod config;
pub mod download;
pub mod error;
pub mod imaging;
pub mod messages;
pub mod pipeline;
pub mod poller;
pub mod relay;
pub mod state_codes;
