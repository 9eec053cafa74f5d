//! Pure domain rules for Nexora image enhancement.
//!
//! Nothing in this crate performs I/O. The async client in
//! `nexora-enhance` calls into these functions before touching the
//! network.

pub mod error;
pub mod image;
