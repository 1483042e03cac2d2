//! Upstream fetch adapter for Cucumber Studio.
//!
//! Fetches projects, folders and scenarios over the JSON-API and normalises
//! them into [`cukemirror_protocol`] entities.

mod client;
mod error;
pub mod wire;

pub use client::{StudioClient, StudioSource, DEFAULT_BASE_URL, DEFAULT_TIMEOUT};
pub use error::{Result, UpstreamError};
