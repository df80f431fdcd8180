//! HTTP client for the serving-endpoints status API.

mod client;
mod types;

pub use client::{normalize_base_url, workspace_root, ServingClient};
pub use types::ProbeError;
