//! HTTP gateways to the upstream data providers.
//!
//! Each gateway owns its own `reqwest::Client` and maps transport,
//! status and decode failures onto the [`crate::error::PipelineError`]
//! taxonomy. No gateway retries internally.

pub mod radar;
pub mod sensors;
pub mod weatherapi;

/// Trim an upstream error body for inclusion in error messages.
pub(crate) fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    if body.len() > MAX { format!("{}...", &body[..MAX]) } else { body.to_string() }
}
