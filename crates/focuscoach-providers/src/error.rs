//! Provider error types.
//!
//! The error enum lives in `focuscoach-core` so the content pipeline can
//! classify failures without depending on any HTTP client.

pub use focuscoach_core::error::ProviderError;
