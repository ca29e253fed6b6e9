//! Provider error types.
//!
//! Defined in `uniquery-core` so that the generation seam and its callers
//! share one error type.

pub use uniquery_core::error::ProviderError;
