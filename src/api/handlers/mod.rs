//! API request handlers.

/// Health check handler.
pub mod health;
/// Research task submission, polling and cancellation.
pub mod research;
