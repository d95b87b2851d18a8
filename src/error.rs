//! # Error Types
//!
//! This module defines error types used throughout the maqueta library.
//!
//! Recoverable conditions (a layer image that fails all retries, malformed
//! stored state, a degenerate print-area dimension) are handled locally by
//! the subsystems that detect them and never reach callers as an `Err`; the
//! variants here cover the failures that do propagate.

use thiserror::Error;

/// Main error type for maqueta operations
#[derive(Debug, Error)]
pub enum MaquetaError {
    /// Asset fetch failure (network, HTTP status)
    #[error("Asset error: {0}")]
    Asset(String),

    /// Image decode or processing error
    #[error("Image error: {0}")]
    Image(String),

    /// Invalid geometry input
    #[error("Geometry error: {0}")]
    Geometry(String),

    /// Canvas state encode/decode error
    #[error("State error: {0}")]
    State(String),

    /// A compositor operation was issued out of order (e.g. color
    /// application before the layer stack is ready)
    #[error("Session error: {0}")]
    Session(String),

    /// Pricing classification or aggregation error
    #[error("Pricing error: {0}")]
    Pricing(String),

    /// I/O error wrapper
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
