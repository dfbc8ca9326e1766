//! Error types for the Gangway library.
//!
//! This crate provides the foundation error types used throughout the Gangway
//! ecosystem: per-domain error structs with source-location capture, the
//! closed [`BetaError`] enum returned by the beta-distribution client, and the
//! crate-level [`GangwayError`] wrapper.

mod beta;
mod chat;
mod config;
mod http;
mod json;
mod store;

pub use beta::BetaError;
pub use chat::ChatError;
pub use config::ConfigError;
pub use http::HttpError;
pub use json::JsonError;
pub use store::StoreError;

/// Crate-level error variants.
#[derive(Debug, derive_more::From)]
pub enum GangwayErrorKind {
    /// Record store error (non-2xx response with parsed body)
    Store(StoreError),
    /// Beta-distribution API error
    Beta(BetaError),
    /// Chat platform error
    Chat(ChatError),
    /// Configuration error
    Config(ConfigError),
    /// HTTP transport error
    Http(HttpError),
    /// JSON serialization/deserialization error
    Json(JsonError),
}

impl std::fmt::Display for GangwayErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GangwayErrorKind::Store(e) => write!(f, "{}", e),
            GangwayErrorKind::Beta(e) => write!(f, "{}", e),
            GangwayErrorKind::Chat(e) => write!(f, "{}", e),
            GangwayErrorKind::Config(e) => write!(f, "{}", e),
            GangwayErrorKind::Http(e) => write!(f, "{}", e),
            GangwayErrorKind::Json(e) => write!(f, "{}", e),
        }
    }
}

/// Gangway error with kind discrimination.
#[derive(Debug)]
pub struct GangwayError(Box<GangwayErrorKind>);

impl GangwayError {
    /// Create a new error from a kind.
    pub fn new(kind: GangwayErrorKind) -> Self {
        Self(Box::new(kind))
    }

    /// Get the error kind.
    pub fn kind(&self) -> &GangwayErrorKind {
        &self.0
    }
}

impl std::fmt::Display for GangwayError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Gangway Error: {}", self.0)
    }
}

impl std::error::Error for GangwayError {}

// Generic From implementation for any type that converts to GangwayErrorKind
impl<T> From<T> for GangwayError
where
    T: Into<GangwayErrorKind>,
{
    fn from(err: T) -> Self {
        Self::new(err.into())
    }
}

/// Result type for Gangway operations.
pub type GangwayResult<T> = std::result::Result<T, GangwayError>;
