//! Beta-distribution API error types.

/// Failure kinds from the beta-distribution API client.
///
/// This is a closed enum matched explicitly by callers: the configuration
/// variants stop processing of one request, `InvalidAttribute` is reported and
/// then re-raised, and the transport variants propagate to the outer handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BetaError {
    /// No API key identifier is configured for the app.
    ApiKeyNotSet {
        /// Name of the app missing the key
        app_name: String,
    },
    /// No beta group is configured for the app.
    BetaGroupNotSet {
        /// Name of the app missing the group
        app_name: String,
    },
    /// The remote service rejected a tester attribute.
    InvalidAttribute {
        /// Rejection details reported by the service
        details: Vec<String>,
    },
    /// Any other non-2xx response from the service.
    Api {
        /// HTTP status code
        status: u16,
        /// Response body text
        message: String,
    },
    /// Transport-level failure before a response was received.
    Http(String),
}

impl std::fmt::Display for BetaError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ApiKeyNotSet { app_name } => {
                write!(f, "No API key is set for app '{app_name}'")
            }
            Self::BetaGroupNotSet { app_name } => {
                write!(f, "No beta group is set for app '{app_name}'")
            }
            Self::InvalidAttribute { details } => {
                write!(f, "Invalid tester attribute: {}", details.join("; "))
            }
            Self::Api { status, message } => {
                write!(f, "Beta API error (status {status}): {message}")
            }
            Self::Http(msg) => write!(f, "Beta API transport error: {msg}"),
        }
    }
}

impl std::error::Error for BetaError {}
