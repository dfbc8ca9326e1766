//! Record store error types.

/// Error from a record store request that returned a non-2xx status.
///
/// Carries the failing request URL and the parsed error body. The store
/// returns `{"error": {"type": ..., "message": ...}}` on failure, with a bare
/// string body tolerated for older endpoints.
#[derive(Debug, Clone)]
pub struct StoreError {
    /// The failing request URL
    pub url: String,
    /// Error type reported by the store (e.g. `NOT_FOUND`)
    pub error_type: Option<String>,
    /// Error message reported by the store
    pub error_message: String,
    /// Line number where the error occurred
    pub line: u32,
    /// File where the error occurred
    pub file: &'static str,
}

impl StoreError {
    /// Create a new StoreError from a parsed error body at the current location.
    #[track_caller]
    pub fn new(url: impl Into<String>, body: &serde_json::Value) -> Self {
        let location = std::panic::Location::caller();
        let (error_type, error_message) = match body.get("error") {
            Some(serde_json::Value::Object(error)) => (
                error
                    .get("type")
                    .and_then(|v| v.as_str())
                    .map(|s| s.to_string()),
                error
                    .get("message")
                    .and_then(|v| v.as_str())
                    .unwrap_or_default()
                    .to_string(),
            ),
            Some(serde_json::Value::String(s)) => (Some(s.clone()), String::new()),
            _ => (None, body.to_string()),
        };
        Self {
            url: url.into(),
            error_type,
            error_message,
            line: location.line(),
            file: location.file(),
        }
    }

    /// Create a StoreError with a plain message (no parsed body).
    #[track_caller]
    pub fn message(url: impl Into<String>, message: impl Into<String>) -> Self {
        let location = std::panic::Location::caller();
        Self {
            url: url.into(),
            error_type: None,
            error_message: message.into(),
            line: location.line(),
            file: location.file(),
        }
    }

    /// True when the store reported the record as missing.
    pub fn is_not_found(&self) -> bool {
        self.error_type.as_deref() == Some("NOT_FOUND")
    }
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Store Error of type '{}' with message '{}'. Request URL: {} at line {} in {}",
            self.error_type.as_deref().unwrap_or("unknown"),
            self.error_message,
            self.url,
            self.line,
            self.file
        )
    }
}

impl std::error::Error for StoreError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_structured_error_body() {
        let body = serde_json::json!({
            "error": {"type": "NOT_FOUND", "message": "Record not found"}
        });
        let err = StoreError::new("https://records.example/v0/base/Testers/rec1", &body);
        assert!(err.is_not_found());
        assert_eq!(err.error_message, "Record not found");
        assert!(err.to_string().contains("NOT_FOUND"));
    }

    #[test]
    fn parses_string_error_body() {
        let body = serde_json::json!({"error": "INVALID_REQUEST_UNKNOWN"});
        let err = StoreError::new("https://records.example/v0/base/Testers", &body);
        assert_eq!(err.error_type.as_deref(), Some("INVALID_REQUEST_UNKNOWN"));
        assert!(!err.is_not_found());
    }
}
