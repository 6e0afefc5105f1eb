use std::time::Duration;
use thiserror::Error;

/// Errors surfaced by a player automation backend.
#[derive(Debug, Error)]
pub enum DriverError {
    /// The bounded call into the automation bridge did not return in time.
    #[error("player command timed out after {0:?}")]
    Timeout(Duration),

    /// The bridge ran but the command failed (nonzero exit, spawn failure).
    #[error("player command failed: {0}")]
    Command(String),

    /// The bridge returned output the driver could not interpret.
    #[error("unparseable player output: {0}")]
    Parse(String),
}

impl DriverError {
    /// True when the failure was the adapter timeout rather than a
    /// command or parse failure.
    pub fn is_timeout(&self) -> bool {
        matches!(self, DriverError::Timeout(_))
    }
}

/// Result alias used throughout the driver boundary.
pub type DriverResult<T> = Result<T, DriverError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_classification() {
        assert!(DriverError::Timeout(Duration::from_secs(5)).is_timeout());
        assert!(!DriverError::Command("osascript exited with 1".to_string()).is_timeout());
    }

    #[test]
    fn test_display_includes_cause() {
        let err = DriverError::Parse("expected 5 fields".to_string());
        assert!(err.to_string().contains("expected 5 fields"));
    }
}
