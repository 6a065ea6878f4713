//! Unified error type for the holeglow-lib crate.
//!
//! [`HoleglowError`] wraps the per-module errors (`BoardError`,
//! `StatusError`, `MetricsError`) plus configuration failures.
//! `From` impls let `?` cross module boundaries.

use std::fmt;

use crate::board::BoardError;
use crate::metrics::MetricsError;
use crate::status::StatusError;

#[derive(Debug)]
pub enum HoleglowError {
    /// LED board communication error.
    Board(BoardError),
    /// Ad-blocker status API error.
    Status(StatusError),
    /// Host metrics collection error.
    Metrics(MetricsError),
    /// Configuration parse or validation error.
    Config(String),
}

impl fmt::Display for HoleglowError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HoleglowError::Board(e) => write!(f, "{e}"),
            HoleglowError::Status(e) => write!(f, "{e}"),
            HoleglowError::Metrics(e) => write!(f, "{e}"),
            HoleglowError::Config(e) => write!(f, "Config error: {e}"),
        }
    }
}

impl std::error::Error for HoleglowError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            HoleglowError::Board(e) => Some(e),
            HoleglowError::Status(e) => Some(e),
            HoleglowError::Metrics(e) => Some(e),
            HoleglowError::Config(_) => None,
        }
    }
}

impl From<BoardError> for HoleglowError {
    fn from(e: BoardError) -> Self {
        HoleglowError::Board(e)
    }
}

impl From<StatusError> for HoleglowError {
    fn from(e: StatusError) -> Self {
        HoleglowError::Status(e)
    }
}

impl From<MetricsError> for HoleglowError {
    fn from(e: MetricsError) -> Self {
        HoleglowError::Metrics(e)
    }
}

/// Crate-level Result alias using [`HoleglowError`].
pub type Result<T> = std::result::Result<T, HoleglowError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_board_error() {
        let e: HoleglowError = BoardError::NotFound.into();
        assert!(matches!(e, HoleglowError::Board(BoardError::NotFound)));
    }

    #[test]
    fn from_status_error() {
        let e: HoleglowError = StatusError::Http(500).into();
        assert!(matches!(e, HoleglowError::Status(StatusError::Http(500))));
    }

    #[test]
    fn display_board_error_is_transparent() {
        let e = HoleglowError::Board(BoardError::NotFound);
        assert_eq!(e.to_string(), "PiGlow board not found");
    }

    #[test]
    fn display_config_error() {
        let e = HoleglowError::Config("update_interval must be positive".into());
        assert_eq!(e.to_string(), "Config error: update_interval must be positive");
    }

    #[test]
    fn source_chains_metrics_error() {
        let e = HoleglowError::Metrics(MetricsError::Unavailable("no cpu data".into()));
        let source = std::error::Error::source(&e).unwrap();
        assert!(source.to_string().contains("no cpu data"));
    }

    #[test]
    fn source_none_for_config() {
        let e = HoleglowError::Config("x".into());
        assert!(std::error::Error::source(&e).is_none());
    }

    #[test]
    fn question_mark_propagation_board_to_holeglow() {
        fn inner() -> crate::board::Result<()> {
            Err(BoardError::InvalidArm(4))
        }
        fn outer() -> Result<()> {
            inner()?;
            Ok(())
        }
        let err = outer().unwrap_err();
        assert!(matches!(err, HoleglowError::Board(BoardError::InvalidArm(4))));
    }

    #[test]
    fn question_mark_propagation_status_to_holeglow() {
        fn inner() -> crate::status::Result<()> {
            Err(StatusError::Timeout)
        }
        fn outer() -> Result<()> {
            inner()?;
            Ok(())
        }
        let err = outer().unwrap_err();
        assert_eq!(err.to_string(), "Status API request timed out");
    }
}
