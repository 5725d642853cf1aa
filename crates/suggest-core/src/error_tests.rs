//! Tests for `error` module

use std::error::Error as _;
use std::time::Duration;

use super::error::*;

#[test]
fn test_error_codes_are_unique() {
    // Arrange
    let errors: Vec<Error> = vec![
        Error::Validation("test".into()),
        Error::backend("test"),
        Error::Timeout(Duration::from_secs(1)),
        Error::Cancelled,
        Error::Conversion("test".into()),
        Error::Config("test".into()),
        Error::Serialization("test".into()),
        Error::Internal("test".into()),
    ];

    // Act
    let codes: Vec<&str> = errors.iter().map(Error::code).collect();

    // Assert
    let mut unique_codes = codes.clone();
    unique_codes.sort_unstable();
    unique_codes.dedup();
    assert_eq!(codes.len(), unique_codes.len(), "Error codes must be unique");
    for code in &codes {
        assert!(code.starts_with("SUGGEST-"), "Code {code} should start with SUGGEST-");
    }
}

#[test]
fn test_error_display_includes_code() {
    // Arrange
    let err = Error::Validation("size must be positive".into());

    // Act
    let display = format!("{err}");

    // Assert
    assert!(display.contains("[SUGGEST-001]"));
    assert!(display.contains("size must be positive"));
}

#[test]
fn test_backend_error_keeps_cause() {
    // Arrange
    let cause = std::io::Error::other("connection reset");

    // Act
    let err = Error::backend_with("bulk request failed", cause);

    // Assert
    let source = err.source().expect("cause should be kept");
    assert_eq!(source.to_string(), "connection reset");
    assert_eq!(err.code(), "SUGGEST-002");
}

#[test]
fn test_timeout_is_distinguished() {
    let err = Error::Timeout(Duration::from_millis(5));

    assert!(err.is_timeout());
    assert!(!err.is_validation());
    assert!(err.is_recoverable());
}

#[test]
fn test_validation_is_not_recoverable() {
    let err = Error::Validation("bad".into());

    assert!(err.is_validation());
    assert!(!err.is_recoverable());
}

#[test]
fn test_error_clone_shares_cause() {
    // Arrange
    let err = Error::backend_with("scan failed", std::io::Error::other("gone"));

    // Act
    let cloned = err.clone();

    // Assert
    assert_eq!(err.to_string(), cloned.to_string());
    assert!(cloned.source().is_some());
}
