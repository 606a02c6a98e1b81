use std::time::Duration;

use escriba::{EscribaError, Result};

#[test]
fn test_error_display() {
    let err = EscribaError::ModelNotFound("gemini-9".to_string());
    assert!(err.to_string().contains("gemini-9"));
}

#[test]
fn test_validation_display_names_field() {
    let err = EscribaError::Validation {
        field: "draft",
        message: "draft too short (min 20 characters)".into(),
    };
    assert_eq!(err.to_string(), "draft: draft too short (min 20 characters)");
}

#[test]
fn test_result_alias() {
    fn returns_error() -> Result<()> {
        Err(EscribaError::NoProvider)
    }
    assert!(returns_error().is_err());
}

#[test]
fn test_json_error_conversion() {
    fn parse() -> Result<serde_json::Value> {
        Ok(serde_json::from_str("{")?)
    }
    assert!(matches!(parse(), Err(EscribaError::Json(_))));
}

// ============================================================================
// Transient error classification
// ============================================================================

#[test]
fn transient_errors() {
    assert!(EscribaError::RateLimited { retry_after: None }.is_transient());
    assert!(EscribaError::Http("connection reset".into()).is_transient());
    assert!(EscribaError::EmptyResponse.is_transient());
    for status in [500, 502, 503, 504] {
        assert!(
            EscribaError::Api {
                status,
                message: "server".into()
            }
            .is_transient()
        );
    }
}

#[test]
fn permanent_errors() {
    assert!(!EscribaError::AuthenticationFailed.is_transient());
    assert!(!EscribaError::ModelNotFound("x".into()).is_transient());
    assert!(!EscribaError::InvalidInput("x".into()).is_transient());
    assert!(!EscribaError::NoProvider.is_transient());
    assert!(!EscribaError::Configuration("x".into()).is_transient());
    assert!(!EscribaError::ContentFiltered { reason: "x".into() }.is_transient());
    assert!(!EscribaError::Storage("x".into()).is_transient());
    assert!(
        !EscribaError::Api {
            status: 400,
            message: "bad request".into()
        }
        .is_transient()
    );
}

// ============================================================================
// retry_after extraction
// ============================================================================

#[test]
fn retry_after_from_rate_limited() {
    let duration = Duration::from_secs(5);
    let err = EscribaError::RateLimited {
        retry_after: Some(duration),
    };
    assert_eq!(err.retry_after(), Some(duration));
}

#[test]
fn retry_after_none_for_other_errors() {
    assert_eq!(EscribaError::RateLimited { retry_after: None }.retry_after(), None);
    assert_eq!(EscribaError::Http("timeout".into()).retry_after(), None);
}
