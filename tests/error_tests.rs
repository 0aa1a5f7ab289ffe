//! Tests for the error system.

use herizon_session::api::ApiError;
use herizon_session::auth::AuthError;
use herizon_session::error::*;
use pretty_assertions::assert_eq;

#[test]
fn auth_error_mappings_are_stable_for_major_variants() {
    struct Case {
        error: AuthError,
        expected_category: ErrorCategory,
        expected_recovery: RecoverySuggestion,
    }

    let cases = vec![
        Case {
            error: AuthError::ExchangeRejected {
                reason: RejectReason::InvalidCode,
                message: "code been used".to_string(),
            },
            expected_category: ErrorCategory::Authentication,
            expected_recovery: RecoverySuggestion::LogInAgain,
        },
        Case {
            error: AuthError::ExchangeRejected {
                reason: RejectReason::RateLimited,
                message: "too frequent".to_string(),
            },
            expected_category: ErrorCategory::RateLimit,
            expected_recovery: RecoverySuggestion::RetryLater,
        },
        Case {
            error: AuthError::ExchangeRejected {
                reason: RejectReason::Misconfigured,
                message: "invalid appid".to_string(),
            },
            expected_category: ErrorCategory::Configuration,
            expected_recovery: RecoverySuggestion::ContactSupport,
        },
        Case {
            error: AuthError::Network("reset".to_string()),
            expected_category: ErrorCategory::Network,
            expected_recovery: RecoverySuggestion::CheckConnection,
        },
        Case {
            error: AuthError::Timeout(10_000),
            expected_category: ErrorCategory::Timeout,
            expected_recovery: RecoverySuggestion::CheckConnection,
        },
        Case {
            error: AuthError::ServerRejected("expired".to_string()),
            expected_category: ErrorCategory::Authentication,
            expected_recovery: RecoverySuggestion::LogInAgain,
        },
        Case {
            error: AuthError::RefreshFailed("denied".to_string()),
            expected_category: ErrorCategory::Authentication,
            expected_recovery: RecoverySuggestion::None,
        },
        Case {
            error: AuthError::UserCancelled,
            expected_category: ErrorCategory::Platform,
            expected_recovery: RecoverySuggestion::None,
        },
    ];

    for case in cases {
        assert_eq!(case.error.category(), case.expected_category, "{:?}", case.error);
        assert_eq!(
            case.error.recovery_suggestion(),
            case.expected_recovery,
            "{:?}",
            case.error
        );
    }
}

#[test]
fn unclassified_errors_surface_raw_message() {
    let err = AuthError::ExchangeRejected {
        reason: RejectReason::Other,
        message: "account suspended".to_string(),
    };
    assert_eq!(err.user_message(), "account suspended");
    assert_eq!(AuthError::UserCancelled.user_message(), "Login was cancelled");
}

#[test]
fn exchange_failures_map_by_transport_layer() {
    assert!(matches!(
        AuthError::from_exchange_failure(ApiError::Transport("dns".to_string())),
        AuthError::Network(_)
    ));
    assert!(matches!(
        AuthError::from_exchange_failure(ApiError::Decode("eof".to_string())),
        AuthError::MalformedResponse(_)
    ));
    assert!(matches!(
        AuthError::from_exchange_failure(ApiError::Business {
            code: 500,
            message: "errcode 40163 code been used".to_string(),
        }),
        AuthError::ExchangeRejected {
            reason: RejectReason::InvalidCode,
            ..
        }
    ));
}

#[test]
fn api_status_categories() {
    let status = |status| ApiError::Status {
        status,
        message: String::new(),
    };
    assert_eq!(status(401).category(), ErrorCategory::Authentication);
    assert_eq!(status(429).category(), ErrorCategory::RateLimit);
    assert_eq!(status(503).category(), ErrorCategory::Server);
    assert_eq!(status(404).category(), ErrorCategory::Api);
}

#[test]
fn crate_error_delegates_to_auth_classification() {
    let err: HerizonError = AuthError::NoLocalSession.into();
    assert_eq!(err.category(), ErrorCategory::Authentication);
    assert_eq!(err.user_message(), "Login is invalid or expired, please log in again");

    let err = HerizonError::Configuration("bad".to_string());
    assert_eq!(err.recovery_suggestion(), RecoverySuggestion::CheckConfiguration);

    let io = std::io::Error::new(std::io::ErrorKind::Other, "disk");
    assert_eq!(HerizonError::from(io).category(), ErrorCategory::Storage);
}
