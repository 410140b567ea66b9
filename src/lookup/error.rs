//! Failure classification for the lookup pipeline.
//!
//! Upstream failures are mapped onto a small, fixed set of categories, each
//! with a fixed HTTP status. Rules are checked in order and the first match
//! wins:
//!
//! 1. explicit not-found marker → `profile_not_found`
//! 2. 401/403, auth kind, or an auth token in the message → `auth_error`
//! 3. timeout kind, or abort/timeout in the name or message → `upstream_timeout`
//! 4. anything else → `upstream_error`

use axum::http::StatusCode;
use thiserror::Error;

use crate::lookup::username::InvalidUsername;
use crate::upstream::{FailureKind, UpstreamFailure};

/// Maximum length (in characters) of a user-visible detail string.
pub const MAX_DETAIL_CHARS: usize = 300;

/// User-facing error category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    Auth,
    NotFound,
    Timeout,
    Upstream,
    Internal,
}

impl ErrorCategory {
    /// Wire code used in the `error` field of responses.
    pub fn code(&self) -> &'static str {
        match self {
            ErrorCategory::Auth => "auth_error",
            ErrorCategory::NotFound => "profile_not_found",
            ErrorCategory::Timeout => "upstream_timeout",
            ErrorCategory::Upstream => "upstream_error",
            ErrorCategory::Internal => "internal_error",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ErrorCategory::NotFound => StatusCode::NOT_FOUND,
            ErrorCategory::Internal => StatusCode::INTERNAL_SERVER_ERROR,
            // Credential problems are ours, not the caller's: never 401.
            ErrorCategory::Auth | ErrorCategory::Timeout | ErrorCategory::Upstream => {
                StatusCode::BAD_GATEWAY
            }
        }
    }
}

/// A classified failure ready to be rendered.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{}: {detail}", category.code())]
pub struct ClassifiedError {
    pub category: ErrorCategory,
    pub detail: String,
}

impl ClassifiedError {
    pub fn new(category: ErrorCategory, detail: impl AsRef<str>) -> Self {
        Self {
            category,
            detail: truncate_detail(detail.as_ref()),
        }
    }

    /// A failure in local processing.
    pub fn internal(detail: impl AsRef<str>) -> Self {
        Self::new(ErrorCategory::Internal, detail)
    }
}

/// Everything a lookup can end with besides a profile.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LookupError {
    #[error(transparent)]
    InvalidUsername(#[from] InvalidUsername),

    #[error(transparent)]
    Failed(#[from] ClassifiedError),
}

impl LookupError {
    /// Wire code used in the `error` field of responses.
    pub fn code(&self) -> &'static str {
        match self {
            LookupError::InvalidUsername(_) => "invalid_username",
            LookupError::Failed(e) => e.category.code(),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            LookupError::InvalidUsername(_) => StatusCode::BAD_REQUEST,
            LookupError::Failed(e) => e.category.status(),
        }
    }
}

/// Classify an upstream failure. Deterministic in its input.
pub fn classify(failure: &UpstreamFailure) -> ClassifiedError {
    ClassifiedError::new(category_of(failure), &failure.message)
}

fn category_of(failure: &UpstreamFailure) -> ErrorCategory {
    let message = failure.message.to_lowercase();
    let name = failure.name.as_deref().unwrap_or_default().to_lowercase();

    if failure.kind == FailureKind::NotFound {
        return ErrorCategory::NotFound;
    }

    if failure.kind == FailureKind::Auth
        || matches!(failure.status, Some(401) | Some(403))
        || message.contains("auth")
        || message.contains("unauthorized")
    {
        return ErrorCategory::Auth;
    }

    if failure.kind == FailureKind::Timeout
        || name.contains("abort")
        || name.contains("timeout")
        || message.contains("abort")
        || message.contains("timeout")
        || message.contains("timed out")
    {
        return ErrorCategory::Timeout;
    }

    ErrorCategory::Upstream
}

/// Cut `detail` to at most [`MAX_DETAIL_CHARS`] characters.
pub fn truncate_detail(detail: &str) -> String {
    match detail.char_indices().nth(MAX_DETAIL_CHARS) {
        Some((idx, _)) => detail[..idx].to_string(),
        None => detail.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn failure(kind: FailureKind, message: &str) -> UpstreamFailure {
        UpstreamFailure::new(kind, message)
    }

    #[test]
    fn test_not_found_wins() {
        let f = failure(FailureKind::NotFound, "unauthorized timeout").with_status(401);
        assert_eq!(classify(&f).category, ErrorCategory::NotFound);
        assert_eq!(classify(&f).category.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_auth_rules() {
        let by_status = failure(FailureKind::Unknown, "nope").with_status(403);
        let by_message = failure(FailureKind::Network, "User is Unauthorized");
        let by_kind = failure(FailureKind::Auth, "rejected");
        let before_timeout = failure(FailureKind::Timeout, "auth timeout");

        for f in [by_status, by_message, by_kind, before_timeout] {
            let classified = classify(&f);
            assert_eq!(classified.category, ErrorCategory::Auth, "{:?}", f);
            assert_eq!(classified.category.status(), StatusCode::BAD_GATEWAY);
            assert_eq!(classified.category.code(), "auth_error");
        }
    }

    #[test]
    fn test_timeout_rules() {
        let by_name = failure(FailureKind::Network, "socket closed").with_name("AbortError");
        let by_message = failure(FailureKind::Unknown, "Request Timed Out");
        let by_kind = failure(FailureKind::Timeout, "deadline");

        for f in [by_name, by_message, by_kind] {
            assert_eq!(classify(&f).category, ErrorCategory::Timeout, "{:?}", f);
        }
    }

    #[test]
    fn test_fallback_is_upstream_error() {
        let f = failure(FailureKind::Network, "connection refused").with_status(500);
        let classified = classify(&f);
        assert_eq!(classified.category, ErrorCategory::Upstream);
        assert_eq!(classified.detail, "connection refused");
        assert_eq!(classified, classify(&f));
    }

    #[test]
    fn test_detail_is_truncated() {
        let long = "é".repeat(MAX_DETAIL_CHARS + 50);
        let classified = classify(&failure(FailureKind::Unknown, &long));
        assert_eq!(classified.detail.chars().count(), MAX_DETAIL_CHARS);
        assert_eq!(truncate_detail("short"), "short");
    }

    #[test]
    fn test_lookup_error_mapping() {
        let invalid = LookupError::from(InvalidUsername);
        assert_eq!(invalid.code(), "invalid_username");
        assert_eq!(invalid.status(), StatusCode::BAD_REQUEST);

        let internal = LookupError::from(ClassifiedError::internal("boom"));
        assert_eq!(internal.code(), "internal_error");
        assert_eq!(internal.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
