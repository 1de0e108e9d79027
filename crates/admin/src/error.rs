//! Unified error handling for the dashboard and the JSON API.
//!
//! Response bodies are plain text, matching what storefront clients of the
//! API already expect (`"Unauthenticated"`, `"Name is required"`, ...).

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::db::RepositoryError;

/// Application-level error type.
#[derive(Debug, Error)]
pub enum AppError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// Resource not found (message is sent to the client).
    #[error("{0}")]
    NotFound(String),

    /// No signed-in user.
    #[error("Unauthenticated")]
    Unauthenticated,

    /// Signed in, but not the owner of the addressed store.
    #[error("Unauthorized")]
    Forbidden,

    /// Validation failure or malformed input (message is sent to the client).
    #[error("{0}")]
    BadRequest(String),

    /// The operation conflicts with existing records.
    #[error("{0}")]
    Conflict(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Whether this error is the server's fault (logged and sent to Sentry).
    #[must_use]
    pub const fn is_server_error(&self) -> bool {
        matches!(
            self,
            Self::Internal(_)
                | Self::Database(RepositoryError::Database(_) | RepositoryError::DataCorruption(_))
        )
    }

    /// HTTP status for this error.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Database(RepositoryError::NotFound) | Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Database(RepositoryError::Conflict(_)) | Self::Conflict(_) => {
                StatusCode::CONFLICT
            }
            Self::Database(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Unauthenticated => StatusCode::UNAUTHORIZED,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
        }
    }

    /// Body text sent to the client.
    #[must_use]
    pub fn client_message(&self) -> String {
        match self {
            Self::Database(RepositoryError::NotFound) => "Not found".to_owned(),
            Self::Database(RepositoryError::Conflict(msg)) => msg.clone(),
            // Don't expose internal error details to clients
            Self::Database(_) | Self::Internal(_) => "Internal error".to_owned(),
            _ => self.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if self.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Admin request error"
            );
        }

        (self.status(), self.client_message()).into_response()
    }
}

/// Attach a handler tag to server errors before they propagate.
///
/// Logs `[SIZES_POST] <error>` so failures can be traced back to the route
/// without a backtrace.
pub trait ResultExt<T> {
    /// Convert into [`AppError`], logging server errors under `tag`.
    ///
    /// # Errors
    ///
    /// Returns the converted error unchanged apart from the log line.
    fn context(self, tag: &'static str) -> Result<T, AppError>;
}

impl<T, E> ResultExt<T> for Result<T, E>
where
    E: Into<AppError>,
{
    fn context(self, tag: &'static str) -> Result<T, AppError> {
        self.map_err(|e| {
            let err = e.into();
            if err.is_server_error() {
                tracing::error!(error = %err, "[{tag}] request failed");
            }
            err
        })
    }
}

/// Set the Sentry user context from the identity-provider user id.
pub fn set_sentry_user(user_id: &str, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_owned()),
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn get_status(err: AppError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn test_app_error_display() {
        assert_eq!(AppError::Unauthenticated.to_string(), "Unauthenticated");
        assert_eq!(AppError::Forbidden.to_string(), "Unauthorized");
        assert_eq!(
            AppError::BadRequest("Name is required".to_owned()).to_string(),
            "Name is required"
        );
    }

    #[test]
    fn test_app_error_status_codes() {
        assert_eq!(
            get_status(AppError::NotFound("Size not found".to_owned())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(get_status(AppError::Unauthenticated), StatusCode::UNAUTHORIZED);
        assert_eq!(get_status(AppError::Forbidden), StatusCode::FORBIDDEN);
        assert_eq!(
            get_status(AppError::BadRequest("test".to_owned())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(AppError::Internal("test".to_owned())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_repository_errors_map_to_client_statuses() {
        assert_eq!(
            get_status(AppError::Database(RepositoryError::NotFound)),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(AppError::Database(RepositoryError::Conflict(
                crate::db::sizes::IN_USE.to_owned()
            ))),
            StatusCode::CONFLICT
        );
        assert_eq!(
            get_status(AppError::Database(RepositoryError::DataCorruption(
                "bad row".to_owned()
            ))),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_internal_details_are_hidden() {
        let err = AppError::Internal("pool timed out".to_owned());
        assert_eq!(err.client_message(), "Internal error");

        let err = AppError::Database(RepositoryError::DataCorruption("x".to_owned()));
        assert_eq!(err.client_message(), "Internal error");
    }

    #[test]
    fn test_conflict_message_is_passed_through() {
        let err = AppError::Database(RepositoryError::Conflict("in use".to_owned()));
        assert_eq!(err.client_message(), "in use");
        assert!(!err.is_server_error());
    }

    #[test]
    fn test_in_use_conflicts_tell_the_user_what_to_remove() {
        let cases = [
            (
                crate::db::sizes::IN_USE,
                "Make sure you removed all products using this size first.",
            ),
            (
                crate::db::colors::IN_USE,
                "Make sure you removed all products using this color first.",
            ),
            (
                crate::db::categories::IN_USE,
                "Make sure you removed all products using this category first.",
            ),
            (
                crate::db::billboards::IN_USE,
                "Make sure you removed all categories using this billboard first.",
            ),
            (
                crate::db::stores::IN_USE,
                "Make sure you removed all products and categories first.",
            ),
        ];
        for (message, expected) in cases {
            let err = AppError::Database(RepositoryError::Conflict(message.to_owned()));
            assert_eq!(err.status(), StatusCode::CONFLICT);
            assert_eq!(err.client_message(), expected);
        }
    }

    #[test]
    fn test_context_passes_error_through() {
        let result: Result<(), AppError> = Err(AppError::Forbidden);
        let err = result.context("SIZES_POST").unwrap_err();
        assert!(matches!(err, AppError::Forbidden));

        let result: Result<(), RepositoryError> = Err(RepositoryError::NotFound);
        let err = result.context("SIZES_DELETE").unwrap_err();
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
    }
}
