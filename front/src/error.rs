use thiserror::Error;

use crate::api::ApiError;

/// Failure of a user-triggered action. Every variant is terminal: nothing is
/// retried and no partial change is kept.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TodoError {
    /// Rejected locally before any request was made.
    #[error("{0}")]
    Validation(String),

    /// The remote call did not succeed.
    #[error("{message}")]
    RequestFailed { message: String },

    /// Missing or rejected session token.
    #[error("session expired, please log in again")]
    AuthExpired,
}

impl TodoError {
    pub fn validation(message: impl Into<String>) -> Self {
        TodoError::Validation(message.into())
    }

    /// Maps a remote failure, preferring the server's message over
    /// `fallback`.
    pub fn from_api(err: &ApiError, fallback: &str) -> Self {
        match err {
            ApiError::Unauthorized => TodoError::AuthExpired,
            err => TodoError::RequestFailed {
                message: err
                    .server_message()
                    .map(str::to_string)
                    .unwrap_or_else(|| fallback.to_string()),
            },
        }
    }

    /// Process exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            TodoError::Validation(_) => 2,
            TodoError::RequestFailed { .. } => 1,
            TodoError::AuthExpired => 3,
        }
    }
}

pub type Result<T> = std::result::Result<T, TodoError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_message_wins_over_fallback() {
        let err = ApiError::Status {
            status: 409,
            message: Some("Title taken".into()),
        };

        assert_eq!(
            TodoError::from_api(&err, "Failed to add todo"),
            TodoError::RequestFailed {
                message: "Title taken".into()
            }
        );
    }

    #[test]
    fn fallback_used_without_server_message() {
        let err = ApiError::Status {
            status: 500,
            message: None,
        };

        assert_eq!(
            TodoError::from_api(&err, "Failed to delete todo").to_string(),
            "Failed to delete todo"
        );
    }

    #[test]
    fn unauthorized_becomes_auth_expired() {
        assert_eq!(
            TodoError::from_api(&ApiError::Unauthorized, "Failed to load todos"),
            TodoError::AuthExpired
        );
    }
}
