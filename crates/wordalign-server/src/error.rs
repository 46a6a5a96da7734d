use axum::http::StatusCode;
use axum::http::header::CONTENT_TYPE;
use axum::response::{IntoResponse, Response};
use thiserror::Error;
use tokio::task::JoinError;
use tracing::{error, warn};
use wordalign_core::AlignError;

/// Errors returned by the HTTP handlers.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The body is not a readable multipart form.
    #[error("Invalid form")]
    InvalidForm(String),

    /// A required upload field is absent.
    #[error("Missing {0} file")]
    MissingField(&'static str),

    /// The body exceeds the configured upload limit.
    #[error("Upload too large")]
    TooLarge,

    /// The pipeline failed.
    #[error(transparent)]
    Align(#[from] AlignError),

    /// The blocking alignment task panicked or was cancelled.
    #[error("alignment task failed: {0}")]
    Task(#[from] JoinError),
}

impl ApiError {
    /// HTTP status for this error.
    pub fn status(&self) -> StatusCode {
        match self {
            Self::InvalidForm(_) | Self::MissingField(_) => StatusCode::BAD_REQUEST,
            Self::TooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            Self::Align(_) | Self::Task(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        match &self {
            Self::InvalidForm(detail) => warn!(%detail, "rejected malformed form"),
            _ if status.is_client_error() => warn!(error = %self, "rejected request"),
            _ => error!(error = %self, "alignment failed"),
        }
        (status, [(CONTENT_TYPE, "text/plain; charset=utf-8")], self.to_string()).into_response()
    }
}

#[cfg(test)]
mod tests {
    use std::io;

    use super::*;
    use wordalign_core::CorpusSide;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            ApiError::MissingField("tgt").status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::InvalidForm("no boundary".into()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::from(AlignError::TempDir(io::Error::other("full"))).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_messages() {
        assert_eq!(ApiError::MissingField("src").to_string(), "Missing src file");
        assert_eq!(ApiError::InvalidForm("x".into()).to_string(), "Invalid form");

        let err = ApiError::from(AlignError::Encode {
            side: CorpusSide::Source,
            source: io::Error::other("read failed"),
        });
        assert_eq!(err.to_string(), "Failed to convert src file: read failed");
    }
}
