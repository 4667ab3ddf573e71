use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("not authorized to {0}")]
    Forbidden(&'static str),

    #[error("{0}")]
    Unauthorized(&'static str),

    /// The entity exists but its current status does not permit the
    /// requested transition. The message names the status verbatim so the
    /// caller can render it.
    #[error("cannot {action} with status '{status}'")]
    InvalidState {
        action: &'static str,
        status: String,
    },

    #[error("eligibility criteria for this load not met")]
    EligibilityFailed { reasons: Vec<String> },

    #[error("{0}")]
    Conflict(String),

    #[error("validation failed")]
    Validation { messages: Vec<String> },

    #[error("database error")]
    Database(#[from] sqlx::Error),
}

impl Error {
    pub fn invalid_state(action: &'static str, status: impl Into<String>) -> Self {
        Self::InvalidState {
            action,
            status: status.into(),
        }
    }

    /// Stable machine-readable kind, independent of the message text.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "not_found",
            Self::Forbidden(_) => "forbidden",
            Self::Unauthorized(_) => "unauthorized",
            Self::InvalidState { .. } => "invalid_state",
            Self::EligibilityFailed { .. } => "eligibility_failed",
            Self::Conflict(_) => "conflict",
            Self::Validation { .. } => "validation_error",
            Self::Database(_) => "database_error",
        }
    }

    fn status_code(&self) -> StatusCode {
        match self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::InvalidState { .. } | Self::Conflict(_) => StatusCode::CONFLICT,
            Self::EligibilityFailed { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Validation { .. } => StatusCode::BAD_REQUEST,
            Self::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn reasons(&self) -> Option<&[String]> {
        match self {
            Self::EligibilityFailed { reasons } => Some(reasons),
            Self::Validation { messages } => Some(messages),
            _ => None,
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        if let Self::Database(err) = &self {
            tracing::error!(?err, "database error");
        }

        let message = match &self {
            // never leak driver internals to the client
            Self::Database(_) => "internal server error".to_string(),
            other => other.to_string(),
        };

        let body = Json(json!({
            "success": false,
            "kind": self.kind(),
            "error": message,
            "reasons": self.reasons(),
        }));

        (self.status_code(), body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_state_names_current_status() {
        let err = Error::invalid_state("bid on a load", "Assigned");
        assert_eq!(
            format!("{err}"),
            "cannot bid on a load with status 'Assigned'"
        );
        assert_eq!(err.kind(), "invalid_state");
        assert_eq!(err.status_code(), StatusCode::CONFLICT);
    }

    #[test]
    fn eligibility_failure_keeps_every_reason() {
        let err = Error::EligibilityFailed {
            reasons: vec!["too many accidents".into(), "truck too old".into()],
        };
        assert_eq!(err.reasons().map(<[String]>::len), Some(2));
        assert_eq!(err.status_code(), StatusCode::UNPROCESSABLE_ENTITY);
    }
}
