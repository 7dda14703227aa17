use axum::{
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DateError {
    #[error("expected YYYY-MM-DD, got {0:?}")]
    Layout(String),
    #[error(transparent)]
    Calendar(#[from] chrono::ParseError),
}

#[derive(Debug, Error)]
pub enum DbError {
    #[error("book {0} not found")]
    NotFound(i64),
    #[error("invalid published_date {value:?}")]
    InvalidDate {
        value: String,
        #[source]
        source: DateError,
    },
    #[error("store error")]
    Store(#[from] libsql::Error),
}

/// Errors a request handler turns into a plain-text response.
#[derive(Debug, Error)]
pub enum HandlerError {
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Internal(String),
}

impl HandlerError {
    pub fn bad_request(msg: &str, err: &dyn std::error::Error) -> Self {
        HandlerError::BadRequest(format!("{}: {}", msg, crate::unpack_error(err)))
    }

    pub fn not_found(msg: &str, err: &dyn std::error::Error) -> Self {
        HandlerError::NotFound(format!("{}: {}", msg, crate::unpack_error(err)))
    }

    pub fn internal(msg: &str, err: &dyn std::error::Error) -> Self {
        HandlerError::Internal(format!("{}: {}", msg, crate::unpack_error(err)))
    }

    pub fn status(&self) -> StatusCode {
        use HandlerError::*;
        match self {
            BadRequest(_) => StatusCode::BAD_REQUEST,
            NotFound(_) => StatusCode::NOT_FOUND,
            Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for HandlerError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(status = status.as_u16(), "{}", self);
        } else {
            tracing::info!(status = status.as_u16(), "{}", self);
        }

        (
            status,
            [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
            self.to_string(),
        )
            .into_response()
    }
}
