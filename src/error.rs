use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use thiserror::Error;

use crate::models::FieldErrors;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Malformed request: {0}")]
    MalformedRequest(String),

    #[error("Upstream rejected the submission: {0}")]
    Rejected(FieldErrors),

    #[error("Upstream API error: {0}")]
    Upstream(#[from] reqwest::Error),

    #[error("Upstream returned {status}: {body}")]
    UpstreamStatus { status: StatusCode, body: String },

    #[error("Not an Untappd {kind} URL: {url}")]
    BadLookupUrl { kind: &'static str, url: String },
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match self {
            AppError::MalformedRequest { .. } | AppError::BadLookupUrl { .. } => {
                StatusCode::BAD_REQUEST
            }
            AppError::Rejected { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::UpstreamStatus { .. } | AppError::Upstream { .. } => {
                StatusCode::BAD_GATEWAY
            }
        };

        (status, Html(crate::render::error_page(&self.to_string()))).into_response()
    }
}
