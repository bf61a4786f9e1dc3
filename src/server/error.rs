use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Missing authorization code")]
    MissingCode,

    #[error("Unknown or reused OAuth state")]
    UnknownState,

    #[error("Not authenticated")]
    Unauthorized,

    #[error("Identity provider error: {0}")]
    Provider(#[from] reqwest::Error),

    #[error("Identity provider rejected the request: {0}")]
    Rejected(String),

    #[error("Internal error: {0}")]
    Internal(#[from] crate::error::TentlyError),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match self {
            AppError::MissingCode | AppError::UnknownState => StatusCode::BAD_REQUEST,
            AppError::Unauthorized => {
                return (StatusCode::UNAUTHORIZED, Json(json!({ "user": null }))).into_response();
            }
            AppError::Provider(_) | AppError::Rejected(_) => StatusCode::BAD_GATEWAY,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        (status, self.to_string()).into_response()
    }
}
