use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::Utc;
use thiserror::Error;

use crate::upstream::UpstreamError;
use crate::utils::error_to_api_response;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Parâmetros de consulta inválidos")]
    InvalidQuery(String),

    #[error("Erro ao buscar {resource}")]
    Upstream {
        resource: &'static str,
        #[source]
        source: UpstreamError,
    },
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message, details) = match &self {
            AppError::InvalidQuery(reason) => (
                StatusCode::BAD_REQUEST,
                self.to_string(),
                Some(reason.clone()),
            ),
            AppError::Upstream { source, .. } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                self.to_string(),
                Some(source.to_string()),
            ),
        };

        (status, error_to_api_response(error_message, details, Utc::now())).into_response()
    }
}
