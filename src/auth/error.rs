use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use serde_json::json;
use thiserror::Error;

/// Rejections of the bearer check and the role check.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Missing Authorization header")]
    MissingHeader,

    #[error("Authorization header must be a Bearer token")]
    MalformedHeader,

    #[error("Invalid or expired token: {0}")]
    InvalidToken(String),

    #[error("Access token required")]
    NotAccessToken,

    #[error("Unknown role {0}")]
    UnknownRole(u8),

    #[error("Only HR or Admin users can change payroll data")]
    Forbidden,
}

impl ResponseError for AuthError {
    fn status_code(&self) -> StatusCode {
        match self {
            AuthError::Forbidden => StatusCode::FORBIDDEN,
            _ => StatusCode::UNAUTHORIZED,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let code = match self {
            AuthError::Forbidden => "forbidden",
            _ => "unauthorized",
        };

        HttpResponse::build(self.status_code()).json(json!({
            "error": code,
            "message": self.to_string(),
        }))
    }
}
