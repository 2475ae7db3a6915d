//! Error taxonomy for the payroll service.
//!
//! Every failure an operation can report maps to one variant here, and each
//! variant maps to exactly one HTTP status.

use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use serde_json::json;
use thiserror::Error;

/// Kind of record a [`PayrollError::NotFound`] refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
pub enum Entity {
    #[strum(serialize = "Employee")]
    Employee,
    #[strum(serialize = "Salary component")]
    SalaryComponent,
    #[strum(serialize = "Payroll")]
    Payroll,
}

#[derive(Debug, Error)]
pub enum PayrollError {
    #[error("{entity} {id} not found")]
    NotFound { entity: Entity, id: u64 },

    #[error("Payroll already exists for employee {employee_id} for {month}/{year}")]
    DuplicatePayroll {
        employee_id: u64,
        month: u8,
        year: i32,
    },

    #[error("{0}")]
    Validation(String),

    #[error("database error")]
    Database(#[from] sqlx::Error),
}

pub type PayrollResult<T> = Result<T, PayrollError>;

impl PayrollError {
    pub fn not_found(entity: Entity, id: u64) -> Self {
        Self::NotFound { entity, id }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    fn code(&self) -> &'static str {
        match self {
            PayrollError::NotFound { .. } => "not_found",
            PayrollError::DuplicatePayroll { .. } => "duplicate_payroll",
            PayrollError::Validation(_) => "validation_error",
            PayrollError::Database(_) => "internal_error",
        }
    }
}

impl ResponseError for PayrollError {
    fn status_code(&self) -> StatusCode {
        match self {
            PayrollError::NotFound { .. } => StatusCode::NOT_FOUND,
            PayrollError::DuplicatePayroll { .. } => StatusCode::CONFLICT,
            PayrollError::Validation(_) => StatusCode::BAD_REQUEST,
            PayrollError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let message = match self {
            PayrollError::Database(e) => {
                tracing::error!(error = %e, "Storage operation failed");
                "Something went wrong, Contact with system admin".to_string()
            }
            other => other.to_string(),
        };

        HttpResponse::build(self.status_code()).json(json!({
            "error": self.code(),
            "message": message,
        }))
    }
}
