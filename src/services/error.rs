use serde_json::Value;
use thiserror::Error;

use crate::auth::password::PasswordError;
use crate::auth::JwtError;
use crate::database::manager::DatabaseError;

/// Business rule failures shared by every service
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{message}")]
    Validation { message: String, details: Option<Value> },

    #[error("{}", .0.join("; "))]
    Identity(Vec<String>),

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error(transparent)]
    Database(#[from] DatabaseError),

    #[error(transparent)]
    Token(#[from] JwtError),

    #[error(transparent)]
    Password(#[from] PasswordError),
}

impl ServiceError {
    pub fn validation(message: impl Into<String>) -> Self {
        ServiceError::Validation {
            message: message.into(),
            details: None,
        }
    }

    pub fn validation_with(message: impl Into<String>, details: Value) -> Self {
        ServiceError::Validation {
            message: message.into(),
            details: Some(details),
        }
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;
