pub mod auth_service;
pub mod busca_service;
pub mod comissao_service;
pub mod ideia_service;
pub mod membro_service;
pub mod projeto_service;
pub mod sugestao_service;

use std::collections::HashMap;

pub use auth_service::AuthService;
pub use busca_service::BuscaService;
pub use comissao_service::ComissaoService;
pub use ideia_service::IdeiaService;
pub use membro_service::MembroService;
pub use projeto_service::ProjetoService;
pub use sugestao_service::SugestaoService;

use crate::auth::JwtError;
use crate::database::DatabaseError;
use crate::filter::FilterError;

/// Errors raised by domain services
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("{message}")]
    Validation {
        message: String,
        field_errors: HashMap<String, String>,
    },
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    Unauthorized(String),
    #[error("{0}")]
    NotConfigured(String),
    #[error("Upstream service error: {0}")]
    Upstream(String),
    #[error(transparent)]
    Filter(#[from] FilterError),
    #[error(transparent)]
    Database(#[from] DatabaseError),
    #[error(transparent)]
    Token(#[from] JwtError),
}

impl ServiceError {
    pub fn validation(field: &str, message: impl Into<String>) -> Self {
        let message = message.into();
        let mut field_errors = HashMap::new();
        field_errors.insert(field.to_string(), message.clone());
        ServiceError::Validation { message, field_errors }
    }
}

impl From<sqlx::Error> for ServiceError {
    fn from(err: sqlx::Error) -> Self {
        ServiceError::Database(err.into())
    }
}

/// Trimmed value, or a validation error naming `field` when blank
pub(crate) fn required(field: &str, value: Option<&str>, message: &str) -> Result<String, ServiceError> {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v.to_string()),
        _ => Err(ServiceError::validation(field, message)),
    }
}

/// Trim an optional text field, mapping blank to `None`
pub(crate) fn optional_text(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}
