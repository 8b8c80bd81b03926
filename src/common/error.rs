// src/common/error.rs

use std::collections::HashMap;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use rust_decimal::Decimal;
use serde_json::{json, Value};
use thiserror::Error;
use uuid::Uuid;

use crate::{common::i18n::I18nStore, middleware::i18n::Locale};

const NUMERIC_OUT_OF_RANGE: &str = "22003";

/// Classificação dos erros de negócio, independente do transporte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    InvalidAmount,
    Unauthorized,
    Forbidden,
    NotFound,
    Conflict,
    AlreadyDecided,
    NotFullyPaid,
    Storage,
    Internal,
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Erro de validação")]
    ValidationError(#[from] validator::ValidationErrors),

    #[error("Dados inválidos: {0}")]
    InvalidInput(String),

    #[error("Medidas inválidas")]
    InvalidMeasurements(HashMap<String, String>),

    #[error("Montante inválido: {0}")]
    InvalidAmount(Decimal),

    #[error("Commande não quitada, resta {reste}")]
    NotFullyPaid { reste: Decimal },

    #[error("Entrada de histórico {0} já foi decidida")]
    AlreadyDecided(Uuid),

    #[error("Acesso negado: {0}")]
    Forbidden(String),

    #[error("Recurso não encontrado: {0}")]
    ResourceNotFound(String),

    #[error("Conflito: {0}")]
    Conflict(String),

    #[error("Violação de unicidade: {0}")]
    UniqueConstraintViolation(String),

    #[error("Credenciais inválidas")]
    InvalidCredentials,

    #[error("Token inválido")]
    InvalidToken,

    #[error("Usuário não encontrado")]
    UserNotFound,

    #[error("Conta desativada")]
    AccountDisabled,

    #[error("Salon desativado")]
    SalonDisabled,

    // Falhas da camada de armazenamento: o chamador pode tentar de novo
    #[error("Erro de banco de dados")]
    DatabaseError(#[from] sqlx::Error),

    #[error("Erro interno do servidor")]
    InternalServerError(#[from] anyhow::Error),

    #[error("Erro de Bcrypt: {0}")]
    BcryptError(#[from] bcrypt::BcryptError),

    #[error("Erro de JWT: {0}")]
    JwtError(#[from] jsonwebtoken::errors::Error),

    #[error("Fonte não encontrada: {0}")]
    FontNotFound(String),

    #[error("Erro ao gravar arquivo: {0}")]
    FileStorageError(#[from] std::io::Error),
}

impl AppError {
    /// Traduz violações de constraint do Postgres para erros de negócio.
    /// Qualquer outro erro continua sendo `DatabaseError`.
    pub fn from_db(e: sqlx::Error) -> Self {
        if let Some(db_err) = e.as_database_error() {
            if db_err.is_unique_violation() {
                let constraint = db_err.constraint().unwrap_or("unique").to_string();
                return AppError::UniqueConstraintViolation(constraint);
            }
            if db_err.is_foreign_key_violation() {
                let constraint = db_err.constraint().unwrap_or("foreign_key").to_string();
                return AppError::Conflict(constraint);
            }
            if db_err.is_check_violation() {
                let constraint = db_err.constraint().unwrap_or("check").to_string();
                return AppError::InvalidInput(constraint);
            }
            // numeric_value_out_of_range
            if db_err.code().as_deref() == Some(NUMERIC_OUT_OF_RANGE) {
                return AppError::InvalidInput(db_err.message().to_string());
            }
        }
        AppError::DatabaseError(e)
    }

    pub fn not_found(what: impl Into<String>) -> Self {
        AppError::ResourceNotFound(what.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            AppError::ValidationError(_)
            | AppError::InvalidInput(_)
            | AppError::InvalidMeasurements(_) => ErrorKind::Validation,
            AppError::InvalidAmount(_) => ErrorKind::InvalidAmount,
            AppError::NotFullyPaid { .. } => ErrorKind::NotFullyPaid,
            AppError::AlreadyDecided(_) => ErrorKind::AlreadyDecided,
            AppError::Forbidden(_) | AppError::AccountDisabled | AppError::SalonDisabled => {
                ErrorKind::Forbidden
            }
            AppError::ResourceNotFound(_) | AppError::UserNotFound => ErrorKind::NotFound,
            AppError::Conflict(_) | AppError::UniqueConstraintViolation(_) => ErrorKind::Conflict,
            AppError::InvalidCredentials | AppError::InvalidToken | AppError::JwtError(_) => {
                ErrorKind::Unauthorized
            }
            AppError::DatabaseError(_) => ErrorKind::Storage,
            AppError::InternalServerError(_)
            | AppError::BcryptError(_)
            | AppError::FontNotFound(_)
            | AppError::FileStorageError(_) => ErrorKind::Internal,
        }
    }

    /// Só falhas de armazenamento são transitórias; regras de negócio nunca são.
    pub fn is_retryable(&self) -> bool {
        self.kind() == ErrorKind::Storage
    }

    pub fn status_code(&self) -> StatusCode {
        match self.kind() {
            ErrorKind::Validation | ErrorKind::InvalidAmount => StatusCode::BAD_REQUEST,
            ErrorKind::Unauthorized => StatusCode::UNAUTHORIZED,
            ErrorKind::Forbidden => StatusCode::FORBIDDEN,
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::Conflict | ErrorKind::AlreadyDecided => StatusCode::CONFLICT,
            ErrorKind::NotFullyPaid => StatusCode::UNPROCESSABLE_ENTITY,
            ErrorKind::Storage | ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    // Chave de tradução + argumentos de interpolação
    fn message_key(&self) -> (&'static str, Vec<(&'static str, String)>) {
        match self {
            AppError::ValidationError(_) => ("errors.validation", vec![]),
            AppError::InvalidInput(detail) => ("errors.invalid_input", vec![("detail", detail.clone())]),
            AppError::InvalidMeasurements(_) => ("errors.invalid_measurements", vec![]),
            AppError::InvalidAmount(amount) => ("errors.invalid_amount", vec![("amount", amount.to_string())]),
            AppError::NotFullyPaid { reste } => ("errors.not_fully_paid", vec![("reste", reste.to_string())]),
            AppError::AlreadyDecided(id) => ("errors.already_decided", vec![("id", id.to_string())]),
            AppError::Forbidden(detail) => ("errors.forbidden", vec![("detail", detail.clone())]),
            AppError::ResourceNotFound(what) => ("errors.not_found", vec![("resource", what.clone())]),
            AppError::Conflict(detail) => ("errors.conflict", vec![("detail", detail.clone())]),
            AppError::UniqueConstraintViolation(constraint) => {
                ("errors.unique_violation", vec![("constraint", constraint.clone())])
            }
            AppError::InvalidCredentials => ("errors.invalid_credentials", vec![]),
            AppError::InvalidToken | AppError::JwtError(_) => ("errors.invalid_token", vec![]),
            AppError::UserNotFound => ("errors.user_not_found", vec![]),
            AppError::AccountDisabled => ("errors.account_disabled", vec![]),
            AppError::SalonDisabled => ("errors.salon_disabled", vec![]),
            AppError::DatabaseError(_)
            | AppError::InternalServerError(_)
            | AppError::BcryptError(_)
            | AppError::FontNotFound(_)
            | AppError::FileStorageError(_) => ("errors.internal", vec![]),
        }
    }

    fn details(&self) -> Option<Value> {
        match self {
            AppError::ValidationError(errors) => {
                let mut details = HashMap::new();
                for (field, field_errors) in errors.field_errors() {
                    let codes: Vec<String> = field_errors
                        .iter()
                        .map(|e| {
                            e.message
                                .as_ref()
                                .map(|m| m.to_string())
                                .unwrap_or_else(|| e.code.to_string())
                        })
                        .collect();
                    details.insert(field.to_string(), codes);
                }
                Some(json!(details))
            }
            AppError::InvalidMeasurements(errors) => Some(json!(errors)),
            AppError::NotFullyPaid { reste } => Some(json!({ "reste": reste })),
            _ => None,
        }
    }

    /// Converte o erro de domínio em resposta HTTP traduzida.
    pub fn to_api_error(&self, locale: &Locale, i18n: &I18nStore) -> ApiError {
        let status = self.status_code();
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!("Erro Interno do Servidor: {:?}", self);
        }

        let (key, args) = self.message_key();
        ApiError {
            status,
            error: i18n.translate(&locale.0, key, &args),
            details: self.details(),
        }
    }
}

/// Erro já pronto para o transporte HTTP.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub error: String,
    pub details: Option<Value>,
}

impl ApiError {
    pub fn new(status: StatusCode, error: impl Into<String>) -> Self {
        Self { status, error: error.into(), details: None }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = match self.details {
            Some(details) => json!({ "error": self.error, "details": details }),
            None => json!({ "error": self.error }),
        };
        (self.status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> I18nStore {
        I18nStore::load().expect("catálogos embutidos")
    }

    #[test]
    fn business_errors_map_to_expected_status() {
        assert_eq!(AppError::InvalidAmount(Decimal::NEGATIVE_ONE).status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(
            AppError::NotFullyPaid { reste: Decimal::ONE }.status_code(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(AppError::AlreadyDecided(Uuid::nil()).status_code(), StatusCode::CONFLICT);
        assert_eq!(AppError::Forbidden("x".into()).status_code(), StatusCode::FORBIDDEN);
        assert_eq!(AppError::not_found("commande").status_code(), StatusCode::NOT_FOUND);
        assert_eq!(
            AppError::UniqueConstraintViolation("salons_pkey".into()).status_code(),
            StatusCode::CONFLICT
        );
    }

    #[test]
    fn only_storage_errors_are_retryable() {
        assert!(AppError::DatabaseError(sqlx::Error::PoolTimedOut).is_retryable());
        assert!(!AppError::InvalidAmount(Decimal::ZERO).is_retryable());
        assert!(!AppError::Conflict("rappel".into()).is_retryable());
        assert!(!AppError::NotFullyPaid { reste: Decimal::TEN }.is_retryable());
    }

    #[test]
    fn api_error_is_translated_and_carries_details() {
        let err = AppError::NotFullyPaid { reste: Decimal::new(150000, 2) };
        let api = err.to_api_error(&Locale("fr".into()), &store());

        assert_eq!(api.status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(api.error.contains("1500.00"), "mensagem: {}", api.error);
        assert!(api.details.is_some());
    }

    #[test]
    fn measurement_errors_are_reported_per_key() {
        let mut errors = HashMap::new();
        errors.insert("Tour de taille".to_string(), "negative".to_string());
        let api = AppError::InvalidMeasurements(errors).to_api_error(&Locale("en".into()), &store());

        assert_eq!(api.status, StatusCode::BAD_REQUEST);
        assert_eq!(api.details, Some(json!({ "Tour de taille": "negative" })));
    }
}
