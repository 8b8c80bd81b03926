// src/models/logo.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::common::error::AppError;

pub const MAX_LOGO_BYTES: usize = 5 * 1024 * 1024;

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Logo {
    pub salon_id: String,
    #[schema(example = "logo.png")]
    pub logo_name: String,
    #[schema(example = "image/png")]
    pub mime_type: String,
    pub file_size: i64,
    pub description: Option<String>,
    pub uploaded_by: Option<Uuid>,
    pub uploaded_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow)]
pub struct LogoContent {
    #[sqlx(flatten)]
    pub meta: Logo,
    pub logo_data: Vec<u8>,
}

#[derive(Debug, Clone)]
pub struct NewLogo {
    pub logo_name: String,
    pub mime_type: String,
    pub description: Option<String>,
    pub data: Vec<u8>,
}

impl NewLogo {
    pub fn validate(&self) -> Result<(), AppError> {
        if !self.mime_type.starts_with("image/") {
            return Err(AppError::InvalidInput(format!("type de fichier non supporté: {}", self.mime_type)));
        }
        if self.data.is_empty() {
            return Err(AppError::InvalidInput("logo vide".into()));
        }
        if self.data.len() > MAX_LOGO_BYTES {
            return Err(AppError::InvalidInput("logo trop volumineux".into()));
        }
        if self.logo_name.trim().is_empty() {
            return Err(AppError::InvalidInput("nom du logo obligatoire".into()));
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct LogoUploadParams {
    pub name: Option<String>,
    pub description: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn logo(mime: &str, data: Vec<u8>) -> NewLogo {
        NewLogo { logo_name: "logo.png".into(), mime_type: mime.into(), description: None, data }
    }

    #[test]
    fn only_non_empty_images_are_accepted() {
        assert!(logo("image/png", vec![137, 80, 78, 71]).validate().is_ok());
        assert!(logo("application/pdf", vec![1]).validate().is_err());
        assert!(logo("image/jpeg", vec![]).validate().is_err());
        assert!(logo("image/png", vec![0; MAX_LOGO_BYTES + 1]).validate().is_err());
    }
}
