// src/db/logo_repo.rs

use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::logo::{Logo, LogoContent, NewLogo},
};

const COLUMNS: &str = "salon_id, logo_name, mime_type, file_size, description, uploaded_by, uploaded_at";

#[derive(Clone)]
pub struct LogoRepository {
    pool: PgPool,
}

impl LogoRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // Um logo por salon: o novo substitui o anterior
    pub async fn upsert(&self, salon_id: &str, uploaded_by: Uuid, logo: &NewLogo) -> Result<Logo, AppError> {
        let sql = format!(
            r#"
            INSERT INTO app_logo (salon_id, logo_data, logo_name, mime_type, file_size, description, uploaded_by)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (salon_id) DO UPDATE SET
                logo_data = EXCLUDED.logo_data,
                logo_name = EXCLUDED.logo_name,
                mime_type = EXCLUDED.mime_type,
                file_size = EXCLUDED.file_size,
                description = EXCLUDED.description,
                uploaded_by = EXCLUDED.uploaded_by,
                uploaded_at = NOW()
            RETURNING {COLUMNS}
            "#
        );

        sqlx::query_as::<_, Logo>(&sql)
            .bind(salon_id)
            .bind(&logo.data)
            .bind(logo.logo_name.trim())
            .bind(&logo.mime_type)
            .bind(logo.data.len() as i64)
            .bind(&logo.description)
            .bind(uploaded_by)
            .fetch_one(&self.pool)
            .await
            .map_err(AppError::from_db)
    }

    pub async fn get(&self, salon_id: &str) -> Result<Option<LogoContent>, AppError> {
        let sql = format!("SELECT {COLUMNS}, logo_data FROM app_logo WHERE salon_id = $1");
        let logo = sqlx::query_as::<_, LogoContent>(&sql)
            .bind(salon_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(logo)
    }

    pub async fn delete(&self, salon_id: &str) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM app_logo WHERE salon_id = $1")
            .bind(salon_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
