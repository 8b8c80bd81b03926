// src/db/salon_repo.rs

use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::salon::{CreateSalonPayload, Salon, UpdateSalonPayload},
};

const COLUMNS: &str = r#"
    salon_id, nom, quartier, responsable, telephone, email, code_admin, admin_id, actif,
    smtp_host, smtp_port, smtp_user, smtp_password, smtp_from, smtp_use_tls, smtp_use_ssl,
    date_creation
"#;

#[derive(Clone)]
pub struct SalonRepository {
    pool: PgPool,
}

impl SalonRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Ids existentes com o prefixo, para calcular a próxima sequência.
    pub async fn ids_with_prefix<'e, E>(&self, executor: E, prefix: &str) -> Result<Vec<String>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let ids = sqlx::query_scalar::<_, String>(
            "SELECT salon_id FROM salons WHERE starts_with(salon_id, $1 || '_')",
        )
        .bind(prefix)
        .fetch_all(executor)
        .await?;
        Ok(ids)
    }

    pub async fn insert<'e, E>(
        &self,
        executor: E,
        salon_id: &str,
        input: &CreateSalonPayload,
    ) -> Result<Salon, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            r#"
            INSERT INTO salons (salon_id, nom, quartier, responsable, telephone, email, code_admin)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {COLUMNS}
            "#
        );

        sqlx::query_as::<_, Salon>(&sql)
            .bind(salon_id)
            .bind(&input.nom)
            .bind(&input.quartier)
            .bind(&input.responsable)
            .bind(&input.telephone)
            .bind(&input.email)
            .bind(&input.code_admin)
            .fetch_one(executor)
            .await
            .map_err(AppError::from_db)
    }

    pub async fn set_admin<'e, E>(&self, executor: E, salon_id: &str, admin_id: Uuid) -> Result<Salon, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!("UPDATE salons SET admin_id = $2 WHERE salon_id = $1 RETURNING {COLUMNS}");
        sqlx::query_as::<_, Salon>(&sql)
            .bind(salon_id)
            .bind(admin_id)
            .fetch_optional(executor)
            .await?
            .ok_or_else(|| AppError::not_found(format!("salon {salon_id}")))
    }

    pub async fn find_by_id<'e, E>(&self, executor: E, salon_id: &str) -> Result<Option<Salon>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!("SELECT {COLUMNS} FROM salons WHERE salon_id = $1");
        let salon = sqlx::query_as::<_, Salon>(&sql)
            .bind(salon_id)
            .fetch_optional(executor)
            .await?;
        Ok(salon)
    }

    pub async fn is_active(&self, salon_id: &str) -> Result<bool, AppError> {
        let actif = sqlx::query_scalar::<_, bool>("SELECT actif FROM salons WHERE salon_id = $1")
            .bind(salon_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(actif.unwrap_or(false))
    }

    pub async fn list<'e, E>(&self, executor: E, only: Option<&str>) -> Result<Vec<Salon>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            "SELECT {COLUMNS} FROM salons WHERE ($1::varchar IS NULL OR salon_id = $1) ORDER BY salon_id"
        );
        let salons = sqlx::query_as::<_, Salon>(&sql)
            .bind(only)
            .fetch_all(executor)
            .await?;
        Ok(salons)
    }

    // Atualização parcial: campos ausentes mantêm o valor atual
    pub async fn update<'e, E>(
        &self,
        executor: E,
        salon_id: &str,
        input: &UpdateSalonPayload,
    ) -> Result<Salon, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            r#"
            UPDATE salons SET
                nom = COALESCE($2, nom),
                quartier = COALESCE($3, quartier),
                responsable = COALESCE($4, responsable),
                telephone = COALESCE($5, telephone),
                email = COALESCE($6, email),
                smtp_host = COALESCE($7, smtp_host),
                smtp_port = COALESCE($8, smtp_port),
                smtp_user = COALESCE($9, smtp_user),
                smtp_password = COALESCE($10, smtp_password),
                smtp_from = COALESCE($11, smtp_from),
                smtp_use_tls = COALESCE($12, smtp_use_tls),
                smtp_use_ssl = COALESCE($13, smtp_use_ssl)
            WHERE salon_id = $1
            RETURNING {COLUMNS}
            "#
        );

        sqlx::query_as::<_, Salon>(&sql)
            .bind(salon_id)
            .bind(&input.nom)
            .bind(&input.quartier)
            .bind(&input.responsable)
            .bind(&input.telephone)
            .bind(&input.email)
            .bind(&input.smtp_host)
            .bind(input.smtp_port)
            .bind(&input.smtp_user)
            .bind(&input.smtp_password)
            .bind(&input.smtp_from)
            .bind(input.smtp_use_tls)
            .bind(input.smtp_use_ssl)
            .fetch_optional(executor)
            .await?
            .ok_or_else(|| AppError::not_found(format!("salon {salon_id}")))
    }

    pub async fn set_active<'e, E>(&self, executor: E, salon_id: &str, actif: bool) -> Result<Salon, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!("UPDATE salons SET actif = $2 WHERE salon_id = $1 RETURNING {COLUMNS}");
        sqlx::query_as::<_, Salon>(&sql)
            .bind(salon_id)
            .bind(actif)
            .fetch_optional(executor)
            .await?
            .ok_or_else(|| AppError::not_found(format!("salon {salon_id}")))
    }
}
