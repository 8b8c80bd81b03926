// src/db/client_repo.rs

use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::client::{Client, CreateClientPayload},
};

const COLUMNS: &str =
    "id, couturier_id, salon_id, nom, prenom, telephone, email, adresse, date_creation";

#[derive(Clone)]
pub struct ClientRepository {
    pool: PgPool,
}

impl ClientRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // O telefone identifica o cliente dentro do salon
    pub async fn find_by_phone<'e, E>(
        &self,
        executor: E,
        salon_id: &str,
        telephone: &str,
    ) -> Result<Option<Client>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            "SELECT {COLUMNS} FROM clients WHERE salon_id = $1 AND telephone = $2 ORDER BY date_creation LIMIT 1"
        );
        let client = sqlx::query_as::<_, Client>(&sql)
            .bind(salon_id)
            .bind(telephone)
            .fetch_optional(executor)
            .await?;
        Ok(client)
    }

    pub async fn insert<'e, E>(
        &self,
        executor: E,
        salon_id: &str,
        couturier_id: Uuid,
        input: &CreateClientPayload,
    ) -> Result<Client, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            r#"
            INSERT INTO clients (couturier_id, salon_id, nom, prenom, telephone, email, adresse)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {COLUMNS}
            "#
        );

        sqlx::query_as::<_, Client>(&sql)
            .bind(couturier_id)
            .bind(salon_id)
            .bind(input.nom.trim())
            .bind(input.prenom.trim())
            .bind(input.telephone.trim())
            .bind(&input.email)
            .bind(&input.adresse)
            .fetch_one(executor)
            .await
            .map_err(AppError::from_db)
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Client>, AppError> {
        let sql = format!("SELECT {COLUMNS} FROM clients WHERE id = $1");
        let client = sqlx::query_as::<_, Client>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(client)
    }

    pub async fn list(&self, salon_id: &str, search: Option<&str>) -> Result<Vec<Client>, AppError> {
        let pattern = search
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| format!("%{s}%"));

        let sql = format!(
            r#"
            SELECT {COLUMNS} FROM clients
            WHERE salon_id = $1
              AND ($2::text IS NULL OR nom ILIKE $2 OR prenom ILIKE $2 OR telephone ILIKE $2)
            ORDER BY nom, prenom
            "#
        );
        let clients = sqlx::query_as::<_, Client>(&sql)
            .bind(salon_id)
            .bind(pattern)
            .fetch_all(&self.pool)
            .await?;
        Ok(clients)
    }
}
