// src/db/user_repo.rs

use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::auth::{Couturier, Role},
};

const COLUMNS: &str = r#"
    id, code_couturier, password_hash, nom, prenom, email, telephone,
    role, salon_id, actif, date_creation, derniere_connexion
"#;

// Dados de um couturier novo, com a senha já em hash
pub struct NewCouturier<'a> {
    pub code_couturier: &'a str,
    pub password_hash: &'a str,
    pub nom: &'a str,
    pub prenom: &'a str,
    pub email: Option<&'a str>,
    pub telephone: Option<&'a str>,
    pub role: Role,
    pub salon_id: Option<&'a str>,
}

// O repositório de couturiers, responsável pela tabela 'couturiers'
#[derive(Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_by_code(&self, code: &str) -> Result<Option<Couturier>, AppError> {
        let sql = format!("SELECT {COLUMNS} FROM couturiers WHERE code_couturier = $1");
        let user = sqlx::query_as::<_, Couturier>(&sql)
            .bind(code)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    pub async fn find_by_id<'e, E>(&self, executor: E, id: Uuid) -> Result<Option<Couturier>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!("SELECT {COLUMNS} FROM couturiers WHERE id = $1");
        let user = sqlx::query_as::<_, Couturier>(&sql)
            .bind(id)
            .fetch_optional(executor)
            .await?;
        Ok(user)
    }

    // Usa o pool direto; chamado a cada requisição pelo middleware
    pub async fn find_for_session(&self, id: Uuid) -> Result<Option<Couturier>, AppError> {
        let sql = format!("SELECT {COLUMNS} FROM couturiers WHERE id = $1");
        let user = sqlx::query_as::<_, Couturier>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    // Cria um novo couturier.
    // Código duplicado vira UniqueConstraintViolation("couturiers_code_couturier_key").
    pub async fn create_user<'e, E>(&self, executor: E, new: NewCouturier<'_>) -> Result<Couturier, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            r#"
            INSERT INTO couturiers (
                code_couturier, password_hash, nom, prenom, email, telephone, role, salon_id
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {COLUMNS}
            "#
        );

        sqlx::query_as::<_, Couturier>(&sql)
            .bind(new.code_couturier)
            .bind(new.password_hash)
            .bind(new.nom)
            .bind(new.prenom)
            .bind(new.email)
            .bind(new.telephone)
            .bind(new.role)
            .bind(new.salon_id)
            .fetch_one(executor)
            .await
            .map_err(AppError::from_db)
    }

    pub async fn list_by_salon<'e, E>(&self, executor: E, salon_id: &str) -> Result<Vec<Couturier>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            "SELECT {COLUMNS} FROM couturiers WHERE salon_id = $1 ORDER BY role, nom, prenom"
        );
        let users = sqlx::query_as::<_, Couturier>(&sql)
            .bind(salon_id)
            .fetch_all(executor)
            .await?;
        Ok(users)
    }

    pub async fn set_active<'e, E>(&self, executor: E, id: Uuid, actif: bool) -> Result<Couturier, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!("UPDATE couturiers SET actif = $2 WHERE id = $1 RETURNING {COLUMNS}");
        sqlx::query_as::<_, Couturier>(&sql)
            .bind(id)
            .bind(actif)
            .fetch_optional(executor)
            .await?
            .ok_or(AppError::UserNotFound)
    }

    pub async fn update_password<'e, E>(&self, executor: E, id: Uuid, password_hash: &str) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query("UPDATE couturiers SET password_hash = $2 WHERE id = $1")
            .bind(id)
            .bind(password_hash)
            .execute(executor)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::UserNotFound);
        }
        Ok(())
    }

    pub async fn touch_last_login(&self, id: Uuid) -> Result<(), AppError> {
        sqlx::query("UPDATE couturiers SET derniere_connexion = NOW() WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    // Quem ainda é autor de commandes ou histórico não pode ser apagado (FK -> Conflict).
    // Referências de validação admin viram NULL pelo próprio esquema.
    pub async fn delete<'e, E>(&self, executor: E, id: Uuid) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query("DELETE FROM couturiers WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await
            .map_err(AppError::from_db)?;

        if result.rows_affected() == 0 {
            return Err(AppError::UserNotFound);
        }
        Ok(())
    }
}
