// src/services/salon_service.rs

use sqlx::{Executor, PgPool, Postgres};

use crate::{
    common::error::AppError,
    db::{user_repo::NewCouturier, SalonRepository, UserRepository},
    models::{
        auth::{Couturier, Role},
        salon::{next_salon_id, CreateSalonPayload, Salon, SalonCreated, UpdateSalonPayload},
    },
    services::{access, auth::hash_password},
};

const MAX_ID_ATTEMPTS: u32 = 5;
const SALON_PKEY: &str = "salons_pkey";

#[derive(Clone)]
pub struct SalonService {
    salon_repo: SalonRepository,
    user_repo: UserRepository,
    pool: PgPool,
    id_prefix: String,
}

impl SalonService {
    pub fn new(salon_repo: SalonRepository, user_repo: UserRepository, pool: PgPool, id_prefix: String) -> Self {
        Self { salon_repo, user_repo, pool, id_prefix }
    }

    pub async fn preview_next_id<'e, E>(&self, executor: E) -> Result<String, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let ids = self.salon_repo.ids_with_prefix(executor, &self.id_prefix).await?;
        Ok(next_salon_id(&self.id_prefix, ids.iter().map(String::as_str)))
    }

    /// Cria o salon e o seu admin numa transação só.
    ///
    /// O id é `max + 1` lido dentro da transação; se outra criação ganhar a
    /// corrida pela mesma chave primária, a tentativa é refeita do zero.
    pub async fn create_salon_with_admin(
        &self,
        actor: &Couturier,
        payload: &CreateSalonPayload,
    ) -> Result<SalonCreated, AppError> {
        access::ensure_super_admin(actor)?;

        let password_hash = hash_password(&payload.admin.password).await?;

        for attempt in 1..=MAX_ID_ATTEMPTS {
            match self.try_create(payload, &password_hash).await {
                Err(AppError::UniqueConstraintViolation(constraint)) if constraint == SALON_PKEY => {
                    tracing::warn!(attempt, "colisão de salon_id, nova tentativa");
                }
                other => return other,
            }
        }

        Err(AppError::Conflict("salon_id".into()))
    }

    async fn try_create(&self, payload: &CreateSalonPayload, password_hash: &str) -> Result<SalonCreated, AppError> {
        let mut tx = self.pool.begin().await?;

        let ids = self.salon_repo.ids_with_prefix(&mut *tx, &self.id_prefix).await?;
        let salon_id = next_salon_id(&self.id_prefix, ids.iter().map(String::as_str));

        self.salon_repo.insert(&mut *tx, &salon_id, payload).await?;

        let admin = &payload.admin;
        let admin = self
            .user_repo
            .create_user(
                &mut *tx,
                NewCouturier {
                    code_couturier: admin.code_couturier.trim(),
                    password_hash,
                    nom: admin.nom.trim(),
                    prenom: admin.prenom.trim(),
                    email: admin.email.as_deref(),
                    telephone: admin.telephone.as_deref(),
                    role: Role::Admin,
                    salon_id: Some(&salon_id),
                },
            )
            .await?;

        let salon = self.salon_repo.set_admin(&mut *tx, &salon_id, admin.id).await?;

        tx.commit().await?;

        tracing::info!(salon = %salon.salon_id, admin = %admin.code_couturier, "salon créé");
        Ok(SalonCreated { salon, admin })
    }

    pub async fn get_salon<'e, E>(&self, executor: E, actor: &Couturier, salon_id: &str) -> Result<Salon, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        access::ensure_salon_access(actor, salon_id)?;
        self.salon_repo
            .find_by_id(executor, salon_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("salon {salon_id}")))
    }

    /// O super_admin vê todos; os demais só o próprio salon.
    pub async fn list_salons<'e, E>(&self, executor: E, actor: &Couturier) -> Result<Vec<Salon>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let only = match actor.is_super_admin() {
            true => None,
            false => Some(access::actor_salon(actor)?),
        };
        self.salon_repo.list(executor, only).await
    }

    pub async fn update_salon<'e, E>(
        &self,
        executor: E,
        actor: &Couturier,
        salon_id: &str,
        payload: &UpdateSalonPayload,
    ) -> Result<Salon, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        access::ensure_salon_admin(actor, salon_id)?;
        self.salon_repo.update(executor, salon_id, payload).await
    }

    pub async fn deactivate_salon<'e, E>(&self, executor: E, actor: &Couturier, salon_id: &str) -> Result<Salon, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        access::ensure_super_admin(actor)?;
        let salon = self.salon_repo.set_active(executor, salon_id, false).await?;
        tracing::info!(salon = %salon.salon_id, "salon désactivé");
        Ok(salon)
    }
}
