// src/services/user_service.rs

use sqlx::{Acquire, Executor, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{user_repo::NewCouturier, SalonRepository, UserRepository},
    models::auth::{Couturier, CreateUserPayload, Role},
    services::{access, auth::hash_password},
};

#[derive(Clone)]
pub struct UserService {
    user_repo: UserRepository,
    salon_repo: SalonRepository,
}

impl UserService {
    pub fn new(user_repo: UserRepository, salon_repo: SalonRepository) -> Self {
        Self { user_repo, salon_repo }
    }

    pub async fn create_user<'e, E>(
        &self,
        executor: E,
        actor: &Couturier,
        payload: &CreateUserPayload,
    ) -> Result<Couturier, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        access::ensure_admin(actor)?;
        if payload.role == Role::SuperAdmin {
            return Err(AppError::Forbidden("création d'un super administrateur".into()));
        }

        // O admin cria no próprio salon; o super_admin precisa dizer qual
        let salon_id = match (actor.is_super_admin(), payload.salon_id.as_deref()) {
            (true, Some(salon_id)) => salon_id.to_string(),
            (true, None) => return Err(AppError::InvalidInput("salon_id obligatoire".into())),
            (false, requested) => {
                let own = access::actor_salon(actor)?;
                if let Some(other) = requested.filter(|r| *r != own) {
                    return Err(AppError::Forbidden(format!("salon {other}")));
                }
                own.to_string()
            }
        };

        let password_hash = hash_password(&payload.password).await?;

        let mut tx = executor.begin().await?;

        self.salon_repo
            .find_by_id(&mut *tx, &salon_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("salon {salon_id}")))?;

        let user = self
            .user_repo
            .create_user(
                &mut *tx,
                NewCouturier {
                    code_couturier: payload.code_couturier.trim(),
                    password_hash: &password_hash,
                    nom: payload.nom.trim(),
                    prenom: payload.prenom.trim(),
                    email: payload.email.as_deref(),
                    telephone: payload.telephone.as_deref(),
                    role: payload.role,
                    salon_id: Some(&salon_id),
                },
            )
            .await?;

        tx.commit().await?;

        tracing::info!(code = %user.code_couturier, salon = %salon_id, role = ?user.role, "couturier créé");
        Ok(user)
    }

    pub async fn list_users<'e, E>(&self, executor: E, actor: &Couturier, salon_id: &str) -> Result<Vec<Couturier>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        access::ensure_salon_access(actor, salon_id)?;
        self.user_repo.list_by_salon(executor, salon_id).await
    }

    pub async fn set_active<'e, E>(
        &self,
        executor: E,
        actor: &Couturier,
        user_id: Uuid,
        actif: bool,
    ) -> Result<Couturier, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        if actor.id == user_id && !actif {
            return Err(AppError::InvalidInput("impossible de désactiver son propre compte".into()));
        }

        let mut tx = executor.begin().await?;
        let target = self.load(&mut *tx, user_id).await?;
        access::ensure_can_manage(actor, &target)?;

        let user = self.user_repo.set_active(&mut *tx, user_id, actif).await?;
        tx.commit().await?;
        Ok(user)
    }

    /// O próprio usuário ou quem administra a conta.
    pub async fn change_password<'e, E>(
        &self,
        executor: E,
        actor: &Couturier,
        user_id: Uuid,
        new_password: &str,
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let password_hash = hash_password(new_password).await?;

        let mut tx = executor.begin().await?;
        if actor.id != user_id {
            let target = self.load(&mut *tx, user_id).await?;
            access::ensure_can_manage(actor, &target)?;
        }

        self.user_repo.update_password(&mut *tx, user_id, &password_hash).await?;
        tx.commit().await?;
        Ok(())
    }

    pub async fn delete_user<'e, E>(&self, executor: E, actor: &Couturier, user_id: Uuid) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        if actor.id == user_id {
            return Err(AppError::InvalidInput("impossible de supprimer son propre compte".into()));
        }

        let mut tx = executor.begin().await?;
        let target = self.load(&mut *tx, user_id).await?;
        access::ensure_can_manage(actor, &target)?;

        self.user_repo.delete(&mut *tx, user_id).await?;
        tx.commit().await?;

        tracing::info!(code = %target.code_couturier, "couturier supprimé");
        Ok(())
    }

    /// Cria o super_admin na inicialização, se ainda não existir.
    pub async fn ensure_super_admin<'e, E>(
        &self,
        executor: E,
        code: &str,
        password: &str,
    ) -> Result<Option<Couturier>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        if self.user_repo.find_by_code(code).await?.is_some() {
            return Ok(None);
        }

        let password_hash = hash_password(password).await?;
        let created = self
            .user_repo
            .create_user(
                executor,
                NewCouturier {
                    code_couturier: code,
                    password_hash: &password_hash,
                    nom: "Administrateur",
                    prenom: "Super",
                    email: None,
                    telephone: None,
                    role: Role::SuperAdmin,
                    salon_id: None,
                },
            )
            .await;

        match created {
            Ok(user) => {
                tracing::info!(code = %user.code_couturier, "super administrateur créé");
                Ok(Some(user))
            }
            // Outra instância criou no meio tempo
            Err(AppError::UniqueConstraintViolation(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn load<'e, E>(&self, executor: E, user_id: Uuid) -> Result<Couturier, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.user_repo
            .find_by_id(executor, user_id)
            .await?
            .ok_or(AppError::UserNotFound)
    }
}
