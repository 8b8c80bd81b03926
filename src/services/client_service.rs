// src/services/client_service.rs

use sqlx::{Acquire, Executor, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::ClientRepository,
    models::{
        auth::Couturier,
        client::{Client, ClientCreated, CreateClientPayload},
    },
    services::access,
};

#[derive(Clone)]
pub struct ClientService {
    repo: ClientRepository,
}

impl ClientService {
    pub fn new(repo: ClientRepository) -> Self {
        Self { repo }
    }

    /// Reaproveita o cliente do salon com o mesmo telefone, se houver.
    pub async fn create_client<'e, E>(
        &self,
        executor: E,
        actor: &Couturier,
        payload: &CreateClientPayload,
    ) -> Result<ClientCreated, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        // O cliente pertence ao salon de quem o cadastra
        let salon_id = access::actor_salon(actor)?;
        let telephone = payload.telephone.trim();

        let mut tx = executor.begin().await?;

        if let Some(client) = self.repo.find_by_phone(&mut *tx, salon_id, telephone).await? {
            tx.commit().await?;
            return Ok(ClientCreated { client, created: false });
        }

        let client = self.repo.insert(&mut *tx, salon_id, actor.id, payload).await?;
        tx.commit().await?;

        tracing::info!(client = %client.id, salon = %salon_id, "client créé");
        Ok(ClientCreated { client, created: true })
    }

    pub async fn get_client(&self, actor: &Couturier, id: Uuid) -> Result<Client, AppError> {
        let client = self
            .repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("client {id}")))?;
        access::ensure_salon_access(actor, &client.salon_id)?;
        Ok(client)
    }

    pub async fn list_clients(
        &self,
        actor: &Couturier,
        salon_id: &str,
        search: Option<&str>,
    ) -> Result<Vec<Client>, AppError> {
        access::ensure_salon_access(actor, salon_id)?;
        self.repo.list(salon_id, search).await
    }
}
