// src/services/order_service.rs

use rust_decimal::Decimal;
use sqlx::{Acquire, Executor, PgConnection, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{ClientRepository, HistoryRepository, OrderRepository},
    models::{
        auth::Couturier,
        history::{HistoryAction, HistoryEntry, NewHistoryEntry, ValidationStatus},
        measurements,
        order::{
            status, Balance, ClosureOutcome, CreateOrderPayload, NewOrder, Order, OrderFile, OrderFilter,
            OrderImageKind, OrderUpdate,
        },
        storage::StoredFile,
    },
    services::{access, image_optimizer::optimize_image},
};

#[derive(Clone)]
pub struct OrderService {
    repo: OrderRepository,
    history_repo: HistoryRepository,
    client_repo: ClientRepository,
}

impl OrderService {
    pub fn new(repo: OrderRepository, history_repo: HistoryRepository, client_repo: ClientRepository) -> Self {
        Self { repo, history_repo, client_repo }
    }

    // =========================================================================
    //  CRIAÇÃO
    // =========================================================================

    pub async fn create_order<'e, E>(
        &self,
        executor: E,
        actor: &Couturier,
        payload: &CreateOrderPayload,
    ) -> Result<Order, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let salon_id = access::actor_salon(actor)?.to_string();
        let balance = Balance::new(payload.prix_total, payload.avance)?;
        let modele = payload.modele.trim();
        measurements::validate(&payload.categorie, &payload.sexe, modele, &payload.mesures)?;

        let client = self
            .client_repo
            .find_by_id(payload.client_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("client {}", payload.client_id)))?;
        if client.salon_id != salon_id {
            return Err(AppError::Forbidden(format!("client {}", client.id)));
        }

        let reference = |path: &Option<String>| {
            path.as_deref()
                .map(str::trim)
                .filter(|p| !p.is_empty())
                .map(|p| (StoredFile::Reference(p.to_string()), None))
        };

        let new_order = NewOrder {
            client_id: client.id,
            couturier_id: actor.id,
            salon_id,
            categorie: payload.categorie.clone(),
            sexe: payload.sexe.clone(),
            modele: modele.to_string(),
            mesures: payload.mesures.clone(),
            balance,
            date_livraison: payload.date_livraison,
            model_type: payload.model_type.clone(),
            fabric_image: reference(&payload.fabric_image_path),
            model_image: reference(&payload.model_image_path),
        };

        let mut tx = executor.begin().await?;

        let order = self.repo.insert(&mut *tx, &new_order).await?;

        // A criação abre o histórico com a avance inicial
        let entry = NewHistoryEntry::by(actor.id, actor.role, order.id, HistoryAction::Creation)
            .amounts(order.avance, order.reste)
            .statuses(None, Some(&order.statut));
        self.history_repo.append(&mut *tx, &entry).await?;

        tx.commit().await?;

        tracing::info!(
            commande = %order.id,
            salon = %order.salon_id,
            prix_total = %order.prix_total,
            avance = %order.avance,
            "commande créée"
        );
        Ok(order)
    }

    // =========================================================================
    //  PAGAMENTO
    // =========================================================================

    /// Aplica o pagamento na hora e registra a entrada; a entrada de um
    /// employe fica pendente de validação.
    pub async fn record_payment<'e, E>(
        &self,
        executor: E,
        actor: &Couturier,
        order_id: Uuid,
        amount: Decimal,
        commentaire: Option<String>,
    ) -> Result<OrderUpdate, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;
        let order = self.lock_accessible(&mut *tx, actor, order_id).await?;

        if order.is_closed() {
            return Err(AppError::Conflict(format!("commande {order_id} fermée")));
        }

        let balance = order.balance().apply_payment(amount)?;
        let statut_apres = match balance.is_settled() && order.statut == status::EN_COURS {
            true => status::TERMINE,
            false => order.statut.as_str(),
        };

        let updated = self
            .repo
            .update_state(&mut *tx, order_id, &balance, statut_apres, true)
            .await?;

        let entry = NewHistoryEntry::by(actor.id, actor.role, order_id, HistoryAction::Paiement)
            .amounts(amount, balance.reste)
            .statuses(Some(&order.statut), Some(statut_apres))
            .comment(commentaire);
        let entry = self.history_repo.append(&mut *tx, &entry).await?;

        tx.commit().await?;

        tracing::info!(
            commande = %order_id,
            montant = %amount,
            reste = %balance.reste,
            validation = ?entry.statut_validation,
            "paiement enregistré"
        );
        Ok(OrderUpdate { order: updated, entry })
    }

    // =========================================================================
    //  FECHAMENTO E STATUS
    // =========================================================================

    pub async fn close_order<'e, E>(
        &self,
        executor: E,
        actor: &Couturier,
        order_id: Uuid,
        commentaire: Option<String>,
    ) -> Result<ClosureOutcome, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;
        let order = self.lock_accessible(&mut *tx, actor, order_id).await?;

        if order.is_closed() {
            return Err(AppError::Conflict(format!("commande {order_id} déjà fermée")));
        }
        if !order.balance().is_settled() {
            return Err(AppError::NotFullyPaid { reste: order.reste });
        }

        if let Some(pending) = self
            .history_repo
            .find_pending(&mut *tx, order_id, HistoryAction::FermetureDemande)
            .await?
        {
            if !actor.role.can_approve() {
                tx.commit().await?;
                return Ok(ClosureOutcome { order, entry: pending, created: false });
            }

            // Fechamento pelo admin valida o pedido pendente na mesma transação
            let order = self
                .apply_effect(&mut *tx, &order, pending.type_action, pending.statut_apres.as_deref())
                .await?;
            let entry = self
                .history_repo
                .decide(&mut *tx, pending.id, ValidationStatus::Validee, actor.id, commentaire.as_deref())
                .await?
                .ok_or(AppError::AlreadyDecided(pending.id))?;
            tx.commit().await?;

            tracing::info!(commande = %order_id, entree = %entry.id, "demande de fermeture validée");
            return Ok(ClosureOutcome { order, entry, created: false });
        }

        let entry = NewHistoryEntry::by(actor.id, actor.role, order_id, HistoryAction::FermetureDemande)
            .amounts(Decimal::ZERO, order.reste)
            .statuses(Some(&order.statut), Some(status::LIVRE_ET_PAYE))
            .comment(commentaire);

        let order = match entry.is_auto_approved() {
            true => {
                self.apply_effect(&mut *tx, &order, entry.type_action, entry.statut_apres.as_deref())
                    .await?
            }
            false => order,
        };
        let entry = self.history_repo.append(&mut *tx, &entry).await?;

        tx.commit().await?;

        tracing::info!(commande = %order_id, validation = ?entry.statut_validation, "demande de fermeture");
        Ok(ClosureOutcome { order, entry, created: true })
    }

    pub async fn update_status<'e, E>(
        &self,
        executor: E,
        actor: &Couturier,
        order_id: Uuid,
        new_status: &str,
        commentaire: Option<String>,
    ) -> Result<OrderUpdate, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let new_status = new_status.trim();
        if new_status.is_empty() {
            return Err(AppError::InvalidInput("statut vide".into()));
        }

        let mut tx = executor.begin().await?;
        let order = self.lock_accessible(&mut *tx, actor, order_id).await?;

        if order.statut == new_status {
            return Err(AppError::InvalidInput(format!("statut déjà '{new_status}'")));
        }
        if status::is_terminal(new_status) && !order.balance().is_settled() {
            return Err(AppError::NotFullyPaid { reste: order.reste });
        }

        let entry = NewHistoryEntry::by(actor.id, actor.role, order_id, HistoryAction::ChangementStatut)
            .amounts(Decimal::ZERO, order.reste)
            .statuses(Some(&order.statut), Some(new_status))
            .comment(commentaire);

        let updated = match entry.is_auto_approved() {
            true => {
                self.apply_effect(&mut *tx, &order, entry.type_action, entry.statut_apres.as_deref())
                    .await?
            }
            false => order,
        };
        let entry = self.history_repo.append(&mut *tx, &entry).await?;

        tx.commit().await?;

        tracing::info!(
            commande = %order_id,
            statut = %new_status,
            validation = ?entry.statut_validation,
            "changement de statut"
        );
        Ok(OrderUpdate { order: updated, entry })
    }

    /// Altera o preço total. Só admin; aprovado na hora.
    pub async fn adjust_price<'e, E>(
        &self,
        executor: E,
        actor: &Couturier,
        order_id: Uuid,
        new_total: Decimal,
        commentaire: Option<String>,
    ) -> Result<OrderUpdate, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        access::ensure_admin(actor)?;

        let mut tx = executor.begin().await?;
        let order = self.lock_accessible(&mut *tx, actor, order_id).await?;

        if order.is_closed() {
            return Err(AppError::Conflict(format!("commande {order_id} fermée")));
        }

        let balance = order.balance().reprice(new_total)?;
        let updated = self
            .repo
            .update_state(&mut *tx, order_id, &balance, &order.statut, false)
            .await?;

        let commentaire = commentaire
            .filter(|c| !c.trim().is_empty())
            .unwrap_or_else(|| format!("{} -> {}", order.prix_total, new_total));
        let entry = NewHistoryEntry::by(actor.id, actor.role, order_id, HistoryAction::ModificationPrix)
            .amounts(Decimal::ZERO, balance.reste)
            .statuses(Some(&order.statut), Some(&order.statut))
            .comment(Some(commentaire));
        let entry = self.history_repo.append(&mut *tx, &entry).await?;

        tx.commit().await?;

        tracing::info!(commande = %order_id, ancien = %order.prix_total, nouveau = %new_total, "prix modifié");
        Ok(OrderUpdate { order: updated, entry })
    }

    /// Efeito adiado de uma entrada aprovada, sobre a commande já travada.
    pub(crate) async fn apply_effect(
        &self,
        conn: &mut PgConnection,
        order: &Order,
        action: HistoryAction,
        statut_apres: Option<&str>,
    ) -> Result<Order, AppError> {
        let target = match action {
            HistoryAction::FermetureDemande => status::LIVRE_ET_PAYE,
            HistoryAction::ChangementStatut => match statut_apres {
                Some(target) => target,
                None => return Ok(order.clone()),
            },
            HistoryAction::Creation
            | HistoryAction::Paiement
            | HistoryAction::ModificationPrix
            | HistoryAction::Correction => return Ok(order.clone()),
        };

        if status::is_terminal(target) {
            if !order.balance().is_settled() {
                return Err(AppError::NotFullyPaid { reste: order.reste });
            }
            let pending = self
                .history_repo
                .count_pending(&mut *conn, order.id, HistoryAction::Paiement)
                .await?;
            if pending > 0 {
                return Err(AppError::Conflict(format!(
                    "{pending} paiement(s) en attente de validation"
                )));
            }
        }

        self.repo
            .update_state(&mut *conn, order.id, &order.balance(), target, false)
            .await
    }

    // =========================================================================
    //  LEITURA
    // =========================================================================

    pub async fn get_order<'e, E>(&self, executor: E, actor: &Couturier, order_id: Uuid) -> Result<Order, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let order = self
            .repo
            .find_by_id(executor, order_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("commande {order_id}")))?;
        access::ensure_salon_access(actor, &order.salon_id)?;
        Ok(order)
    }

    pub async fn list_orders(
        &self,
        actor: &Couturier,
        scope: Option<&str>,
        filter: &OrderFilter,
    ) -> Result<Vec<Order>, AppError> {
        let scope = access::resolve_scope(actor, scope)?;
        self.repo.list(scope.as_deref(), filter).await
    }

    pub async fn orders_with_balance(&self, actor: &Couturier, scope: Option<&str>) -> Result<Vec<Order>, AppError> {
        let scope = access::resolve_scope(actor, scope)?;
        self.repo.list_outstanding(scope.as_deref()).await
    }

    pub async fn order_history<'e, E>(
        &self,
        executor: E,
        actor: &Couturier,
        order_id: Uuid,
    ) -> Result<Vec<HistoryEntry>, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;
        self.get_order(&mut *tx, actor, order_id).await?;
        let entries = self.history_repo.list_for_order(&mut *tx, order_id).await?;
        tx.commit().await?;
        Ok(entries)
    }

    // =========================================================================
    //  ARQUIVOS
    // =========================================================================

    pub async fn attach_image<'e, E>(
        &self,
        executor: E,
        actor: &Couturier,
        order_id: Uuid,
        kind: OrderImageKind,
        file: StoredFile,
        name: Option<&str>,
    ) -> Result<Order, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        if file.is_empty() {
            return Err(AppError::InvalidInput("image vide".into()));
        }
        self.get_order(executor, actor, order_id).await?;

        // Conteúdo inline é reduzido antes de ir para o banco
        let file = match file {
            StoredFile::Inline(bytes) => {
                let bytes = tokio::task::spawn_blocking(move || optimize_image(&bytes).unwrap_or(bytes))
                    .await
                    .map_err(|e| anyhow::anyhow!("Falha na task de imagem: {}", e))?;
                StoredFile::Inline(bytes)
            }
            reference => reference,
        };
        self.repo.set_image(order_id, kind, file, name).await
    }

    pub async fn get_image<'e, E>(
        &self,
        executor: E,
        actor: &Couturier,
        order_id: Uuid,
        kind: OrderImageKind,
    ) -> Result<OrderFile, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.get_order(executor, actor, order_id).await?;
        self.repo
            .get_image(order_id, kind)
            .await?
            .ok_or_else(|| AppError::not_found(format!("image de la commande {order_id}")))
    }

    async fn lock_accessible(
        &self,
        conn: &mut PgConnection,
        actor: &Couturier,
        order_id: Uuid,
    ) -> Result<Order, AppError> {
        let order = self
            .repo
            .lock(&mut *conn, order_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("commande {order_id}")))?;
        access::ensure_salon_access(actor, &order.salon_id)?;
        Ok(order)
    }
}
