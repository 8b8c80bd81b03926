// src/services/approval_service.rs

use sqlx::{Acquire, Executor, PgConnection, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{HistoryRepository, OrderRepository},
    models::{
        auth::Couturier,
        history::{
            DecisionOutcome, HistoryAction, HistoryEntry, NewHistoryEntry, PendingFilter, PendingValidation,
            ValidationStatus,
        },
        order::{status, Order},
    },
    services::{access, order_service::OrderService},
};

#[derive(Clone)]
pub struct ApprovalService {
    history_repo: HistoryRepository,
    order_repo: OrderRepository,
    order_service: OrderService,
}

impl ApprovalService {
    pub fn new(history_repo: HistoryRepository, order_repo: OrderRepository, order_service: OrderService) -> Self {
        Self { history_repo, order_repo, order_service }
    }

    pub async fn list_pending(
        &self,
        actor: &Couturier,
        scope: Option<&str>,
        filter: &PendingFilter,
    ) -> Result<Vec<PendingValidation>, AppError> {
        access::ensure_admin(actor)?;
        let scope = access::resolve_scope(actor, scope)?;
        self.history_repo.list_pending(scope.as_deref(), filter).await
    }

    /// Valida a entrada e aplica o efeito adiado, com a commande travada.
    pub async fn approve<'e, E>(
        &self,
        executor: E,
        actor: &Couturier,
        entry_id: Uuid,
        commentaire: Option<&str>,
    ) -> Result<DecisionOutcome, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        access::ensure_admin(actor)?;

        let mut tx = executor.begin().await?;
        let pending = self.load(&mut *tx, entry_id).await?;
        let order = self.lock_order(&mut *tx, actor, &pending).await?;

        let entry = self
            .history_repo
            .decide(&mut *tx, entry_id, ValidationStatus::Validee, actor.id, commentaire)
            .await?
            .ok_or(AppError::AlreadyDecided(entry_id))?;

        // Se o efeito falhar (saldo em aberto, pagamentos pendentes) a decisão é desfeita
        let order = self
            .order_service
            .apply_effect(&mut *tx, &order, entry.type_action, entry.statut_apres.as_deref())
            .await?;

        tx.commit().await?;

        tracing::info!(
            entree = %entry_id,
            action = ?entry.type_action,
            commande = %order.id,
            admin = %actor.code_couturier,
            "entrée validée"
        );
        Ok(DecisionOutcome { entry, order, correction: None })
    }

    /// Rejeita a entrada. Um pagamento rejeitado é estornado por uma entrada
    /// de correção com montante negativo.
    pub async fn reject<'e, E>(
        &self,
        executor: E,
        actor: &Couturier,
        entry_id: Uuid,
        motif: &str,
    ) -> Result<DecisionOutcome, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        access::ensure_admin(actor)?;

        let mut tx = executor.begin().await?;
        let pending = self.load(&mut *tx, entry_id).await?;
        let order = self.lock_order(&mut *tx, actor, &pending).await?;

        if pending.is_pending() && pending.type_action == HistoryAction::Paiement && order.is_closed() {
            return Err(AppError::Conflict(format!("commande {} fermée", order.id)));
        }

        let entry = self
            .history_repo
            .decide(&mut *tx, entry_id, ValidationStatus::Rejetee, actor.id, Some(motif))
            .await?
            .ok_or(AppError::AlreadyDecided(entry_id))?;

        if entry.type_action != HistoryAction::Paiement {
            tx.commit().await?;
            tracing::info!(entree = %entry_id, action = ?entry.type_action, "entrée rejetée");
            return Ok(DecisionOutcome { entry, order, correction: None });
        }

        let balance = order.balance().reverse_payment(entry.montant_paye)?;

        // O pagamento tinha levado a commande a "Terminé": volta ao status anterior
        let moved_by_payment = entry.statut_apres.as_deref() == Some(status::TERMINE)
            && entry.statut_avant.as_deref() != Some(status::TERMINE)
            && order.statut == status::TERMINE;
        let statut = match (moved_by_payment, entry.statut_avant.as_deref()) {
            (true, Some(avant)) => avant,
            _ => order.statut.as_str(),
        };

        let updated = self
            .order_repo
            .update_state(&mut *tx, order.id, &balance, statut, false)
            .await?;

        let correction = NewHistoryEntry::by(actor.id, actor.role, order.id, HistoryAction::Correction)
            .amounts(-entry.montant_paye, balance.reste)
            .statuses(Some(&order.statut), Some(statut))
            .comment(Some(format!("Annulation du paiement {entry_id}: {motif}")));
        let correction = self.history_repo.append(&mut *tx, &correction).await?;

        tx.commit().await?;

        tracing::info!(
            entree = %entry_id,
            commande = %order.id,
            montant = %entry.montant_paye,
            reste = %balance.reste,
            "paiement rejeté et corrigé"
        );
        Ok(DecisionOutcome { entry, order: updated, correction: Some(correction) })
    }

    async fn load(&self, conn: &mut PgConnection, entry_id: Uuid) -> Result<HistoryEntry, AppError> {
        self.history_repo
            .find(&mut *conn, entry_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("entrée {entry_id}")))
    }

    async fn lock_order(
        &self,
        conn: &mut PgConnection,
        actor: &Couturier,
        entry: &HistoryEntry,
    ) -> Result<Order, AppError> {
        let order = self
            .order_repo
            .lock(&mut *conn, entry.commande_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("commande {}", entry.commande_id)))?;
        access::ensure_salon_access(actor, &order.salon_id)?;
        Ok(order)
    }
}
