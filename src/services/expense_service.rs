// src/services/expense_service.rs

use sqlx::{Acquire, Executor, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{ExpenseRepository, OrderRepository, UserRepository},
    models::{
        auth::Couturier,
        expense::{
            next_reference, CreateExpensePayload, Expense, ExpenseDocument, ExpenseDocumentContent, ExpenseFilter,
            ExpenseRecorded, ExpenseTotal, NewExpenseDocument,
        },
        order::ensure_money,
    },
    services::access,
};

#[derive(Clone)]
pub struct ExpenseService {
    repo: ExpenseRepository,
    order_repo: OrderRepository,
    user_repo: UserRepository,
}

impl ExpenseService {
    pub fn new(repo: ExpenseRepository, order_repo: OrderRepository, user_repo: UserRepository) -> Self {
        Self { repo, order_repo, user_repo }
    }

    /// Lança uma charge. A referência é só indicativa: repetida, a charge é
    /// gravada mesmo assim e a resposta sinaliza a colisão.
    pub async fn record_expense<'e, E>(
        &self,
        executor: E,
        actor: &Couturier,
        salon_id: &str,
        payload: &CreateExpensePayload,
    ) -> Result<ExpenseRecorded, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        access::ensure_salon_access(actor, salon_id)?;
        ensure_money("montant", payload.montant)?;
        payload.type_charge.check_links(payload.commande_id, payload.employe_id)?;

        let mut tx = executor.begin().await?;

        if let Some(commande_id) = payload.commande_id {
            let order = self
                .order_repo
                .find_by_id(&mut *tx, commande_id)
                .await?
                .ok_or_else(|| AppError::not_found(format!("commande {commande_id}")))?;
            if order.salon_id != salon_id {
                return Err(AppError::Forbidden(format!("commande {commande_id}")));
            }
        }

        if let Some(employe_id) = payload.employe_id {
            let employe = self
                .user_repo
                .find_by_id(&mut *tx, employe_id)
                .await?
                .ok_or_else(|| AppError::not_found(format!("couturier {employe_id}")))?;
            if employe.salon_id.as_deref() != Some(salon_id) {
                return Err(AppError::Forbidden(format!("couturier {employe_id}")));
            }
        }

        let (reference, reference_collision) =
            match payload.reference.as_deref().map(str::trim).filter(|r| !r.is_empty()) {
                Some(reference) => {
                    let taken = self.repo.reference_exists(&mut *tx, salon_id, reference).await?;
                    (reference.to_string(), taken)
                }
                None => {
                    let existing = self.repo.references(&mut *tx, salon_id).await?;
                    (next_reference(existing.iter().map(String::as_str)), false)
                }
            };

        if reference_collision {
            tracing::warn!(salon = %salon_id, reference = %reference, "référence de charge déjà utilisée");
        }

        let expense = self.repo.insert(&mut *tx, salon_id, actor.id, payload, &reference).await?;
        tx.commit().await?;

        tracing::info!(
            charge = %expense.id,
            salon = %salon_id,
            type_charge = ?expense.type_charge,
            montant = %expense.montant,
            "charge enregistrée"
        );
        Ok(ExpenseRecorded { expense, reference_collision })
    }

    pub async fn list_expenses(
        &self,
        actor: &Couturier,
        scope: Option<&str>,
        filter: &ExpenseFilter,
    ) -> Result<Vec<Expense>, AppError> {
        let scope = access::resolve_scope(actor, scope)?;
        self.repo.list(scope.as_deref(), filter).await
    }

    pub async fn total_expenses(
        &self,
        actor: &Couturier,
        scope: Option<&str>,
        filter: &ExpenseFilter,
    ) -> Result<ExpenseTotal, AppError> {
        let scope = access::resolve_scope(actor, scope)?;
        self.repo.total(scope.as_deref(), filter).await
    }

    pub async fn preview_next_reference<'e, E>(
        &self,
        executor: E,
        actor: &Couturier,
        salon_id: &str,
    ) -> Result<String, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        access::ensure_salon_access(actor, salon_id)?;
        let existing = self.repo.references(executor, salon_id).await?;
        Ok(next_reference(existing.iter().map(String::as_str)))
    }

    pub async fn attach_document(
        &self,
        actor: &Couturier,
        charge_id: Uuid,
        doc: NewExpenseDocument,
    ) -> Result<ExpenseDocument, AppError> {
        doc.validate()?;
        self.load(actor, charge_id).await?;

        let document = self.repo.insert_document(charge_id, actor.id, doc).await?;
        tracing::info!(charge = %charge_id, document = %document.id, inline = document.stored_inline, "justificatif ajouté");
        Ok(document)
    }

    pub async fn list_documents(&self, actor: &Couturier, charge_id: Uuid) -> Result<Vec<ExpenseDocument>, AppError> {
        self.load(actor, charge_id).await?;
        self.repo.list_documents(charge_id).await
    }

    pub async fn get_document(&self, actor: &Couturier, document_id: Uuid) -> Result<ExpenseDocumentContent, AppError> {
        let content = self
            .repo
            .get_document(document_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("document {document_id}")))?;
        // O salon vem da charge dona do documento
        self.load(actor, content.meta.charge_id).await?;
        Ok(content)
    }

    async fn load(&self, actor: &Couturier, charge_id: Uuid) -> Result<Expense, AppError> {
        let expense = self
            .repo
            .find_by_id(charge_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("charge {charge_id}")))?;
        access::ensure_salon_access(actor, &expense.salon_id)?;
        Ok(expense)
    }
}
