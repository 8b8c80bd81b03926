// src/db/history_repo.rs

use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::history::{HistoryAction, HistoryEntry, NewHistoryEntry, PendingFilter, PendingValidation, ValidationStatus},
};

const COLUMNS: &str = r#"
    id, seq, commande_id, couturier_id, type_action, montant_paye, reste_apres_paiement,
    statut_avant, statut_apres, commentaire, statut_validation, admin_validation_id,
    date_validation, commentaire_admin, date_creation
"#;

// O histórico só recebe inserções; a única alteração permitida é a decisão
// sobre uma entrada pendente.
#[derive(Clone)]
pub struct HistoryRepository {
    pool: PgPool,
}

impl HistoryRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn append<'e, E>(&self, executor: E, entry: &NewHistoryEntry) -> Result<HistoryEntry, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            r#"
            INSERT INTO historique_commandes (
                commande_id, couturier_id, type_action, montant_paye, reste_apres_paiement,
                statut_avant, statut_apres, commentaire, statut_validation, admin_validation_id,
                date_validation
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10,
                    CASE WHEN $9 = 'validee'::validation_status THEN NOW() END)
            RETURNING {COLUMNS}
            "#
        );

        sqlx::query_as::<_, HistoryEntry>(&sql)
            .bind(entry.commande_id)
            .bind(entry.couturier_id)
            .bind(entry.type_action)
            .bind(entry.montant_paye)
            .bind(entry.reste_apres_paiement)
            .bind(&entry.statut_avant)
            .bind(&entry.statut_apres)
            .bind(&entry.commentaire)
            .bind(entry.statut_validation)
            .bind(entry.admin_validation_id)
            .fetch_one(executor)
            .await
            .map_err(AppError::from_db)
    }

    pub async fn list_for_order<'e, E>(&self, executor: E, commande_id: Uuid) -> Result<Vec<HistoryEntry>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!("SELECT {COLUMNS} FROM historique_commandes WHERE commande_id = $1 ORDER BY seq");
        let entries = sqlx::query_as::<_, HistoryEntry>(&sql)
            .bind(commande_id)
            .fetch_all(executor)
            .await?;
        Ok(entries)
    }

    pub async fn find<'e, E>(&self, executor: E, id: Uuid) -> Result<Option<HistoryEntry>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!("SELECT {COLUMNS} FROM historique_commandes WHERE id = $1");
        let entry = sqlx::query_as::<_, HistoryEntry>(&sql)
            .bind(id)
            .fetch_optional(executor)
            .await?;
        Ok(entry)
    }

    /// Decide uma entrada só se ela ainda estiver `en_attente`.
    /// `None` significa que outra decisão chegou antes (ou que a entrada não existe).
    pub async fn decide<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        decision: ValidationStatus,
        admin_id: Uuid,
        commentaire_admin: Option<&str>,
    ) -> Result<Option<HistoryEntry>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            r#"
            UPDATE historique_commandes SET
                statut_validation = $2,
                admin_validation_id = $3,
                date_validation = NOW(),
                commentaire_admin = $4
            WHERE id = $1 AND statut_validation = 'en_attente'
            RETURNING {COLUMNS}
            "#
        );

        let entry = sqlx::query_as::<_, HistoryEntry>(&sql)
            .bind(id)
            .bind(decision)
            .bind(admin_id)
            .bind(commentaire_admin)
            .fetch_optional(executor)
            .await?;
        Ok(entry)
    }

    pub async fn find_pending<'e, E>(
        &self,
        executor: E,
        commande_id: Uuid,
        action: HistoryAction,
    ) -> Result<Option<HistoryEntry>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            r#"
            SELECT {COLUMNS} FROM historique_commandes
            WHERE commande_id = $1 AND type_action = $2 AND statut_validation = 'en_attente'
            ORDER BY seq
            LIMIT 1
            "#
        );
        let entry = sqlx::query_as::<_, HistoryEntry>(&sql)
            .bind(commande_id)
            .bind(action)
            .fetch_optional(executor)
            .await?;
        Ok(entry)
    }

    pub async fn count_pending<'e, E>(
        &self,
        executor: E,
        commande_id: Uuid,
        action: HistoryAction,
    ) -> Result<i64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let count = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*) FROM historique_commandes
            WHERE commande_id = $1 AND type_action = $2 AND statut_validation = 'en_attente'
            "#,
        )
        .bind(commande_id)
        .bind(action)
        .fetch_one(executor)
        .await?;
        Ok(count)
    }

    /// Fila de validação, do pedido mais recente ao mais antigo.
    pub async fn list_pending(
        &self,
        salon_id: Option<&str>,
        filter: &PendingFilter,
    ) -> Result<Vec<PendingValidation>, AppError> {
        let sql = r#"
            SELECT
                h.id, h.seq, h.commande_id, h.couturier_id, h.type_action, h.montant_paye,
                h.reste_apres_paiement, h.statut_avant, h.statut_apres, h.commentaire,
                h.statut_validation, h.admin_validation_id, h.date_validation,
                h.commentaire_admin, h.date_creation,
                c.salon_id, c.modele,
                cl.nom AS client_nom, cl.prenom AS client_prenom,
                (u.prenom || ' ' || u.nom) AS demandeur_nom
            FROM historique_commandes h
            JOIN commandes c ON c.id = h.commande_id
            JOIN clients cl ON cl.id = c.client_id
            JOIN couturiers u ON u.id = h.couturier_id
            WHERE h.statut_validation = 'en_attente'
              AND ($1::varchar IS NULL OR c.salon_id = $1)
              AND ($2::date IS NULL OR h.date_creation::date >= $2)
              AND ($3::date IS NULL OR h.date_creation::date <= $3)
            ORDER BY h.seq DESC
        "#;

        let pending = sqlx::query_as::<_, PendingValidation>(sql)
            .bind(salon_id)
            .bind(filter.from)
            .bind(filter.to)
            .fetch_all(&self.pool)
            .await?;
        Ok(pending)
    }
}
