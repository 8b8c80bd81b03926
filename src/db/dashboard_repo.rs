// src/db/dashboard_repo.rs

use rust_decimal::Decimal;
use sqlx::{Acquire, Executor, PgPool, Postgres};

use crate::{
    common::error::AppError,
    models::dashboard::{taux_avance, DashboardSummary, DateRange, StatusBreakdownEntry, TopModelEntry},
};

#[derive(Clone)]
pub struct DashboardRepository {
    pool: PgPool,
}

impl DashboardRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // 1. Resumo geral do período
    pub async fn get_summary<'e, E>(
        &self,
        executor: E,
        salon_id: Option<&str>,
        range: &DateRange,
    ) -> Result<DashboardSummary, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        // Snapshot consistente entre as consultas
        let mut tx = executor.begin().await?;

        // A. Commandes criadas no período
        let (nb_commandes, ca_total, avances_total, reste_total, commandes_ouvertes) =
            sqlx::query_as::<_, (i64, Decimal, Decimal, Decimal, i64)>(
                r#"
                SELECT
                    COUNT(*),
                    COALESCE(SUM(prix_total), 0),
                    COALESCE(SUM(avance), 0),
                    COALESCE(SUM(reste), 0),
                    COUNT(*) FILTER (WHERE est_ouverte)
                FROM commandes
                WHERE ($1::varchar IS NULL OR salon_id = $1)
                  AND ($2::date IS NULL OR date_creation::date >= $2)
                  AND ($3::date IS NULL OR date_creation::date <= $3)
                "#,
            )
            .bind(salon_id)
            .bind(range.from)
            .bind(range.to)
            .fetch_one(&mut *tx)
            .await?;

        // B. Charges do período
        let charges_total = sqlx::query_scalar::<_, Decimal>(
            r#"
            SELECT COALESCE(SUM(montant), 0) FROM charges
            WHERE ($1::varchar IS NULL OR salon_id = $1)
              AND ($2::date IS NULL OR date_charge >= $2)
              AND ($3::date IS NULL OR date_charge <= $3)
            "#,
        )
        .bind(salon_id)
        .bind(range.from)
        .bind(range.to)
        .fetch_one(&mut *tx)
        .await?;

        // C. Fila de validação (independe do período)
        let validations_en_attente = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*) FROM historique_commandes h
            JOIN commandes c ON c.id = h.commande_id
            WHERE h.statut_validation = 'en_attente'
              AND ($1::varchar IS NULL OR c.salon_id = $1)
            "#,
        )
        .bind(salon_id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(DashboardSummary {
            nb_commandes,
            ca_total,
            avances_total,
            reste_total,
            taux_avance: taux_avance(avances_total, ca_total),
            charges_total,
            benefice: avances_total - charges_total,
            commandes_ouvertes,
            validations_en_attente,
        })
    }

    // 2. Distribuição por status
    pub async fn get_status_breakdown(
        &self,
        salon_id: Option<&str>,
        range: &DateRange,
    ) -> Result<Vec<StatusBreakdownEntry>, AppError> {
        let data = sqlx::query_as::<_, StatusBreakdownEntry>(
            r#"
            SELECT statut, COUNT(*) AS nb_commandes, COALESCE(SUM(prix_total), 0) AS montant
            FROM commandes
            WHERE ($1::varchar IS NULL OR salon_id = $1)
              AND ($2::date IS NULL OR date_creation::date >= $2)
              AND ($3::date IS NULL OR date_creation::date <= $3)
            GROUP BY statut
            ORDER BY nb_commandes DESC, statut
            "#,
        )
        .bind(salon_id)
        .bind(range.from)
        .bind(range.to)
        .fetch_all(&self.pool)
        .await?;

        Ok(data)
    }

    // 3. Modelos mais vendidos em faturamento
    pub async fn get_top_models(
        &self,
        salon_id: Option<&str>,
        range: &DateRange,
        limit: i64,
    ) -> Result<Vec<TopModelEntry>, AppError> {
        let data = sqlx::query_as::<_, TopModelEntry>(
            r#"
            SELECT modele, COUNT(*) AS nb_commandes, COALESCE(SUM(prix_total), 0) AS chiffre_affaires
            FROM commandes
            WHERE ($1::varchar IS NULL OR salon_id = $1)
              AND ($2::date IS NULL OR date_creation::date >= $2)
              AND ($3::date IS NULL OR date_creation::date <= $3)
            GROUP BY modele
            ORDER BY chiffre_affaires DESC, modele
            LIMIT $4
            "#,
        )
        .bind(salon_id)
        .bind(range.from)
        .bind(range.to)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(data)
    }
}
