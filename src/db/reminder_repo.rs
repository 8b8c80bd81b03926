// src/db/reminder_repo.rs

use chrono::NaiveDate;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::reminder::{DeliveryReminder, DueDelivery},
};

#[derive(Clone)]
pub struct ReminderRepository {
    pool: PgPool,
}

impl ReminderRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Registra o lembrete de (commande, data). Devolve `None` quando o par
    /// já estava registrado; a constraint única decide a corrida.
    pub async fn record(
        &self,
        commande_id: Uuid,
        couturier_id: Option<Uuid>,
        date_livraison: NaiveDate,
    ) -> Result<Option<DeliveryReminder>, AppError> {
        let reminder = sqlx::query_as::<_, DeliveryReminder>(
            r#"
            INSERT INTO rappels_livraison (commande_id, couturier_id, date_livraison)
            VALUES ($1, $2, $3)
            ON CONFLICT ON CONSTRAINT rappels_livraison_commande_date_key DO NOTHING
            RETURNING id, commande_id, couturier_id, date_livraison, date_envoi
            "#,
        )
        .bind(commande_id)
        .bind(couturier_id)
        .bind(date_livraison)
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::from_db)?;
        Ok(reminder)
    }

    pub async fn list_for_order(&self, commande_id: Uuid) -> Result<Vec<DeliveryReminder>, AppError> {
        let reminders = sqlx::query_as::<_, DeliveryReminder>(
            r#"
            SELECT id, commande_id, couturier_id, date_livraison, date_envoi
            FROM rappels_livraison WHERE commande_id = $1 ORDER BY date_envoi
            "#,
        )
        .bind(commande_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(reminders)
    }

    /// Commandes abertas com entrega entre hoje e `until`, de salons ativos,
    /// que ainda não têm lembrete para a data de entrega atual.
    /// `salon_id = None` cobre todos os salons.
    pub async fn due_deliveries(
        &self,
        today: NaiveDate,
        until: NaiveDate,
        salon_id: Option<&str>,
    ) -> Result<Vec<DueDelivery>, AppError> {
        let due = sqlx::query_as::<_, DueDelivery>(
            r#"
            SELECT
                c.id AS commande_id, c.salon_id, c.couturier_id,
                u.email AS couturier_email, (u.prenom || ' ' || u.nom) AS couturier_nom,
                cl.nom AS client_nom, cl.prenom AS client_prenom, cl.telephone AS client_telephone,
                c.modele, c.date_livraison, c.reste
            FROM commandes c
            JOIN couturiers u ON u.id = c.couturier_id
            JOIN clients cl ON cl.id = c.client_id
            JOIN salons s ON s.salon_id = c.salon_id
            WHERE c.est_ouverte
              AND s.actif
              AND c.date_livraison BETWEEN $1 AND $2
              AND ($3::varchar IS NULL OR c.salon_id = $3)
              AND NOT EXISTS (
                  SELECT 1 FROM rappels_livraison r
                  WHERE r.commande_id = c.id AND r.date_livraison = c.date_livraison
              )
            ORDER BY c.date_livraison, c.date_creation
            "#,
        )
        .bind(today)
        .bind(until)
        .bind(salon_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(due)
    }
}
