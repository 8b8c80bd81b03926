// src/services/reminder_service.rs

use std::{collections::HashMap, sync::Arc, time::Duration};

use async_trait::async_trait;
use chrono::{Days, NaiveDate, Utc};
use sqlx::{Executor, PgPool, Postgres};
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{OrderRepository, ReminderRepository, SalonRepository},
    models::{
        auth::Couturier,
        reminder::{DeliveryReminder, DueDelivery, ReminderNotice, ReminderSweepReport},
        salon::Salon,
    },
    services::access,
};

/// Canal de entrega dos lembretes. O registro de envio é gravado antes;
/// uma falha aqui não o desfaz.
#[async_trait]
pub trait ReminderNotifier: Send + Sync {
    async fn notify(&self, notice: &ReminderNotice) -> anyhow::Result<()>;
}

/// Só registra a mensagem no log.
pub struct LogNotifier;

#[async_trait]
impl ReminderNotifier for LogNotifier {
    async fn notify(&self, notice: &ReminderNotice) -> anyhow::Result<()> {
        let destinataire = notice.delivery.couturier_email.as_deref().unwrap_or("-");
        tracing::info!(
            commande = %notice.delivery.commande_id,
            salon = %notice.delivery.salon_id,
            destinataire,
            smtp = notice.smtp.is_some(),
            sujet = %notice.subject(),
            "rappel de livraison"
        );
        tracing::debug!(corps = %notice.body());
        Ok(())
    }
}

#[derive(Clone)]
pub struct ReminderService {
    repo: ReminderRepository,
    order_repo: OrderRepository,
    salon_repo: SalonRepository,
    notifier: Arc<dyn ReminderNotifier>,
    pool: PgPool,
    lead_days: u64,
}

impl ReminderService {
    pub fn new(
        repo: ReminderRepository,
        order_repo: OrderRepository,
        salon_repo: SalonRepository,
        notifier: Arc<dyn ReminderNotifier>,
        pool: PgPool,
        lead_days: u64,
    ) -> Self {
        Self { repo, order_repo, salon_repo, notifier, pool, lead_days }
    }

    /// Marca o lembrete da commande como enviado. `None` quando já estava
    /// marcado para essa data.
    pub async fn mark_reminder_sent<'e, E>(
        &self,
        executor: E,
        actor: &Couturier,
        order_id: Uuid,
        date_livraison: Option<NaiveDate>,
    ) -> Result<Option<DeliveryReminder>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let order = self
            .order_repo
            .find_by_id(executor, order_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("commande {order_id}")))?;
        access::ensure_salon_access(actor, &order.salon_id)?;

        let date = date_livraison
            .or(order.date_livraison)
            .ok_or_else(|| AppError::InvalidInput("commande sans date de livraison".into()))?;

        self.repo.record(order_id, Some(actor.id), date).await
    }

    pub async fn list_for_order<'e, E>(
        &self,
        executor: E,
        actor: &Couturier,
        order_id: Uuid,
    ) -> Result<Vec<DeliveryReminder>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let order = self
            .order_repo
            .find_by_id(executor, order_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("commande {order_id}")))?;
        access::ensure_salon_access(actor, &order.salon_id)?;
        self.repo.list_for_order(order_id).await
    }

    /// Uma varredura: entregas entre hoje e hoje + antecedência ainda sem
    /// lembrete, de um salon ou de todos. Cada uma é marcada e só então
    /// notificada.
    pub async fn run_due_reminders(
        &self,
        today: NaiveDate,
        salon_id: Option<&str>,
    ) -> Result<ReminderSweepReport, AppError> {
        let until = today
            .checked_add_days(Days::new(self.lead_days))
            .ok_or_else(|| AppError::InvalidInput("date hors limites".into()))?;

        let due = self.repo.due_deliveries(today, until, salon_id).await?;
        let mut report = ReminderSweepReport::default();
        let mut salons: HashMap<String, Option<Salon>> = HashMap::new();

        for delivery in due {
            report.examined += 1;

            let Some(reminder) = self
                .repo
                .record(delivery.commande_id, None, delivery.date_livraison)
                .await?
            else {
                // Outra varredura chegou antes
                report.already_sent += 1;
                continue;
            };

            let salon = match salons.get(&delivery.salon_id) {
                Some(salon) => salon.clone(),
                None => {
                    let salon = self.salon_repo.find_by_id(&self.pool, &delivery.salon_id).await?;
                    salons.insert(delivery.salon_id.clone(), salon.clone());
                    salon
                }
            };

            let notice = notice_for(delivery, salon.as_ref());
            match self.notifier.notify(&notice).await {
                Ok(()) => report.sent += 1,
                Err(e) => {
                    report.failed += 1;
                    tracing::warn!(
                        rappel = %reminder.id,
                        commande = %reminder.commande_id,
                        "échec de notification: {e:#}"
                    );
                }
            }
        }

        if report.examined > 0 {
            tracing::info!(
                examined = report.examined,
                sent = report.sent,
                already_sent = report.already_sent,
                failed = report.failed,
                "rappels de livraison traités"
            );
        }
        Ok(report)
    }

    /// Varredura pedida por um admin: só o próprio salon. O super_admin
    /// escolhe um salon ou varre todos.
    pub async fn run_now(&self, actor: &Couturier, scope: Option<&str>) -> Result<ReminderSweepReport, AppError> {
        access::ensure_admin(actor)?;
        let scope = access::resolve_scope(actor, scope)?;
        self.run_due_reminders(Utc::now().date_naive(), scope.as_deref()).await
    }
}

fn notice_for(delivery: DueDelivery, salon: Option<&Salon>) -> ReminderNotice {
    ReminderNotice {
        salon_nom: salon.map_or_else(|| delivery.salon_id.clone(), |s| s.nom.clone()),
        smtp: salon.and_then(Salon::smtp_settings),
        delivery,
    }
}

/// Varredura periódica em segundo plano.
pub fn spawn_reminder_loop(service: ReminderService, every: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(every);
        tracing::info!(intervalle_secs = every.as_secs(), "boucle de rappels démarrée");

        loop {
            interval.tick().await;
            if let Err(e) = service.run_due_reminders(Utc::now().date_naive(), None).await {
                tracing::error!("échec de la tournée de rappels: {e}");
            }
        }
    })
}
