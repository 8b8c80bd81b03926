// src/models/reminder.rs

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::salon::SmtpSettings;

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryReminder {
    pub id: Uuid,
    pub commande_id: Uuid,
    pub couturier_id: Option<Uuid>,
    pub date_livraison: NaiveDate,
    pub date_envoi: DateTime<Utc>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MarkReminderPayload {
    /// Por padrão, a data de entrega atual da commande
    pub date_livraison: Option<NaiveDate>,
}

// Commande aberta com entrega próxima, já com os dados do aviso
#[derive(Debug, Clone, FromRow)]
pub struct DueDelivery {
    pub commande_id: Uuid,
    pub salon_id: String,
    pub couturier_id: Uuid,
    pub couturier_email: Option<String>,
    pub couturier_nom: String,
    pub client_nom: String,
    pub client_prenom: String,
    pub client_telephone: String,
    pub modele: String,
    pub date_livraison: NaiveDate,
    pub reste: Decimal,
}

/// O que o notificador recebe depois de um registro novo de lembrete.
#[derive(Debug, Clone)]
pub struct ReminderNotice {
    pub delivery: DueDelivery,
    pub salon_nom: String,
    pub smtp: Option<SmtpSettings>,
}

impl ReminderNotice {
    pub fn subject(&self) -> String {
        format!(
            "Rappel livraison {} - {} {}",
            self.delivery.date_livraison.format("%d/%m/%Y"),
            self.delivery.client_prenom,
            self.delivery.client_nom
        )
    }

    pub fn body(&self) -> String {
        let d = &self.delivery;
        let mut body = format!(
            "Bonjour {},\n\nLa commande \"{}\" de {} {} ({}) doit être livrée le {}.\n",
            d.couturier_nom,
            d.modele,
            d.client_prenom,
            d.client_nom,
            d.client_telephone,
            d.date_livraison.format("%d/%m/%Y"),
        );
        if d.reste > Decimal::ZERO {
            body.push_str(&format!("Reste à encaisser : {:.2} FCFA.\n", d.reste));
        }
        body.push_str(&format!("\n{}\n", self.salon_nom));
        body
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReminderSweepReport {
    pub examined: u32,
    pub sent: u32,
    pub already_sent: u32,
    pub failed: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn notice(reste: i64) -> ReminderNotice {
        ReminderNotice {
            delivery: DueDelivery {
                commande_id: Uuid::nil(),
                salon_id: "Jaind_000".into(),
                couturier_id: Uuid::nil(),
                couturier_email: Some("awa@atelier.sn".into()),
                couturier_nom: "Awa".into(),
                client_nom: "Diop".into(),
                client_prenom: "Moussa".into(),
                client_telephone: "771234567".into(),
                modele: "Boubou".into(),
                date_livraison: NaiveDate::from_ymd_opt(2026, 3, 14).unwrap(),
                reste: Decimal::new(reste, 0),
            },
            salon_nom: "Atelier Jaind".into(),
            smtp: None,
        }
    }

    #[test]
    fn subject_names_date_and_client() {
        assert_eq!(notice(0).subject(), "Rappel livraison 14/03/2026 - Moussa Diop");
    }

    #[test]
    fn body_mentions_balance_only_when_due() {
        assert!(!notice(0).body().contains("Reste"));
        assert!(notice(5000).body().contains("5000.00 FCFA"));
    }
}
