// src/models/order.rs

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{types::Json, FromRow};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use validator::Validate;

use crate::{
    common::error::AppError,
    models::{history::HistoryEntry, storage::StoredFile},
};

/// Nome da medida -> valor (cm). O conjunto de chaves depende do modelo.
pub type Measurements = BTreeMap<String, Decimal>;

// --- Status ---
// O domínio é texto livre; estes são os valores que o sistema conhece.
pub mod status {
    pub const EN_COURS: &str = "En cours";
    pub const TERMINE: &str = "Terminé";
    pub const LIVRE_ET_PAYE: &str = "Livré et payé";

    const TERMINAL: [&str; 1] = [LIVRE_ET_PAYE];

    pub fn is_terminal(statut: &str) -> bool {
        TERMINAL.contains(&statut)
    }

    /// `est_ouverte` é sempre derivado do status.
    pub fn is_open(statut: &str) -> bool {
        !is_terminal(statut)
    }
}

/// Maior valor que cabe numa coluna `NUMERIC(12, 2)`.
pub const MAX_MONEY: Decimal = {
    const CENTS: u64 = 999_999_999_999;
    Decimal::from_parts(CENTS as u32, (CENTS >> 32) as u32, 0, false, 2)
};

/// Valida um montante monetário: não negativo, no máximo 2 casas decimais
/// e dentro da capacidade da coluna.
pub fn ensure_money(field: &str, value: Decimal) -> Result<(), AppError> {
    if value < Decimal::ZERO {
        return Err(AppError::InvalidInput(format!("{field} négatif")));
    }
    if value > MAX_MONEY {
        return Err(AppError::InvalidInput(format!("{field} supérieur à {MAX_MONEY}")));
    }
    if value.normalize().scale() > 2 {
        return Err(AppError::InvalidInput(format!("{field}: 2 décimales maximum")));
    }
    Ok(())
}

// --- Saldo ---
// Toda transição monetária passa por aqui; `reste = prix_total - avance` sempre.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Balance {
    pub prix_total: Decimal,
    pub avance: Decimal,
    pub reste: Decimal,
}

impl Balance {
    pub fn new(prix_total: Decimal, avance: Decimal) -> Result<Self, AppError> {
        ensure_money("prix_total", prix_total)?;
        ensure_money("avance", avance)?;

        if prix_total <= Decimal::ZERO {
            return Err(AppError::InvalidInput("prix_total doit être positif".into()));
        }
        if avance > prix_total {
            return Err(AppError::InvalidInput("avance supérieure au prix total".into()));
        }

        Ok(Self { prix_total, avance, reste: prix_total - avance })
    }

    pub fn is_settled(&self) -> bool {
        self.reste.is_zero()
    }

    pub fn apply_payment(&self, amount: Decimal) -> Result<Self, AppError> {
        if amount <= Decimal::ZERO || amount > self.reste || ensure_money("montant", amount).is_err() {
            return Err(AppError::InvalidAmount(amount));
        }
        let avance = self.avance + amount;
        Ok(Self { prix_total: self.prix_total, avance, reste: self.prix_total - avance })
    }

    /// Estorno de um pagamento rejeitado (lançamento de correção).
    pub fn reverse_payment(&self, amount: Decimal) -> Result<Self, AppError> {
        if amount <= Decimal::ZERO || amount > self.avance {
            return Err(AppError::InvalidAmount(amount));
        }
        let avance = self.avance - amount;
        Ok(Self { prix_total: self.prix_total, avance, reste: self.prix_total - avance })
    }

    pub fn reprice(&self, new_total: Decimal) -> Result<Self, AppError> {
        ensure_money("prix_total", new_total)?;
        if new_total <= Decimal::ZERO {
            return Err(AppError::InvalidInput("prix_total doit être positif".into()));
        }
        if new_total < self.avance {
            return Err(AppError::InvalidInput("prix_total inférieur à l'avance déjà versée".into()));
        }
        Ok(Self { prix_total: new_total, avance: self.avance, reste: new_total - self.avance })
    }
}

// --- Entidade ---

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: Uuid,
    pub client_id: Uuid,
    pub couturier_id: Uuid,
    pub salon_id: String,
    #[schema(example = "adulte")]
    pub categorie: String,
    #[schema(example = "homme")]
    pub sexe: String,
    #[schema(example = "Costume 2 pièces")]
    pub modele: String,
    #[schema(value_type = Object)]
    pub mesures: Json<Measurements>,
    #[schema(example = "50000.00")]
    pub prix_total: Decimal,
    #[schema(example = "20000.00")]
    pub avance: Decimal,
    #[schema(example = "30000.00")]
    pub reste: Decimal,
    pub date_livraison: Option<NaiveDate>,
    #[schema(example = "En cours")]
    pub statut: String,
    pub est_ouverte: bool,
    pub model_type: Option<String>,
    pub fabric_image_name: Option<String>,
    pub model_image_name: Option<String>,
    pub pdf_name: Option<String>,
    pub has_fabric_image: bool,
    pub has_model_image: bool,
    pub has_pdf: bool,
    pub date_creation: DateTime<Utc>,
    pub date_dernier_paiement: Option<DateTime<Utc>>,
}

impl Order {
    pub fn balance(&self) -> Balance {
        Balance { prix_total: self.prix_total, avance: self.avance, reste: self.reste }
    }

    pub fn is_closed(&self) -> bool {
        status::is_terminal(&self.statut)
    }
}

// Dados já validados para inserir uma commande
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub client_id: Uuid,
    pub couturier_id: Uuid,
    pub salon_id: String,
    pub categorie: String,
    pub sexe: String,
    pub modele: String,
    pub mesures: Measurements,
    pub balance: Balance,
    pub date_livraison: Option<NaiveDate>,
    pub model_type: Option<String>,
    pub fabric_image: Option<(StoredFile, Option<String>)>,
    pub model_image: Option<(StoredFile, Option<String>)>,
}

// --- Payloads ---

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderPayload {
    pub client_id: Uuid,
    #[validate(length(min = 1, max = 20, message = "required"))]
    #[schema(example = "adulte")]
    pub categorie: String,
    #[validate(length(min = 1, max = 20, message = "required"))]
    #[schema(example = "homme")]
    pub sexe: String,
    #[validate(length(min = 1, max = 200, message = "required"))]
    #[schema(example = "Costume 2 pièces")]
    pub modele: String,
    #[schema(value_type = Object)]
    pub mesures: Measurements,
    #[schema(example = "50000.00")]
    pub prix_total: Decimal,
    #[serde(default)]
    #[schema(example = "20000.00")]
    pub avance: Decimal,
    pub date_livraison: Option<NaiveDate>,
    #[validate(length(max = 50, message = "length"))]
    pub model_type: Option<String>,
    /// Caminho de uma imagem de tecido já armazenada fora do banco
    pub fabric_image_path: Option<String>,
    pub model_image_path: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PaymentPayload {
    #[schema(example = "10000.00")]
    pub montant: Decimal,
    #[validate(length(max = 1000, message = "length"))]
    pub commentaire: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ClosePayload {
    #[validate(length(max = 1000, message = "length"))]
    pub commentaire: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StatusChangePayload {
    #[validate(length(min = 1, max = 50, message = "required"))]
    #[schema(example = "Terminé")]
    pub statut: String,
    #[validate(length(max = 1000, message = "length"))]
    pub commentaire: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PriceAdjustmentPayload {
    #[schema(example = "55000.00")]
    pub prix_total: Decimal,
    #[validate(length(max = 1000, message = "length"))]
    pub commentaire: Option<String>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct ImageUploadParams {
    pub name: Option<String>,
}

// --- Respostas ---

/// Estado da commande depois de uma operação, com a entrada gravada.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderUpdate {
    pub order: Order,
    pub entry: HistoryEntry,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ClosureOutcome {
    pub order: Order,
    pub entry: HistoryEntry,
    /// false quando já havia um pedido de fechamento pendente
    pub created: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum OrderImageKind {
    Fabric,
    Model,
}

#[derive(Debug, Default, Clone, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct OrderFilter {
    /// true = abertas, false = fechadas, ausente = todas
    pub open: Option<bool>,
    pub client_id: Option<Uuid>,
    /// Entrega a partir desta data
    pub delivery_from: Option<NaiveDate>,
    /// Entrega até esta data
    pub delivery_to: Option<NaiveDate>,
}

/// Conteúdo binário de uma imagem ou do PDF de uma commande.
#[derive(Debug, Clone)]
pub struct OrderFile {
    pub name: Option<String>,
    pub file: StoredFile,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(v: i64) -> Decimal {
        Decimal::new(v, 0)
    }

    #[test]
    fn new_balance_computes_reste() {
        let b = Balance::new(d(50000), d(20000)).unwrap();
        assert_eq!(b.reste, d(30000));
        assert!(!b.is_settled());
    }

    #[test]
    fn advance_above_total_is_rejected() {
        let err = Balance::new(d(45000), d(50000)).unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));
    }

    #[test]
    fn negative_or_zero_amounts_are_rejected() {
        assert!(Balance::new(d(-1), d(0)).is_err());
        assert!(Balance::new(d(100), d(-5)).is_err());
        assert!(Balance::new(Decimal::ZERO, Decimal::ZERO).is_err());
    }

    #[test]
    fn more_than_two_decimals_is_rejected() {
        assert!(Balance::new(Decimal::new(10001, 3), d(0)).is_err());
        // zeros à direita não contam
        assert!(Balance::new(Decimal::new(100500, 3), d(0)).is_ok());
    }

    #[test]
    fn amounts_beyond_column_capacity_are_rejected() {
        assert_eq!(MAX_MONEY.to_string(), "9999999999.99");
        assert!(ensure_money("prix_total", MAX_MONEY).is_ok());

        let too_big = Decimal::new(100_000_000_000, 0);
        let err = Balance::new(too_big, d(0)).unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));
        assert!(!err.is_retryable());

        let b = Balance::new(d(1000), d(0)).unwrap();
        assert!(matches!(b.reprice(too_big), Err(AppError::InvalidInput(_))));
    }

    #[test]
    fn payment_keeps_identity() {
        let b = Balance::new(d(50000), d(20000)).unwrap();
        let paid = b.apply_payment(d(30000)).unwrap();
        assert_eq!(paid.avance, d(50000));
        assert_eq!(paid.reste, Decimal::ZERO);
        assert_eq!(paid.reste, paid.prix_total - paid.avance);
        assert!(paid.is_settled());
    }

    #[test]
    fn payment_must_be_positive_and_within_reste() {
        let b = Balance::new(d(50000), d(20000)).unwrap();
        assert!(matches!(b.apply_payment(d(-5)), Err(AppError::InvalidAmount(_))));
        assert!(matches!(b.apply_payment(Decimal::ZERO), Err(AppError::InvalidAmount(_))));
        assert!(matches!(b.apply_payment(d(30001)), Err(AppError::InvalidAmount(_))));
    }

    #[test]
    fn overpayment_fails_for_every_triple() {
        for total in [100i64, 1000, 45000] {
            for advance in [0i64, 10, total / 2, total] {
                for payment in [1i64, 50, total] {
                    let b = Balance::new(d(total), d(advance)).unwrap();
                    let result = b.apply_payment(d(payment));
                    if advance + payment > total {
                        assert!(result.is_err(), "{total}/{advance}/{payment}");
                    } else {
                        let after = result.unwrap();
                        assert_eq!(after.reste, after.prix_total - after.avance);
                    }
                }
            }
        }
    }

    #[test]
    fn reversal_restores_previous_balance() {
        let b = Balance::new(d(1000), d(200)).unwrap();
        let paid = b.apply_payment(d(300)).unwrap();
        assert_eq!(paid.reverse_payment(d(300)).unwrap(), b);
        assert!(paid.reverse_payment(d(501)).is_err());
    }

    #[test]
    fn reprice_cannot_go_below_advance() {
        let b = Balance::new(d(1000), d(600)).unwrap();
        assert_eq!(b.reprice(d(1200)).unwrap().reste, d(600));
        assert_eq!(b.reprice(d(600)).unwrap().reste, Decimal::ZERO);
        assert!(b.reprice(d(599)).is_err());
    }

    #[test]
    fn only_delivered_and_paid_is_terminal() {
        assert!(status::is_terminal(status::LIVRE_ET_PAYE));
        assert!(status::is_open(status::EN_COURS));
        assert!(status::is_open(status::TERMINE));
        assert!(status::is_open("Retouche"));
    }
}
