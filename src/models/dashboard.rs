// src/models/dashboard.rs

use chrono::NaiveDate;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSummary {
    pub nb_commandes: i64,
    #[schema(example = "1250000.00")]
    pub ca_total: Decimal,
    pub avances_total: Decimal,
    pub reste_total: Decimal,
    /// Percentual já recebido sobre o faturamento
    #[schema(example = "62.40")]
    pub taux_avance: Decimal,
    pub charges_total: Decimal,
    /// Recebido menos charges
    pub benefice: Decimal,
    pub commandes_ouvertes: i64,
    pub validations_en_attente: i64,
}

#[derive(Debug, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StatusBreakdownEntry {
    pub statut: String,
    pub nb_commandes: i64,
    pub montant: Decimal,
}

#[derive(Debug, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TopModelEntry {
    pub modele: String,
    pub nb_commandes: i64,
    pub chiffre_affaires: Decimal,
}

#[derive(Debug, Default, Clone, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct DateRange {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    /// Usado só pelo ranking de modelos
    pub limit: Option<i64>,
}

/// avances / ca * 100, arredondado a 2 casas; 0 quando não há faturamento.
pub fn taux_avance(avances: Decimal, ca: Decimal) -> Decimal {
    if ca.is_zero() {
        return Decimal::ZERO;
    }
    (avances * Decimal::ONE_HUNDRED / ca).round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}
