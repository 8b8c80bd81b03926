// src/models/expense.rs

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::{common::error::AppError, models::storage::StoredFile};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "charge_type")]
pub enum ExpenseType {
    Salaire,
    Ponctuelle,
    Fixe,
    Commande,
}

impl ExpenseType {
    /// Regras de vínculo por tipo: salário aponta para um employe,
    /// charge de commande aponta para a commande.
    pub fn check_links(self, commande_id: Option<Uuid>, employe_id: Option<Uuid>) -> Result<(), AppError> {
        match self {
            ExpenseType::Salaire if employe_id.is_none() => {
                Err(AppError::InvalidInput("employe_id obligatoire pour un salaire".into()))
            }
            ExpenseType::Commande if commande_id.is_none() => {
                Err(AppError::InvalidInput("commande_id obligatoire pour une charge de commande".into()))
            }
            _ => Ok(()),
        }
    }
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Expense {
    pub id: Uuid,
    pub couturier_id: Uuid,
    pub salon_id: String,
    pub type_charge: ExpenseType,
    #[schema(example = "Loyer")]
    pub categorie: String,
    pub description: Option<String>,
    #[schema(example = "75000.00")]
    pub montant: Decimal,
    pub date_charge: NaiveDate,
    #[schema(example = "12")]
    pub reference: Option<String>,
    pub commande_id: Option<Uuid>,
    pub employe_id: Option<Uuid>,
    pub fichier_justificatif: Option<String>,
    pub date_creation: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateExpensePayload {
    pub type_charge: ExpenseType,
    #[validate(length(min = 1, max = 100, message = "required"))]
    pub categorie: String,
    pub description: Option<String>,
    #[schema(example = "75000.00")]
    pub montant: Decimal,
    pub date_charge: NaiveDate,
    #[validate(length(min = 1, max = 100, message = "length"))]
    pub reference: Option<String>,
    pub commande_id: Option<Uuid>,
    pub employe_id: Option<Uuid>,
    pub fichier_justificatif: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ExpenseRecorded {
    pub expense: Expense,
    /// Outra charge do salon já usa a mesma referência
    pub reference_collision: bool,
}

#[derive(Debug, Default, Clone, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct ExpenseFilter {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub type_charge: Option<ExpenseType>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ExpenseTotal {
    pub total: Decimal,
    pub nb_charges: i64,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NextReference {
    pub reference: String,
}

/// Próxima referência numérica do salon (maior referência numérica + 1).
/// Referências não numéricas são ignoradas.
pub fn next_reference<'a>(existing: impl IntoIterator<Item = &'a str>) -> String {
    existing
        .into_iter()
        .filter_map(|r| r.trim().parse::<u64>().ok())
        .max()
        .map_or(1, |max| max + 1)
        .to_string()
}

// --- Documentos ---

// Metadados; o conteúdo só é lido sob demanda
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ExpenseDocument {
    pub id: Uuid,
    pub charge_id: Uuid,
    #[schema(example = "facture-loyer.pdf")]
    pub file_name: String,
    pub mime_type: Option<String>,
    pub file_size: Option<i64>,
    pub file_path: Option<String>,
    pub stored_inline: bool,
    pub description: Option<String>,
    pub uploaded_by: Option<Uuid>,
    pub uploaded_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewExpenseDocument {
    pub file_name: String,
    pub mime_type: Option<String>,
    pub description: Option<String>,
    pub file: StoredFile,
}

impl NewExpenseDocument {
    pub fn validate(&self) -> Result<(), AppError> {
        if self.file_name.trim().is_empty() {
            return Err(AppError::InvalidInput("nom de fichier obligatoire".into()));
        }
        if self.file.is_empty() {
            return Err(AppError::InvalidInput("fichier vide".into()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct ExpenseDocumentContent {
    pub meta: ExpenseDocument,
    pub file: StoredFile,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DocumentReferencePayload {
    #[validate(length(min = 1, message = "required"))]
    pub path: String,
    #[validate(length(min = 1, max = 255, message = "required"))]
    pub file_name: String,
    pub mime_type: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct DocumentUploadParams {
    pub file_name: String,
    pub description: Option<String>,
}
