// src/models/client.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Client {
    pub id: Uuid,
    pub couturier_id: Uuid,
    pub salon_id: String,
    pub nom: String,
    pub prenom: String,
    #[schema(example = "+221 77 123 45 67")]
    pub telephone: String,
    pub email: Option<String>,
    pub adresse: Option<String>,
    pub date_creation: DateTime<Utc>,
}

impl Client {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.prenom, self.nom)
    }
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateClientPayload {
    #[validate(length(min = 1, max = 100, message = "required"))]
    pub nom: String,
    #[validate(length(min = 1, max = 100, message = "required"))]
    pub prenom: String,
    #[validate(length(min = 6, max = 50, message = "phone"))]
    pub telephone: String,
    #[validate(email(message = "email"))]
    pub email: Option<String>,
    pub adresse: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ClientCreated {
    pub client: Client,
    /// false quando um cliente com o mesmo telefone já existia
    pub created: bool,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ClientFilter {
    /// Busca por nome, sobrenome ou telefone
    pub search: Option<String>,
}
