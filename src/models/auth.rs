// src/models/auth.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "user_role", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    Employe,
    SuperAdmin,
}

impl Role {
    pub fn can_approve(self) -> bool {
        matches!(self, Role::Admin | Role::SuperAdmin)
    }
}

// Representa um couturier vindo do banco de dados
#[derive(Debug, Clone, Serialize, sqlx::FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Couturier {
    pub id: Uuid,
    #[schema(example = "COUT001")]
    pub code_couturier: String,

    #[serde(skip_serializing)] // IMPORTANTE para segurança
    #[schema(ignore)]
    pub password_hash: String,

    pub nom: String,
    pub prenom: String,
    pub email: Option<String>,
    pub telephone: Option<String>,
    pub role: Role,
    /// Ausente apenas para o super_admin
    #[schema(example = "Jaind_000")]
    pub salon_id: Option<String>,
    pub actif: bool,
    pub date_creation: DateTime<Utc>,
    pub derniere_connexion: Option<DateTime<Utc>>,
}

impl Couturier {
    pub fn is_super_admin(&self) -> bool {
        self.role == Role::SuperAdmin
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.prenom, self.nom)
    }
}

// Dados para login
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginPayload {
    #[validate(length(min = 1, message = "required"))]
    #[schema(example = "COUT001")]
    pub code: String,
    #[validate(length(min = 1, message = "required"))]
    pub password: String,
}

// Resposta de autenticação com o token
#[derive(Debug, Serialize, ToSchema)]
pub struct AuthResponse {
    pub token: String,
    pub user: Couturier,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserPayload {
    #[validate(length(min = 3, max = 50, message = "length"))]
    pub code_couturier: String,
    #[validate(length(min = 6, message = "A senha deve ter no mínimo 6 caracteres."))]
    pub password: String,
    #[validate(length(min = 1, max = 100, message = "required"))]
    pub nom: String,
    #[validate(length(min = 1, max = 100, message = "required"))]
    pub prenom: String,
    #[validate(email(message = "email"))]
    pub email: Option<String>,
    pub telephone: Option<String>,
    pub role: Role,
    /// Obrigatório quando quem cria é o super_admin
    pub salon_id: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordPayload {
    #[validate(length(min = 6, message = "A senha deve ter no mínimo 6 caracteres."))]
    pub new_password: String,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SetActivePayload {
    pub actif: bool,
}

// Estrutura de dados ("claims") dentro do JWT
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,  // Subject (ID do couturier)
    pub exp: usize, // Expiration time (quando o token expira)
    pub iat: usize, // Issued At (quando o token foi criado)
}
