// src/models/salon.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

pub const DEFAULT_SMTP_HOST: &str = "smtp.gmail.com";
pub const DEFAULT_SMTP_PORT: u16 = 587;

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Salon {
    #[schema(example = "Jaind_001")]
    pub salon_id: String,
    pub nom: String,
    pub quartier: Option<String>,
    pub responsable: Option<String>,
    pub telephone: Option<String>,
    pub email: Option<String>,
    #[schema(example = "ADMIN-JAIND-01")]
    pub code_admin: String,
    pub admin_id: Option<Uuid>,
    pub actif: bool,

    pub smtp_host: String,
    pub smtp_port: i32,
    pub smtp_user: Option<String>,
    #[serde(skip_serializing)]
    #[schema(ignore)]
    pub smtp_password: Option<String>,
    pub smtp_from: Option<String>,
    pub smtp_use_tls: bool,
    pub smtp_use_ssl: bool,

    pub date_creation: DateTime<Utc>,
}

/// Configuração de envio de e-mail efetiva de um salon.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SmtpSettings {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub from: String,
    pub use_tls: bool,
    pub use_ssl: bool,
}

impl Salon {
    /// Só existe configuração quando usuário e senha estão preenchidos.
    pub fn smtp_settings(&self) -> Option<SmtpSettings> {
        let user = self.smtp_user.as_deref().map(str::trim).filter(|u| !u.is_empty())?;
        let password = self.smtp_password.as_deref().filter(|p| !p.is_empty())?;

        let host = match self.smtp_host.trim() {
            "" => DEFAULT_SMTP_HOST.to_string(),
            h => h.to_string(),
        };
        let port = u16::try_from(self.smtp_port)
            .ok()
            .filter(|p| *p != 0)
            .unwrap_or(DEFAULT_SMTP_PORT);
        let from = self
            .smtp_from
            .as_deref()
            .map(str::trim)
            .filter(|f| !f.is_empty())
            .unwrap_or(user);

        Some(SmtpSettings {
            host,
            port,
            user: user.to_string(),
            password: password.to_string(),
            from: from.to_string(),
            use_tls: self.smtp_use_tls,
            use_ssl: self.smtp_use_ssl,
        })
    }
}

// ---
// Identificador `<prefixo>_<sequência com 3 dígitos>`
// ---

pub fn format_salon_id(prefix: &str, seq: u32) -> String {
    format!("{prefix}_{seq:03}")
}

pub fn parse_salon_sequence(prefix: &str, salon_id: &str) -> Option<u32> {
    salon_id
        .strip_prefix(prefix)?
        .strip_prefix('_')
        .filter(|digits| !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit()))?
        .parse()
        .ok()
}

/// Próximo id: maior sequência existente + 1, ou `_000` se não houver nenhuma.
pub fn next_salon_id<'a>(prefix: &str, existing: impl IntoIterator<Item = &'a str>) -> String {
    let next = existing
        .into_iter()
        .filter_map(|id| parse_salon_sequence(prefix, id))
        .max()
        .map_or(0, |max| max + 1);
    format_salon_id(prefix, next)
}

// ---
// Payloads
// ---

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AdminAccountPayload {
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
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateSalonPayload {
    #[validate(length(min = 1, max = 200, message = "required"))]
    #[schema(example = "Atelier Jaind")]
    pub nom: String,
    pub quartier: Option<String>,
    pub responsable: Option<String>,
    pub telephone: Option<String>,
    #[validate(email(message = "email"))]
    pub email: Option<String>,
    #[validate(length(min = 3, max = 50, message = "length"))]
    pub code_admin: String,
    #[validate(nested)]
    pub admin: AdminAccountPayload,
}

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSalonPayload {
    #[validate(length(min = 1, max = 200, message = "required"))]
    pub nom: Option<String>,
    pub quartier: Option<String>,
    pub responsable: Option<String>,
    pub telephone: Option<String>,
    #[validate(email(message = "email"))]
    pub email: Option<String>,
    pub smtp_host: Option<String>,
    #[validate(range(min = 1, max = 65535, message = "port"))]
    pub smtp_port: Option<i32>,
    pub smtp_user: Option<String>,
    pub smtp_password: Option<String>,
    #[validate(email(message = "email"))]
    pub smtp_from: Option<String>,
    pub smtp_use_tls: Option<bool>,
    pub smtp_use_ssl: Option<bool>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NextSalonId {
    pub salon_id: String,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SalonCreated {
    pub salon: Salon,
    pub admin: crate::models::auth::Couturier,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn salon() -> Salon {
        Salon {
            salon_id: "Jaind_000".into(),
            nom: "Atelier".into(),
            quartier: None,
            responsable: None,
            telephone: None,
            email: None,
            code_admin: "ADM".into(),
            admin_id: None,
            actif: true,
            smtp_host: DEFAULT_SMTP_HOST.into(),
            smtp_port: 587,
            smtp_user: None,
            smtp_password: None,
            smtp_from: None,
            smtp_use_tls: true,
            smtp_use_ssl: false,
            date_creation: Utc::now(),
        }
    }

    #[test]
    fn sequence_is_zero_padded() {
        assert_eq!(format_salon_id("Jaind", 0), "Jaind_000");
        assert_eq!(format_salon_id("Jaind", 42), "Jaind_042");
        assert_eq!(format_salon_id("Jaind", 1234), "Jaind_1234");
    }

    #[test]
    fn parse_ignores_other_prefixes_and_garbage() {
        assert_eq!(parse_salon_sequence("Jaind", "Jaind_007"), Some(7));
        assert_eq!(parse_salon_sequence("Jaind", "Other_007"), None);
        assert_eq!(parse_salon_sequence("Jaind", "Jaind_x1"), None);
        assert_eq!(parse_salon_sequence("Jaind", "Jaind_"), None);
        assert_eq!(parse_salon_sequence("Jaind", "Jaindo_001"), None);
    }

    #[test]
    fn next_id_increments_the_max() {
        assert_eq!(next_salon_id("Jaind", []), "Jaind_000");
        assert_eq!(next_salon_id("Jaind", ["Jaind_000", "Jaind_004", "Jaind_002"]), "Jaind_005");
        assert_eq!(next_salon_id("Jaind", ["Other_010", "Jaind_001"]), "Jaind_002");
    }

    #[test]
    fn smtp_requires_user_and_password() {
        let mut s = salon();
        assert_eq!(s.smtp_settings(), None);

        s.smtp_user = Some("atelier@gmail.com".into());
        assert_eq!(s.smtp_settings(), None);

        s.smtp_password = Some("secret".into());
        let smtp = s.smtp_settings().unwrap();
        assert_eq!(smtp.host, DEFAULT_SMTP_HOST);
        assert_eq!(smtp.port, 587);
        // remetente cai para o usuário
        assert_eq!(smtp.from, "atelier@gmail.com");
        assert!(smtp.use_tls && !smtp.use_ssl);
    }

    #[test]
    fn explicit_sender_is_kept() {
        let mut s = salon();
        s.smtp_user = Some("user@x.com".into());
        s.smtp_password = Some("pw".into());
        s.smtp_from = Some("contact@atelier.com".into());
        assert_eq!(s.smtp_settings().unwrap().from, "contact@atelier.com");
    }
}
