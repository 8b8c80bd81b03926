// src/middleware/tenancy.rs

use axum::{
    extract::{FromRef, FromRequestParts},
    http::{request::Parts, StatusCode},
};

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::{auth::AuthenticatedUser, i18n::Locale},
    models::auth::Couturier,
    services::access,
};

// O super_admin escolhe o salon por este cabeçalho
pub const SALON_ID_HEADER: &str = "x-salon-id";

/// Salon obrigatório da requisição: o do usuário, ou o do cabeçalho
/// quando quem chama é o super_admin.
#[derive(Debug, Clone)]
pub struct TenantContext(pub String);

/// Escopo de listagem: `None` só para o super_admin sem cabeçalho (todos os salons).
#[derive(Debug, Clone)]
pub struct TenantScope(pub Option<String>);

fn header_salon(parts: &Parts) -> Result<Option<String>, &'static str> {
    let Some(value) = parts.headers.get(SALON_ID_HEADER) else {
        return Ok(None);
    };
    let value = value.to_str().map_err(|_| "errors.salon_header_invalid")?.trim();
    if value.is_empty() || value.len() > 50 || !value.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-') {
        return Err("errors.salon_header_invalid");
    }
    Ok(Some(value.to_string()))
}

// Resolve o salon pedido contra o usuário; `None` = sem restrição
fn resolve(user: &Couturier, requested: Option<String>) -> Result<Option<String>, AppError> {
    if user.is_super_admin() {
        return Ok(requested);
    }
    let own = access::actor_salon(user)?;
    if let Some(other) = requested.filter(|r| r != own) {
        return Err(AppError::Forbidden(format!("salon {other}")));
    }
    Ok(Some(own.to_string()))
}

async fn extract<S>(parts: &mut Parts, state: &S) -> Result<Option<String>, ApiError>
where
    S: Send + Sync,
    AppState: FromRef<S>,
{
    let app_state = AppState::from_ref(state);
    let Ok(locale) = Locale::from_request_parts(parts, state).await;
    let translate = |key: &str| app_state.i18n_store.translate(&locale.0, key, &[]);

    let AuthenticatedUser(user) = AuthenticatedUser::from_request_parts(parts, state).await?;
    let requested = header_salon(parts).map_err(|key| ApiError::new(StatusCode::BAD_REQUEST, translate(key)))?;

    resolve(&user, requested).map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))
}

impl<S> FromRequestParts<S> for TenantContext
where
    S: Send + Sync,
    AppState: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match extract(parts, state).await? {
            Some(salon_id) => Ok(TenantContext(salon_id)),
            None => {
                let app_state = AppState::from_ref(state);
                let Ok(locale) = Locale::from_request_parts(parts, state).await;
                Err(ApiError::new(
                    StatusCode::BAD_REQUEST,
                    app_state.i18n_store.translate(&locale.0, "errors.salon_header_required", &[]),
                ))
            }
        }
    }
}

impl<S> FromRequestParts<S> for TenantScope
where
    S: Send + Sync,
    AppState: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        extract(parts, state).await.map(TenantScope)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::auth::Role;
    use axum::http::Request;
    use chrono::Utc;
    use uuid::Uuid;

    fn user(role: Role, salon: Option<&str>) -> Couturier {
        Couturier {
            id: Uuid::new_v4(),
            code_couturier: "COUT001".into(),
            password_hash: String::new(),
            nom: "Ndiaye".into(),
            prenom: "Awa".into(),
            email: None,
            telephone: None,
            role,
            salon_id: salon.map(str::to_string),
            actif: true,
            date_creation: Utc::now(),
            derniere_connexion: None,
        }
    }

    fn parts(header: Option<&str>) -> Parts {
        let mut builder = Request::builder().uri("/api/orders");
        if let Some(value) = header {
            builder = builder.header(SALON_ID_HEADER, value);
        }
        builder.body(()).unwrap().into_parts().0
    }

    #[test]
    fn header_is_optional_but_must_be_well_formed() {
        assert_eq!(header_salon(&parts(None)), Ok(None));
        assert_eq!(header_salon(&parts(Some("Jaind_001"))), Ok(Some("Jaind_001".into())));
        assert!(header_salon(&parts(Some("Jaind 001; drop"))).is_err());
        assert!(header_salon(&parts(Some("  "))).is_err());
    }

    #[test]
    fn employees_are_pinned_to_their_salon() {
        let employe = user(Role::Employe, Some("Jaind_000"));
        assert_eq!(resolve(&employe, None).unwrap(), Some("Jaind_000".into()));
        assert_eq!(resolve(&employe, Some("Jaind_000".into())).unwrap(), Some("Jaind_000".into()));
        assert!(matches!(resolve(&employe, Some("Jaind_001".into())), Err(AppError::Forbidden(_))));
    }

    #[test]
    fn super_admin_picks_any_salon_or_none() {
        let root = user(Role::SuperAdmin, None);
        assert_eq!(resolve(&root, None).unwrap(), None);
        assert_eq!(resolve(&root, Some("Jaind_007".into())).unwrap(), Some("Jaind_007".into()));
    }
}
