// src/middleware/rbac.rs

use std::marker::PhantomData;

use axum::{
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::{auth::AuthenticatedUser, i18n::Locale},
    models::auth::Role,
};

/// 1. O trait que define quais papéis passam pela rota
pub trait RoleDef: Send + Sync + 'static {
    fn allows(role: Role) -> bool;
    fn label() -> &'static str;
}

/// 2. O extractor (guardião)
pub struct RequireRole<T>(pub PhantomData<T>);

impl<T, S> FromRequestParts<S> for RequireRole<T>
where
    T: RoleDef,
    S: Send + Sync,
    AppState: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let AuthenticatedUser(user) = AuthenticatedUser::from_request_parts(parts, state).await?;

        if !T::allows(user.role) {
            let app_state = AppState::from_ref(state);
            let Ok(locale) = Locale::from_request_parts(parts, state).await;
            return Err(AppError::Forbidden(T::label().into()).to_api_error(&locale, &app_state.i18n_store));
        }

        Ok(RequireRole(PhantomData))
    }
}

// ---
// PAPÉIS
// ---

pub struct AdminOnly;
impl RoleDef for AdminOnly {
    fn allows(role: Role) -> bool {
        role.can_approve()
    }
    fn label() -> &'static str {
        "réservé aux administrateurs"
    }
}

pub struct SuperAdminOnly;
impl RoleDef for SuperAdminOnly {
    fn allows(role: Role) -> bool {
        role == Role::SuperAdmin
    }
    fn label() -> &'static str {
        "réservé au super administrateur"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_gates() {
        assert!(AdminOnly::allows(Role::Admin));
        assert!(AdminOnly::allows(Role::SuperAdmin));
        assert!(!AdminOnly::allows(Role::Employe));
        assert!(SuperAdminOnly::allows(Role::SuperAdmin));
        assert!(!SuperAdminOnly::allows(Role::Admin));
    }
}
