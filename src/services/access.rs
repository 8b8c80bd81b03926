// src/services/access.rs

// Regras de escopo por salon. O super_admin atravessa salons;
// os demais só enxergam o próprio.

use crate::{
    common::error::AppError,
    models::auth::{Couturier, Role},
};

pub fn ensure_salon_access(actor: &Couturier, salon_id: &str) -> Result<(), AppError> {
    if actor.is_super_admin() || actor.salon_id.as_deref() == Some(salon_id) {
        return Ok(());
    }
    Err(AppError::Forbidden(format!("salon {salon_id}")))
}

pub fn ensure_admin(actor: &Couturier) -> Result<(), AppError> {
    if actor.role.can_approve() {
        return Ok(());
    }
    Err(AppError::Forbidden("réservé aux administrateurs".into()))
}

pub fn ensure_super_admin(actor: &Couturier) -> Result<(), AppError> {
    if actor.is_super_admin() {
        return Ok(());
    }
    Err(AppError::Forbidden("réservé au super administrateur".into()))
}

/// Admin do salon informado ou super_admin.
pub fn ensure_salon_admin(actor: &Couturier, salon_id: &str) -> Result<(), AppError> {
    ensure_admin(actor)?;
    ensure_salon_access(actor, salon_id)
}

/// Salon ao qual o próprio usuário pertence.
pub fn actor_salon(actor: &Couturier) -> Result<&str, AppError> {
    actor
        .salon_id
        .as_deref()
        .ok_or_else(|| AppError::Forbidden("utilisateur sans salon".into()))
}

/// Escopo de uma listagem: `None` = todos os salons (só super_admin).
pub fn resolve_scope(actor: &Couturier, requested: Option<&str>) -> Result<Option<String>, AppError> {
    match (actor.role, requested) {
        (Role::SuperAdmin, requested) => Ok(requested.map(str::to_string)),
        (_, Some(salon_id)) => {
            ensure_salon_access(actor, salon_id)?;
            Ok(Some(salon_id.to_string()))
        }
        (_, None) => actor_salon(actor).map(|s| Some(s.to_string())),
    }
}

/// Quem pode gerir a conta `target`: o super_admin, ou um admin do mesmo salon.
pub fn ensure_can_manage(actor: &Couturier, target: &Couturier) -> Result<(), AppError> {
    if actor.is_super_admin() {
        return Ok(());
    }
    if target.is_super_admin() {
        return Err(AppError::Forbidden("compte super administrateur".into()));
    }
    match target.salon_id.as_deref() {
        Some(salon_id) => ensure_salon_admin(actor, salon_id),
        None => Err(AppError::Forbidden("compte hors salon".into())),
    }
}
