// src/services/branding_service.rs

use crate::{
    common::error::AppError,
    db::LogoRepository,
    models::{
        auth::Couturier,
        logo::{Logo, LogoContent, NewLogo},
    },
    services::access,
};

#[derive(Clone)]
pub struct BrandingService {
    repo: LogoRepository,
}

impl BrandingService {
    pub fn new(repo: LogoRepository) -> Self {
        Self { repo }
    }

    pub async fn upload_logo(&self, actor: &Couturier, salon_id: &str, logo: NewLogo) -> Result<Logo, AppError> {
        access::ensure_salon_admin(actor, salon_id)?;
        logo.validate()?;

        let saved = self.repo.upsert(salon_id, actor.id, &logo).await?;
        tracing::info!(salon = %salon_id, taille = saved.file_size, "logo enregistré");
        Ok(saved)
    }

    pub async fn get_logo(&self, actor: &Couturier, salon_id: &str) -> Result<LogoContent, AppError> {
        access::ensure_salon_access(actor, salon_id)?;
        self.repo
            .get(salon_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("logo du salon {salon_id}")))
    }

    pub async fn delete_logo(&self, actor: &Couturier, salon_id: &str) -> Result<(), AppError> {
        access::ensure_salon_admin(actor, salon_id)?;
        if !self.repo.delete(salon_id).await? {
            return Err(AppError::not_found(format!("logo du salon {salon_id}")));
        }
        tracing::info!(salon = %salon_id, "logo supprimé");
        Ok(())
    }
}
