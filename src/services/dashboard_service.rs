// src/services/dashboard_service.rs

use sqlx::{Acquire, Executor, Postgres};

use crate::{
    common::error::AppError,
    db::DashboardRepository,
    models::{
        auth::Couturier,
        dashboard::{DashboardSummary, DateRange, StatusBreakdownEntry, TopModelEntry},
    },
    services::access,
};

const DEFAULT_TOP_MODELS: i64 = 5;
const MAX_TOP_MODELS: i64 = 50;

#[derive(Clone)]
pub struct DashboardService {
    repo: DashboardRepository,
}

impl DashboardService {
    pub fn new(repo: DashboardRepository) -> Self {
        Self { repo }
    }

    pub async fn get_summary<'e, E>(
        &self,
        executor: E,
        actor: &Couturier,
        scope: Option<&str>,
        range: &DateRange,
    ) -> Result<DashboardSummary, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        access::ensure_admin(actor)?;
        let scope = access::resolve_scope(actor, scope)?;
        self.repo.get_summary(executor, scope.as_deref(), range).await
    }

    pub async fn get_status_breakdown(
        &self,
        actor: &Couturier,
        scope: Option<&str>,
        range: &DateRange,
    ) -> Result<Vec<StatusBreakdownEntry>, AppError> {
        access::ensure_admin(actor)?;
        let scope = access::resolve_scope(actor, scope)?;
        self.repo.get_status_breakdown(scope.as_deref(), range).await
    }

    pub async fn get_top_models(
        &self,
        actor: &Couturier,
        scope: Option<&str>,
        range: &DateRange,
    ) -> Result<Vec<TopModelEntry>, AppError> {
        access::ensure_admin(actor)?;
        let scope = access::resolve_scope(actor, scope)?;
        let limit = range.limit.unwrap_or(DEFAULT_TOP_MODELS).clamp(1, MAX_TOP_MODELS);
        self.repo.get_top_models(scope.as_deref(), range, limit).await
    }
}
