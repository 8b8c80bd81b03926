// src/handlers/catalog.rs

use axum::{
    extract::{Query, State},
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use utoipa::IntoParams;

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::i18n::Locale,
    models::measurements::{self, GarmentModel},
};

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct CatalogFilter {
    /// adulte | enfant
    pub categorie: Option<String>,
    pub sexe: Option<String>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct MeasurementQuery {
    pub categorie: String,
    pub sexe: String,
    pub modele: String,
}

// GET /api/catalog/models
#[utoipa::path(
    get,
    path = "/api/catalog/models",
    tag = "Catalog",
    responses(
        (status = 200, description = "Modelos conhecidos e suas medidas", body = Vec<GarmentModel>)
    ),
    params(CatalogFilter),
    security(("api_jwt" = []))
)]
pub async fn list_models(Query(filter): Query<CatalogFilter>) -> Json<Vec<GarmentModel>> {
    Json(measurements::catalogue(filter.categorie.as_deref(), filter.sexe.as_deref()))
}

// GET /api/catalog/measurements
#[utoipa::path(
    get,
    path = "/api/catalog/measurements",
    tag = "Catalog",
    responses(
        (status = 200, description = "Medidas esperadas para o modelo", body = Vec<String>),
        (status = 404, description = "Modelo fora do catálogo")
    ),
    params(MeasurementQuery),
    security(("api_jwt" = []))
)]
pub async fn expected_measurements(
    State(app_state): State<AppState>,
    locale: Locale,
    Query(query): Query<MeasurementQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let keys = measurements::expected_keys(&query.categorie, &query.sexe, &query.modele)
        .ok_or_else(|| {
            AppError::not_found(format!("modèle {}", query.modele)).to_api_error(&locale, &app_state.i18n_store)
        })?;

    Ok(Json(keys.iter().map(|k| k.to_string()).collect::<Vec<_>>()))
}
