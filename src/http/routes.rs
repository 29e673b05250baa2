//! Route handlers
//!
//! Store access is synchronous, so handlers run API calls on the blocking
//! pool.

use super::error::ApiError;
use crate::api::{BaitList, ComplexInteractions, ComplexList, InteractionSearch, InteractomeApi, ServiceError};
use crate::storage::Diagnostics;
use axum::{
    extract::{Path, Query, State},
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;

/// Cache policy for structure files, which never change once generated
pub const IMMUTABLE_CACHE: &str = "public, max-age=31536000, immutable";

/// `?mode=` and `?confidence=` query parameters
#[derive(Debug, Default, Deserialize)]
pub struct FilterParams {
    pub mode: Option<String>,
    pub confidence: Option<String>,
}

async fn blocking<T, F>(api: InteractomeApi, f: F) -> Result<T, ApiError>
where
    F: FnOnce(&InteractomeApi) -> Result<T, ServiceError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(move || f(&api))
        .await
        .map_err(|e| ApiError::internal(format!("request task failed: {}", e)))?
        .map_err(ApiError::from)
}

pub async fn interactions(
    State(api): State<InteractomeApi>,
    Path(id): Path<String>,
    Query(params): Query<FilterParams>,
) -> Result<Json<InteractionSearch>, ApiError> {
    blocking(api, move |api| {
        api.search_interactions(&id, params.mode.as_deref(), params.confidence.as_deref())
    })
    .await
    .map(Json)
}

pub async fn complexes(
    State(api): State<InteractomeApi>,
    Query(params): Query<FilterParams>,
) -> Result<Json<ComplexList>, ApiError> {
    blocking(api, move |api| api.complexes(params.mode.as_deref()))
        .await
        .map(Json)
}

pub async fn complex_interactions(
    State(api): State<InteractomeApi>,
    Path(id): Path<String>,
    Query(params): Query<FilterParams>,
) -> Result<Json<ComplexInteractions>, ApiError> {
    blocking(api, move |api| {
        api.complex_interactions(&id, params.mode.as_deref(), params.confidence.as_deref())
    })
    .await
    .map(Json)
}

pub async fn baits(State(api): State<InteractomeApi>) -> Result<Json<BaitList>, ApiError> {
    blocking(api, |api| api.baits()).await.map(Json)
}

pub async fn structure(
    State(api): State<InteractomeApi>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let cif = api.structure(&id).await?;
    let headers = [
        (header::CONTENT_TYPE, "chemical/x-cif".to_string()),
        (
            header::CONTENT_DISPOSITION,
            format!("inline; filename=\"{}\"", cif.filename.replace('"', "")),
        ),
        (header::CACHE_CONTROL, IMMUTABLE_CACHE.to_string()),
    ];
    Ok((headers, cif.content).into_response())
}

pub async fn pae(
    State(api): State<InteractomeApi>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let contacts = api.pae_contacts(&id).await?;
    Ok(([(header::CACHE_CONTROL, IMMUTABLE_CACHE)], Json(contacts)).into_response())
}

pub async fn debug(State(api): State<InteractomeApi>) -> Result<Json<Diagnostics>, ApiError> {
    blocking(api, |api| api.diagnostics()).await.map(Json)
}
