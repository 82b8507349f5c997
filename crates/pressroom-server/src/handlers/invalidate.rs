//! Cache invalidation endpoint handlers.

use axum::{
    extract::{Query, State},
    response::Json,
};
use pressroom_core::GroupKey;
use serde::Serialize;
use tracing::{info, instrument};

use crate::error::AppError;
use crate::extractors::CacheActionQuery;
use crate::state::AppState;

/// Response para operaciones de invalidación.
#[derive(Debug, Serialize)]
pub struct InvalidateResponse {
    /// Número de entries invalidadas.
    pub invalidated: usize,
    /// Key invalidada (action=delete).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    /// Patrón aplicado (action=deleteGroup).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    /// Mensaje descriptivo.
    pub message: String,
}

/// GET|POST /api/cache?action=...
///
/// - `action=delete&groupKey=..&itemKey=..` invalida una entry
/// - `action=deleteGroup&groupKey=..` invalida todas las entries del grupo
///
/// The group is checked against the allow-list before the store is touched.
#[instrument(skip_all, fields(action = query.action.as_deref().unwrap_or("")))]
pub async fn cache_action(
    State(state): State<AppState>,
    Query(query): Query<CacheActionQuery>,
) -> Result<Json<InvalidateResponse>, AppError> {
    let action = CacheActionQuery::require(&query.action, "action").map_err(AppError::BadRequest)?;

    match action {
        "delete" => delete_entry(&state, &query).await,
        "deleteGroup" => delete_group(&state, &query).await,
        other => Err(AppError::BadRequest(format!("Unknown action '{}'", other))),
    }
}

async fn delete_entry(
    state: &AppState,
    query: &CacheActionQuery,
) -> Result<Json<InvalidateResponse>, AppError> {
    let group_key =
        CacheActionQuery::require(&query.group_key, "groupKey").map_err(AppError::BadRequest)?;
    let item_key =
        CacheActionQuery::require(&query.item_key, "itemKey").map_err(AppError::BadRequest)?;

    let group = resolve_group(state, group_key)?;
    let item = item_key.to_lowercase();
    let key = state.keys().build(group.as_str(), &item);

    state.cache().invalidate(&key).await?;

    info!(group = %group, item = %item, "Cache entry invalidated via API");

    Ok(Json(InvalidateResponse {
        invalidated: 1,
        message: format!("Invalidated cache entry '{}'", key),
        key: Some(key.into_inner()),
        pattern: None,
    }))
}

async fn delete_group(
    state: &AppState,
    query: &CacheActionQuery,
) -> Result<Json<InvalidateResponse>, AppError> {
    let group_key =
        CacheActionQuery::require(&query.group_key, "groupKey").map_err(AppError::BadRequest)?;
    let group = resolve_group(state, group_key)?;

    let result = state.cache().invalidate_group(state.keys(), &group).await?;

    info!(group = %group, count = result.count, "Cache group invalidated via API");

    Ok(Json(InvalidateResponse {
        invalidated: result.count,
        key: None,
        pattern: result.patterns.into_iter().next(),
        message: format!(
            "Invalidated {} cache entries for group '{}'",
            result.count, group
        ),
    }))
}

fn resolve_group(state: &AppState, candidate: &str) -> Result<GroupKey, AppError> {
    state
        .groups()
        .resolve(candidate)
        .map_err(|e| AppError::BadRequest(e.to_string()))
}
