//! Content endpoint served through the response cache.

use axum::{
    extract::{Path, State},
    response::Json,
};
use tracing::{debug, instrument};

use crate::error::AppError;
use crate::extractors::ContentPath;
use crate::state::AppState;

/// GET /content/{group}/{item}
#[instrument(skip_all, fields(group = %path.group, item = %path.item))]
pub async fn get_content(
    State(state): State<AppState>,
    Path(path): Path<ContentPath>,
) -> Result<Json<serde_json::Value>, AppError> {
    path.validate().map_err(AppError::BadRequest)?;

    let group = state
        .groups()
        .resolve(&path.group)
        .map_err(|e| AppError::BadRequest(e.to_string()))?;
    let (_, item) = path.normalized();
    let key = state.keys().build(group.as_str(), &item);

    let source = state.source();
    let fetch_group = group.as_str().to_string();
    let document = state
        .cache()
        .wrap_default(&key, move || async move {
            debug!(source = source.name(), "Fetching from upstream");
            Ok(source.fetch(&fetch_group, &item).await?)
        })
        .await?;

    Ok(Json(document))
}
