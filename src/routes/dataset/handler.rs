use std::sync::Arc;

use axum::{
    Json,
    extract::{Query, State, rejection::QueryRejection},
    http::StatusCode,
    response::IntoResponse,
};

use crate::{
    AppState,
    cache::dataset_key,
    config::CACHE_TTL,
    error::AppError,
    utils::iso_timestamp,
};

use super::model::{ClearCacheResponse, DESPESAS, Dataset, DatasetQuery, DatasetResponse, RECEITAS};

#[axum::debug_handler]
pub async fn receitas(
    State(state): State<AppState>,
    query: Result<Query<DatasetQuery>, QueryRejection>,
) -> Result<Json<DatasetResponse>, AppError> {
    let Query(query) = query.map_err(|e| AppError::InvalidQuery(e.body_text()))?;
    let resource_id = state.config.receitas_resource_id.clone();
    serve_dataset(&state, RECEITAS, &resource_id, &query).await
}

#[axum::debug_handler]
pub async fn despesas(
    State(state): State<AppState>,
    query: Result<Query<DatasetQuery>, QueryRejection>,
) -> Result<Json<DatasetResponse>, AppError> {
    let Query(query) = query.map_err(|e| AppError::InvalidQuery(e.body_text()))?;
    let resource_id = state.config.despesas_resource_id.clone();
    serve_dataset(&state, DESPESAS, &resource_id, &query).await
}

async fn serve_dataset(
    state: &AppState,
    dataset: Dataset,
    resource_id: &str,
    query: &DatasetQuery,
) -> Result<Json<DatasetResponse>, AppError> {
    let page = query.page_request(&dataset);
    let key = dataset_key(
        dataset.name,
        &page.limit,
        &page.offset,
        &query.filters_for(&dataset),
    );

    let upstream = &state.upstream;
    let page = &page;
    let lookup = state
        .cache
        .get_or_compute(&key, CACHE_TTL, move || async move {
            upstream.fetch(resource_id, page).await.map(Arc::new)
        })
        .await
        .map_err(|source| {
            tracing::warn!("failed to fetch {} from upstream: {}", dataset.name, source);
            AppError::Upstream {
                resource: dataset.name,
                source,
            }
        })?;

    Ok(Json(DatasetResponse {
        success: true,
        cached: lookup.cached,
        page: lookup.value,
        timestamp: iso_timestamp(state.clock.now()),
    }))
}

/// 清空全部缓存
///
/// 没有鉴权，只能依靠网络边界保护。
#[axum::debug_handler]
pub async fn clear_cache(State(state): State<AppState>) -> impl IntoResponse {
    let cleared_keys = state.cache.clear_all();
    tracing::info!("cache cleared via admin endpoint, {} keys removed", cleared_keys);

    (
        StatusCode::OK,
        Json(ClearCacheResponse {
            success: true,
            message: "Cache limpo com sucesso".to_string(),
            cleared_keys,
            timestamp: iso_timestamp(state.clock.now()),
        }),
    )
}
