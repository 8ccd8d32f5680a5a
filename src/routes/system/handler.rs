use axum::{
    Json,
    extract::State,
    http::{StatusCode, Uri},
    response::IntoResponse,
};

use crate::{
    AppState,
    utils::{iso_timestamp, process_memory},
};

use super::model::{
    AVAILABLE_ENDPOINTS, ENDPOINTS, HealthResponse, NotFoundResponse, ServiceInfo,
};

const SERVICE_NAME: &str = "API Proxy Dados Abertos";

#[axum::debug_handler]
pub async fn service_info(State(state): State<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(ServiceInfo {
            name: SERVICE_NAME,
            version: env!("CARGO_PKG_VERSION"),
            status: "online",
            uptime: state.uptime_secs(),
            endpoints: ENDPOINTS,
            timestamp: iso_timestamp(state.clock.now()),
        }),
    )
}

#[axum::debug_handler]
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "ok",
            timestamp: iso_timestamp(state.clock.now()),
            memory: process_memory(),
            uptime: state.uptime_secs(),
            cache_stats: state.cache.stats(),
        }),
    )
}

pub async fn not_found(State(state): State<AppState>, uri: Uri) -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(NotFoundResponse {
            success: false,
            error: "Endpoint não encontrado",
            path: uri.path().to_string(),
            available_endpoints: AVAILABLE_ENDPOINTS,
            timestamp: iso_timestamp(state.clock.now()),
        }),
    )
}
