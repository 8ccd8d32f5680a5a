use axum::{
    Router,
    http::Method,
    routing::{get, post},
};
use tower_http::{
    catch_panic::CatchPanicLayer,
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::{
    AppState,
    middleware::{handle_panic, log_errors, rate_limit, with_security_headers},
    routes,
};

fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any)
}

// 创建主路由
pub fn create_router(state: AppState) -> Router {
    let api = Router::new()
        .route("/", get(routes::system::service_info))
        .route("/health", get(routes::system::health))
        .route("/api/receitas", get(routes::dataset::receitas))
        .route("/api/despesas", get(routes::dataset::despesas))
        .route("/api/cache/clear", post(routes::dataset::clear_cache))
        .fallback(routes::system::not_found)
        .method_not_allowed_fallback(routes::system::not_found);

    // 限流在日志之外，被拒绝的请求到不了业务逻辑
    let router = api
        .layer(axum::middleware::from_fn(log_errors))
        .layer(axum::middleware::from_fn_with_state(
            state.rate_limiter.clone(),
            rate_limit,
        ));

    with_security_headers(router)
        .layer(CompressionLayer::new())
        .layer(cors_layer())
        .layer(TraceLayer::new_for_http())
        .layer(CatchPanicLayer::custom(handle_panic))
        .with_state(state)
}
