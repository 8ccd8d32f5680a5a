use std::any::Any;

use axum::{
    body::{Body, HttpBody, to_bytes},
    http::{Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use chrono::Utc;
use tracing::error;

use crate::utils::error_to_api_response;

const LOGGED_BODY_LIMIT: usize = 4096;

/// 记录 5xx 响应；只有长度已知且不超过上限的 body 会被读出打印，其余原样透传
pub async fn log_errors(req: Request<Body>, next: Next) -> Response {
    let method = req.method().clone();
    let uri = req.uri().clone();
    let response = next.run(req).await;

    if !response.status().is_server_error() {
        return response;
    }

    let fits = response
        .body()
        .size_hint()
        .exact()
        .is_some_and(|len| len <= LOGGED_BODY_LIMIT as u64);
    if !fits {
        error!(
            "Server error occurred - {} {} - Status: {}, Body: <not logged>",
            method,
            uri,
            response.status()
        );
        return response;
    }

    let (mut parts, body) = response.into_parts();
    let bytes = match to_bytes(body, LOGGED_BODY_LIMIT).await {
        Ok(b) => b,
        Err(e) => {
            error!("Failed to read error response body: {}", e);
            return (
                parts.status,
                error_to_api_response("Erro interno do servidor", None, Utc::now()),
            )
                .into_response();
        }
    };
    let body_str = String::from_utf8_lossy(&bytes);

    error!(
        "Server error occurred - {} {} - Status: {}, Body: {}",
        method, uri, parts.status, body_str
    );

    // body 已被读出，长度头需要重新计算
    parts.headers.remove(axum::http::header::CONTENT_LENGTH);
    Response::from_parts(parts, Body::from(bytes))
}

/// 处理函数内的 panic 转成通用 500，进程继续服务
pub fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let details = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic".to_string()
    };
    error!("Unhandled panic in request handler: {}", details);

    (
        StatusCode::INTERNAL_SERVER_ERROR,
        error_to_api_response("Erro interno do servidor", None, Utc::now()),
    )
        .into_response()
}
