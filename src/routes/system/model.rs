use serde::Serialize;

use crate::cache::CacheStats;
use crate::utils::MemoryUsage;

/// 404 响应里列出的可用接口
pub const AVAILABLE_ENDPOINTS: [&str; 3] = ["/health", "/api/receitas", "/api/despesas"];

#[derive(Debug, Serialize)]
pub struct EndpointMap {
    pub health: &'static str,
    pub receitas: &'static str,
    pub despesas: &'static str,
    pub cache_clear: &'static str,
}

pub const ENDPOINTS: EndpointMap = EndpointMap {
    health: "GET /health",
    receitas: "GET /api/receitas?limit=100&offset=0&orgao=&categoria=",
    despesas: "GET /api/despesas?limit=100&offset=0&categoria=&orgao=",
    cache_clear: "POST /api/cache/clear",
};

#[derive(Debug, Serialize)]
pub struct ServiceInfo {
    pub name: &'static str,
    pub version: &'static str,
    pub status: &'static str,
    /// 秒
    pub uptime: f64,
    pub endpoints: EndpointMap,
    pub timestamp: String,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub timestamp: String,
    pub memory: Option<MemoryUsage>,
    pub uptime: f64,
    pub cache_stats: CacheStats,
}

#[derive(Debug, Serialize)]
pub struct NotFoundResponse {
    pub success: bool,
    pub error: &'static str,
    pub path: String,
    pub available_endpoints: [&'static str; 3],
    pub timestamp: String,
}
