use axum::Json;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;

/// 所有失败响应共用的外壳
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    pub timestamp: String,
}

pub fn error_to_api_response(
    error: impl Into<String>,
    details: Option<String>,
    now: DateTime<Utc>,
) -> Json<ErrorResponse> {
    Json(ErrorResponse {
        success: false,
        error: error.into(),
        details,
        timestamp: iso_timestamp(now),
    })
}

/// ISO-8601，精确到毫秒，UTC 用 `Z` 结尾
pub fn iso_timestamp(now: DateTime<Utc>) -> String {
    now.to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct MemoryUsage {
    pub rss_bytes: u64,
    pub peak_rss_bytes: Option<u64>,
}

/// 从 /proc/self/status 读取常驻内存，非 Linux 返回 None
pub fn process_memory() -> Option<MemoryUsage> {
    let status = std::fs::read_to_string("/proc/self/status").ok()?;
    parse_proc_status(&status)
}

fn parse_proc_status(status: &str) -> Option<MemoryUsage> {
    let field = |name: &str| {
        status
            .lines()
            .find(|line| line.starts_with(name))
            .and_then(|line| line[name.len()..].trim().trim_end_matches("kB").trim().parse::<u64>().ok())
            .map(|kb| kb * 1024)
    };
    Some(MemoryUsage {
        rss_bytes: field("VmRSS:")?,
        peak_rss_bytes: field("VmHWM:"),
    })
}
