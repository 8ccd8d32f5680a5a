//! 开放数据平台 `datastore_search` 客户端
//!
//! 每次调用只发一个请求，不重试；是否缓存由调用方决定。

use reqwest::Client;
use thiserror::Error;

use super::model::{DatasetPage, DatastoreEnvelope, PageRequest};
use crate::config::{UPSTREAM_TIMEOUT, UPSTREAM_USER_AGENT};

const DATASTORE_SEARCH_PATH: &str = "/api/3/action/datastore_search";
/// 上游错误信息写入响应 details 的最大字符数
const MAX_ERROR_DETAIL_CHARS: usize = 256;

#[derive(Debug, Error)]
pub enum UpstreamError {
    /// 上游返回非 2xx
    #[error("upstream responded with HTTP {status}")]
    Http { status: u16 },

    /// 网络错误或超时
    #[error("upstream request failed: {0}")]
    Transport(#[source] reqwest::Error),

    /// 响应体不是预期的外壳，或 success 为 false
    #[error("unexpected upstream response: {0}")]
    Protocol(String),
}

#[derive(Debug, Clone)]
pub struct UpstreamClient {
    http_client: Client,
    base_url: String,
}

impl UpstreamClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self, reqwest::Error> {
        let http_client = Client::builder()
            .timeout(UPSTREAM_TIMEOUT)
            .user_agent(UPSTREAM_USER_AGENT)
            .build()?;
        Ok(Self {
            http_client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn fetch(
        &self,
        resource_id: &str,
        page: &PageRequest,
    ) -> Result<DatasetPage, UpstreamError> {
        let url = format!("{}{}", self.base_url, DATASTORE_SEARCH_PATH);
        let mut params = vec![
            ("resource_id", resource_id.to_string()),
            ("limit", page.limit.clone()),
            ("offset", page.offset.clone()),
        ];
        if let Some(filters) = page.filters_param() {
            params.push(("filters", filters));
        }

        let response = self
            .http_client
            .get(&url)
            .query(&params)
            .send()
            .await
            .map_err(UpstreamError::Transport)?;

        let status = response.status();
        if !status.is_success() {
            return Err(UpstreamError::Http {
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await.map_err(UpstreamError::Transport)?;
        parse_envelope(&body)
    }
}

pub(crate) fn parse_envelope(body: &[u8]) -> Result<DatasetPage, UpstreamError> {
    let envelope: DatastoreEnvelope = serde_json::from_slice(body)
        .map_err(|e| UpstreamError::Protocol(format!("invalid envelope: {}", e)))?;

    if !envelope.success {
        let reason = envelope
            .error
            .map(|e| truncate_chars(&e.to_string(), MAX_ERROR_DETAIL_CHARS))
            .unwrap_or_else(|| "no error details".to_string());
        return Err(UpstreamError::Protocol(format!(
            "success flag is false ({})",
            reason
        )));
    }

    envelope
        .result
        .ok_or_else(|| UpstreamError::Protocol("missing result".to_string()))
}

fn truncate_chars(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn parses_successful_envelope() {
        let body = json!({
            "success": true,
            "result": { "total": 2, "records": [{"id": 1}, {"id": 2}], "fields": [] }
        });
        let page = parse_envelope(body.to_string().as_bytes()).unwrap();
        assert_eq!(page.total, 2);
        assert_eq!(page.records, vec![json!({"id": 1}), json!({"id": 2})]);
    }

    #[test]
    fn success_false_is_protocol_error() {
        let body = json!({ "success": false, "error": { "message": "Not found" } });
        let err = parse_envelope(body.to_string().as_bytes()).unwrap_err();
        assert!(matches!(err, UpstreamError::Protocol(ref m) if m.contains("Not found")));
    }

    #[test]
    fn long_upstream_error_is_truncated() {
        let body = json!({ "success": false, "error": { "message": "é".repeat(5000) } });
        let UpstreamError::Protocol(message) = parse_envelope(body.to_string().as_bytes()).unwrap_err()
        else {
            panic!("expected protocol error");
        };
        assert!(message.chars().count() < MAX_ERROR_DETAIL_CHARS + 64);
        assert!(message.ends_with("...)"));
    }

    #[test]
    fn truncate_chars_keeps_short_text() {
        assert_eq!(truncate_chars("abc", 3), "abc");
        assert_eq!(truncate_chars("abcd", 3), "abc...");
    }

    #[test]
    fn malformed_bodies_are_protocol_errors() {
        for body in [
            "<html>gateway</html>".to_string(),
            json!({ "success": true }).to_string(),
            json!({ "success": true, "result": { "records": [] } }).to_string(),
        ] {
            let err = parse_envelope(body.as_bytes()).unwrap_err();
            assert!(matches!(err, UpstreamError::Protocol(_)), "{body}");
        }
    }

    #[test]
    fn filters_param_only_when_filters_present() {
        let mut page = PageRequest {
            limit: "10".into(),
            offset: "0".into(),
            filters: vec![],
        };
        assert_eq!(page.filters_param(), None);

        page.filters.push(("orgao", "SEFAZ".into()));
        assert_eq!(page.filters_param().as_deref(), Some(r#"{"orgao":"SEFAZ"}"#));
    }

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let client = UpstreamClient::new("http://localhost:9000/").unwrap();
        assert_eq!(client.base_url(), "http://localhost:9000");
    }
}
