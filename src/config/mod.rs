use std::env;
use std::time::Duration;

use thiserror::Error;

/// 缓存条目存活时间
pub const CACHE_TTL: Duration = Duration::from_secs(600);
/// 后台清理过期缓存的周期
pub const CACHE_SWEEP_PERIOD: Duration = Duration::from_secs(120);
/// 限流窗口长度
pub const RATE_LIMIT_WINDOW: Duration = Duration::from_secs(15 * 60);
/// 单个窗口内每个地址允许的最大请求数
pub const RATE_LIMIT_MAX_REQUESTS: u32 = 500;
/// 被限流时返回的 Retry-After 秒数
pub const RATE_LIMIT_RETRY_AFTER_SECS: u64 = 900;
/// 上游请求超时
pub const UPSTREAM_TIMEOUT: Duration = Duration::from_secs(10);
pub const UPSTREAM_USER_AGENT: &str = "dados-abertos-proxy/0.1";

const DEFAULT_PORT: u16 = 3000;
const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_UPSTREAM_BASE_URL: &str = "https://dados.gov.br";
const DEFAULT_RECEITAS_RESOURCE_ID: &str = "5b9ad2a4-7b43-4d43-9a48-7b3a3c2a4f01";
const DEFAULT_DESPESAS_RESOURCE_ID: &str = "8e1c6f0d-2f8a-4c3e-b7a1-0d5e9f3b6c02";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {name}: {value:?}")]
    InvalidValue { name: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub server_host: String,
    pub server_port: u16,
    pub upstream_base_url: String,
    pub receitas_resource_id: String,
    pub despesas_resource_id: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_host: DEFAULT_HOST.to_string(),
            server_port: DEFAULT_PORT,
            upstream_base_url: DEFAULT_UPSTREAM_BASE_URL.to_string(),
            receitas_resource_id: DEFAULT_RECEITAS_RESOURCE_ID.to_string(),
            despesas_resource_id: DEFAULT_DESPESAS_RESOURCE_ID.to_string(),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// 按变量名取值，未设置或为空时使用默认值
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();

        let server_port = match var("PORT") {
            Some(raw) => raw
                .trim()
                .parse::<u16>()
                .map_err(|_| ConfigError::InvalidValue {
                    name: "PORT",
                    value: raw.clone(),
                })?,
            None => defaults.server_port,
        };

        Ok(Config {
            server_host: var("SERVER_HOST").unwrap_or(defaults.server_host),
            server_port,
            upstream_base_url: var("UPSTREAM_BASE_URL").unwrap_or(defaults.upstream_base_url),
            receitas_resource_id: var("RECEITAS_RESOURCE_ID")
                .unwrap_or(defaults.receitas_resource_id),
            despesas_resource_id: var("DESPESAS_RESOURCE_ID")
                .unwrap_or(defaults.despesas_resource_id),
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name: &str| vars.get(name).cloned()
    }

    #[test]
    fn defaults_when_nothing_is_set() {
        let config = Config::from_lookup(|_| None).unwrap();
        assert_eq!(config.server_port, 3000);
        assert_eq!(config.server_host, "0.0.0.0");
        assert_eq!(config.upstream_base_url, DEFAULT_UPSTREAM_BASE_URL);
    }

    #[test]
    fn port_and_upstream_are_read() {
        let config = Config::from_lookup(lookup_from(&[
            ("PORT", "8080"),
            ("UPSTREAM_BASE_URL", "http://127.0.0.1:9000"),
        ]))
        .unwrap();
        assert_eq!(config.server_port, 8080);
        assert_eq!(config.upstream_base_url, "http://127.0.0.1:9000");
    }

    #[test]
    fn empty_values_fall_back_to_defaults() {
        let config = Config::from_lookup(lookup_from(&[("PORT", ""), ("SERVER_HOST", "  ")])).unwrap();
        assert_eq!(config.server_port, 3000);
        assert_eq!(config.server_host, "0.0.0.0");
    }

    #[test]
    fn invalid_port_is_rejected() {
        let err = Config::from_lookup(lookup_from(&[("PORT", "http")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { name: "PORT", .. }));
    }
}
