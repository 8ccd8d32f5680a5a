use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::{HeaderMap, HeaderValue, Request, StatusCode, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::Serialize;
use tokio::task::JoinHandle;

use crate::clock::Clock;
use crate::config::RATE_LIMIT_RETRY_AFTER_SECS;
use crate::utils::iso_timestamp;

const RATE_LIMIT_MESSAGE: &str =
    "Muitas requisições deste IP, tente novamente em 15 minutos.";

#[derive(Debug, Clone, Copy)]
struct RateWindow {
    count: u32,
    window_start: DateTime<Utc>,
}

/// 一次准入判断的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateDecision {
    pub allowed: bool,
    pub limit: u32,
    pub remaining: u32,
    /// 距窗口结束的秒数
    pub reset_after_secs: u64,
}

#[derive(Serialize)]
struct RateLimitedResponse {
    success: bool,
    error: &'static str,
    retry_after: u64,
    timestamp: String,
}

/// 按客户端地址的固定窗口计数
pub struct RateLimiter {
    windows: DashMap<String, RateWindow>,
    max_requests: u32,
    window: Duration,
    clock: Arc<dyn Clock>,
}

impl RateLimiter {
    pub fn new(max_requests: u32, window: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            windows: DashMap::new(),
            max_requests,
            window,
            clock,
        }
    }

    /// 计数加一并判断是否放行
    ///
    /// 窗口到期才重置；被拒绝的请求同样计数，不会提前重置窗口。
    pub fn check(&self, client: &str) -> RateDecision {
        let now = self.clock.now();
        let window = chrono::Duration::milliseconds(self.window.as_millis() as i64);

        let mut entry = self
            .windows
            .entry(client.to_string())
            .or_insert(RateWindow {
                count: 0,
                window_start: now,
            });
        if now - entry.window_start >= window {
            entry.count = 0;
            entry.window_start = now;
        }
        entry.count = entry.count.saturating_add(1);
        let RateWindow {
            count,
            window_start,
        } = *entry;
        drop(entry);

        let reset_after = (window_start + window - now).num_seconds().max(0) as u64;
        RateDecision {
            allowed: count <= self.max_requests,
            limit: self.max_requests,
            remaining: self.max_requests.saturating_sub(count),
            reset_after_secs: reset_after,
        }
    }

    /// 当前窗口内的计数，窗口已过期视为 0
    pub fn current_count(&self, client: &str) -> u32 {
        let now = self.clock.now();
        let window = chrono::Duration::milliseconds(self.window.as_millis() as i64);
        self.windows
            .get(client)
            .filter(|w| now - w.window_start < window)
            .map(|w| w.count)
            .unwrap_or(0)
    }

    /// 删除已到期的窗口，返回删除数量
    pub fn purge_expired(&self) -> usize {
        let now = self.clock.now();
        let window = chrono::Duration::milliseconds(self.window.as_millis() as i64);
        let mut removed = 0;
        self.windows.retain(|_, w| {
            let active = now - w.window_start < window;
            if !active {
                removed += 1;
            }
            active
        });
        removed
    }

    pub fn spawn_sweeper(self: &Arc<Self>, period: Duration) -> JoinHandle<()> {
        let limiter = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
            loop {
                ticker.tick().await;
                let removed = limiter.purge_expired();
                if removed > 0 {
                    tracing::debug!("rate limiter dropped {} idle windows", removed);
                }
            }
        })
    }

    pub async fn check_rate_limit(self: Arc<Self>, req: Request<Body>, next: Next) -> Response {
        let client = client_address(&req);
        let decision = self.check(&client);

        if !decision.allowed {
            tracing::warn!("rate limit exceeded for {}", client);
            let body = axum::Json(RateLimitedResponse {
                success: false,
                error: RATE_LIMIT_MESSAGE,
                retry_after: RATE_LIMIT_RETRY_AFTER_SECS,
                timestamp: iso_timestamp(self.clock.now()),
            });
            let mut response = (StatusCode::TOO_MANY_REQUESTS, body).into_response();
            let headers = response.headers_mut();
            headers.insert(
                header::RETRY_AFTER,
                HeaderValue::from(RATE_LIMIT_RETRY_AFTER_SECS),
            );
            insert_rate_headers(headers, &decision);
            return response;
        }

        let mut response = next.run(req).await;
        insert_rate_headers(response.headers_mut(), &decision);
        response
    }
}

fn insert_rate_headers(headers: &mut HeaderMap, decision: &RateDecision) {
    headers.insert("ratelimit-limit", HeaderValue::from(decision.limit));
    headers.insert("ratelimit-remaining", HeaderValue::from(decision.remaining));
    headers.insert("ratelimit-reset", HeaderValue::from(decision.reset_after_secs));
}

/// 优先使用 TCP 对端地址；没有连接信息时才读代理头
fn client_address(req: &Request<Body>) -> String {
    if let Some(ConnectInfo(addr)) = req.extensions().get::<ConnectInfo<SocketAddr>>() {
        return addr.ip().to_string();
    }

    req.headers()
        .get("x-forwarded-for")
        .and_then(|h| h.to_str().ok())
        .and_then(|s| s.split(',').map(str::trim).find(|ip| !ip.is_empty()))
        .or_else(|| {
            req.headers()
                .get("x-real-ip")
                .and_then(|h| h.to_str().ok())
                .map(str::trim)
                .filter(|ip| !ip.is_empty())
        })
        .unwrap_or("unknown")
        .to_string()
}

pub async fn rate_limit(
    State(limiter): State<Arc<RateLimiter>>,
    req: Request<Body>,
    next: Next,
) -> Response {
    limiter.check_rate_limit(req, next).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;

    const WINDOW: Duration = Duration::from_secs(15 * 60);

    fn limiter(max: u32) -> (RateLimiter, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::default());
        (RateLimiter::new(max, WINDOW, clock.clone()), clock)
    }

    #[test]
    fn admits_up_to_limit_then_rejects() {
        let (limiter, _) = limiter(500);
        for i in 1..=500 {
            let decision = limiter.check("10.0.0.1");
            assert!(decision.allowed, "request {i} should be admitted");
            assert_eq!(decision.remaining, 500 - i);
        }
        let decision = limiter.check("10.0.0.1");
        assert!(!decision.allowed);
        assert_eq!(decision.remaining, 0);
    }

    #[test]
    fn rejection_does_not_reset_window() {
        let (limiter, clock) = limiter(2);
        limiter.check("a");
        limiter.check("a");
        clock.advance(Duration::from_secs(600));
        assert!(!limiter.check("a").allowed);
        assert!(!limiter.check("a").allowed);
        assert_eq!(limiter.current_count("a"), 4);

        clock.advance(Duration::from_secs(299));
        assert!(!limiter.check("a").allowed);
    }

    #[test]
    fn counting_restarts_after_window() {
        let (limiter, clock) = limiter(500);
        for _ in 0..501 {
            limiter.check("a");
        }
        clock.advance(WINDOW);
        let decision = limiter.check("a");
        assert!(decision.allowed);
        assert_eq!(limiter.current_count("a"), 1);
        assert_eq!(decision.reset_after_secs, WINDOW.as_secs());
    }

    #[test]
    fn concurrent_checks_are_counted_exactly() {
        use std::sync::atomic::{AtomicU32, Ordering};

        const THREADS: u32 = 8;
        const PER_THREAD: u32 = 50;
        const LIMIT: u32 = THREADS * PER_THREAD - 37;

        let (limiter, _) = limiter(LIMIT);
        let admitted = AtomicU32::new(0);
        std::thread::scope(|s| {
            for _ in 0..THREADS {
                s.spawn(|| {
                    for _ in 0..PER_THREAD {
                        if limiter.check("a").allowed {
                            admitted.fetch_add(1, Ordering::SeqCst);
                        }
                    }
                });
            }
        });

        assert_eq!(admitted.load(Ordering::SeqCst), LIMIT);
        assert_eq!(limiter.current_count("a"), THREADS * PER_THREAD);
    }

    #[test]
    fn addresses_are_counted_separately() {
        let (limiter, _) = limiter(1);
        assert!(limiter.check("a").allowed);
        assert!(!limiter.check("a").allowed);
        assert!(limiter.check("b").allowed);
    }

    #[test]
    fn reset_hint_counts_down() {
        let (limiter, clock) = limiter(10);
        limiter.check("a");
        clock.advance(Duration::from_secs(100));
        assert_eq!(limiter.check("a").reset_after_secs, 800);
    }

    #[test]
    fn purge_drops_only_elapsed_windows() {
        let (limiter, clock) = limiter(10);
        limiter.check("old");
        clock.advance(Duration::from_secs(600));
        limiter.check("new");
        clock.advance(Duration::from_secs(300));

        assert_eq!(limiter.purge_expired(), 1);
        assert_eq!(limiter.current_count("old"), 0);
        assert_eq!(limiter.current_count("new"), 1);
    }

    #[test]
    fn client_address_prefers_peer_address() {
        let mut req = Request::builder()
            .header("x-forwarded-for", "203.0.113.9")
            .body(Body::empty())
            .unwrap();
        assert_eq!(client_address(&req), "203.0.113.9");

        req.extensions_mut()
            .insert(ConnectInfo(SocketAddr::from(([192, 0, 2, 1], 4000))));
        assert_eq!(client_address(&req), "192.0.2.1");
    }

    #[test]
    fn client_address_falls_back_to_unknown() {
        let req = Request::builder().body(Body::empty()).unwrap();
        assert_eq!(client_address(&req), "unknown");

        let req = Request::builder()
            .header("x-forwarded-for", " , 198.51.100.7, 10.0.0.1")
            .body(Body::empty())
            .unwrap();
        assert_eq!(client_address(&req), "198.51.100.7");
    }
}
