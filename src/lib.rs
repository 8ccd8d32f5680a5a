use std::sync::Arc;
use std::time::Instant;

use tokio::task::JoinHandle;

use cache::CacheStore;
use clock::{Clock, SystemClock};
use config::{CACHE_SWEEP_PERIOD, Config, RATE_LIMIT_MAX_REQUESTS, RATE_LIMIT_WINDOW};
use middleware::RateLimiter;
use upstream::{DatasetPage, UpstreamClient};

pub mod cache;
pub mod clock;
pub mod config;
pub mod error;
pub mod middleware;
pub mod router;
pub mod routes;
pub mod upstream;
pub mod utils;

pub use router::create_router;

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub cache: Arc<CacheStore<Arc<DatasetPage>>>,
    pub rate_limiter: Arc<RateLimiter>,
    pub upstream: UpstreamClient,
    pub clock: Arc<dyn Clock>,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(config: Config) -> Result<Self, reqwest::Error> {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    pub fn with_clock(config: Config, clock: Arc<dyn Clock>) -> Result<Self, reqwest::Error> {
        let upstream = UpstreamClient::new(config.upstream_base_url.clone())?;
        Ok(Self {
            cache: Arc::new(CacheStore::new(clock.clone())),
            rate_limiter: Arc::new(RateLimiter::new(
                RATE_LIMIT_MAX_REQUESTS,
                RATE_LIMIT_WINDOW,
                clock.clone(),
            )),
            upstream,
            clock,
            config,
            started_at: Instant::now(),
        })
    }

    pub fn uptime_secs(&self) -> f64 {
        self.started_at.elapsed().as_secs_f64()
    }
}

/// 启动缓存和限流表的后台清理任务
pub fn spawn_background_tasks(state: &AppState) -> Vec<JoinHandle<()>> {
    vec![
        state.cache.spawn_sweeper(CACHE_SWEEP_PERIOD),
        state.rate_limiter.spawn_sweeper(CACHE_SWEEP_PERIOD),
    ]
}
