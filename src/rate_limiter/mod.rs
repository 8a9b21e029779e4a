/*!
 * # Rate Limiting Module
 *
 * Sliding-window rate limiter keyed by caller IP, applied in front of the
 * API as a tower layer. The window estimate weighs the previous window's
 * count by the unelapsed fraction of the current window, so bursts at a
 * window boundary cannot double the allowed rate.
 *
 * Counters live in an in-memory map by default; a Redis backend can be
 * enabled so limits hold across multiple server instances. Redis failures
 * fall back to the in-memory store rather than rejecting traffic.
 */
use axum::{
    extract::Request,
    http::{Response, StatusCode},
};
use dashmap::DashMap;
use metrics::counter;
use redis::AsyncCommands;
use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};
use thiserror::Error;
use tracing::warn;

/// Helper function to convert a number to a HeaderValue. Numeric strings are
/// always valid ASCII header values.
fn num_to_header_value<T: ToString>(n: T) -> http::HeaderValue {
    http::HeaderValue::from_str(&n.to_string())
        .unwrap_or_else(|_| http::HeaderValue::from_static("0"))
}

#[derive(Debug, Error)]
pub enum RateLimitError {
    #[error("Rate limit exceeded")]
    LimitExceeded,
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("Internal error: {0}")]
    InternalError(String),
}

/// Per-key counters for two adjacent windows.
#[derive(Debug, Clone)]
struct SlidingWindowEntry {
    window_start: Instant,
    current: u32,
    previous: u32,
}

impl SlidingWindowEntry {
    fn new() -> Self {
        Self {
            window_start: Instant::now(),
            current: 0,
            previous: 0,
        }
    }

    /// Roll the window boundaries forward so `window_start` covers `now`.
    fn advance(&mut self, now: Instant, window: Duration) {
        let mut elapsed = now.duration_since(self.window_start);
        if elapsed >= window + window {
            self.previous = 0;
            self.current = 0;
            self.window_start = now;
            return;
        }
        while elapsed >= window {
            self.previous = self.current;
            self.current = 0;
            self.window_start += window;
            elapsed -= window;
        }
    }

    /// Weighted request count over the sliding window, including this request.
    fn estimate(&self, now: Instant, window: Duration) -> f64 {
        let elapsed = now.duration_since(self.window_start).as_secs_f64();
        let weight = 1.0 - (elapsed / window.as_secs_f64()).min(1.0);
        self.previous as f64 * weight + self.current as f64 + 1.0
    }

    fn time_until_reset(&self, now: Instant, window: Duration) -> Duration {
        let elapsed = now.duration_since(self.window_start);
        window.saturating_sub(elapsed)
    }
}

#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    pub requests_per_window: u32,
    pub window_duration: Duration,
    pub enable_headers: bool,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            requests_per_window: 100,
            window_duration: Duration::from_secs(60),
            enable_headers: true,
        }
    }
}

#[derive(Clone)]
pub enum RateLimitBackend {
    InMemory,
    Redis {
        client: Arc<redis::Client>,
        namespace: String,
    },
}

impl Default for RateLimitBackend {
    fn default() -> Self {
        Self::InMemory
    }
}

#[derive(Clone)]
enum RateLimitStore {
    InMemory {
        entries: Arc<DashMap<String, SlidingWindowEntry>>,
    },
    Redis {
        client: Arc<redis::Client>,
        namespace: String,
        fallback: Arc<DashMap<String, SlidingWindowEntry>>,
    },
}

#[derive(Clone)]
pub struct RateLimiter {
    store: RateLimitStore,
    config: RateLimitConfig,
}

impl RateLimiter {
    pub fn new(config: RateLimitConfig, backend: RateLimitBackend) -> Self {
        let store = match backend {
            RateLimitBackend::InMemory => RateLimitStore::InMemory {
                entries: Arc::new(DashMap::new()),
            },
            RateLimitBackend::Redis { client, namespace } => RateLimitStore::Redis {
                client,
                namespace,
                fallback: Arc::new(DashMap::new()),
            },
        };

        Self { store, config }
    }

    pub fn in_memory(config: RateLimitConfig) -> Self {
        Self::new(config, RateLimitBackend::InMemory)
    }

    pub fn config(&self) -> &RateLimitConfig {
        &self.config
    }

    /// Re-use this limiter's store with a different limit/window.
    pub fn with_config(&self, config: RateLimitConfig) -> Self {
        Self {
            store: self.store.clone(),
            config,
        }
    }

    pub async fn check_rate_limit(&self, key: &str) -> Result<RateLimitResult, RateLimitError> {
        self.check_with_config(key, &self.config).await
    }

    async fn check_with_config(
        &self,
        key: &str,
        config: &RateLimitConfig,
    ) -> Result<RateLimitResult, RateLimitError> {
        match &self.store {
            RateLimitStore::InMemory { entries } => Ok(Self::check_in_memory(entries, key, config)),
            RateLimitStore::Redis {
                client,
                namespace,
                fallback,
            } => match client.get_async_connection().await {
                Ok(mut conn) => {
                    match Self::check_with_redis(&mut conn, namespace, key, config).await {
                        Ok(result) => Ok(result),
                        Err(err) => {
                            warn!("Redis rate limit error: {}", err);
                            Ok(Self::check_in_memory(fallback, key, config))
                        }
                    }
                }
                Err(err) => {
                    warn!(
                        "Failed to connect to Redis for rate limiting, using fallback: {}",
                        err
                    );
                    Ok(Self::check_in_memory(fallback, key, config))
                }
            },
        }
    }

    fn check_in_memory(
        entries: &DashMap<String, SlidingWindowEntry>,
        key: &str,
        config: &RateLimitConfig,
    ) -> RateLimitResult {
        let now = Instant::now();
        let mut entry = entries
            .entry(key.to_string())
            .or_insert_with(SlidingWindowEntry::new);

        entry.advance(now, config.window_duration);

        let estimate = entry.estimate(now, config.window_duration);
        if estimate > config.requests_per_window as f64 {
            return RateLimitResult {
                allowed: false,
                limit: config.requests_per_window,
                remaining: 0,
                reset_time: entry.time_until_reset(now, config.window_duration),
            };
        }

        entry.current += 1;
        let remaining = (config.requests_per_window as f64 - estimate).max(0.0) as u32;

        RateLimitResult {
            allowed: true,
            limit: config.requests_per_window,
            remaining,
            reset_time: entry.time_until_reset(now, config.window_duration),
        }
    }

    /// Redis variant keeps one counter per window index and weighs the
    /// previous window's counter, mirroring the in-memory math.
    async fn check_with_redis<C>(
        conn: &mut C,
        namespace: &str,
        key: &str,
        config: &RateLimitConfig,
    ) -> Result<RateLimitResult, redis::RedisError>
    where
        C: redis::aio::ConnectionLike + Send,
    {
        let window_secs = config.window_duration.as_secs().max(1);
        let now_secs = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs();
        let window_index = now_secs / window_secs;
        let elapsed_fraction = (now_secs % window_secs) as f64 / window_secs as f64;

        let current_key = format!("{}:{}:{}", namespace, key, window_index);
        let previous_key = format!("{}:{}:{}", namespace, key, window_index - 1);

        let previous: u32 = conn.get(&previous_key).await.unwrap_or(0);
        let current: u32 = conn.get(&current_key).await.unwrap_or(0);

        let estimate = previous as f64 * (1.0 - elapsed_fraction) + current as f64 + 1.0;
        let allowed = estimate <= config.requests_per_window as f64;

        if allowed {
            let count: u32 = conn.incr(&current_key, 1).await?;
            if count == 1 {
                let _: Result<(), _> = conn
                    .expire(&current_key, (window_secs * 2) as usize)
                    .await;
            }
        }

        let remaining = if allowed {
            (config.requests_per_window as f64 - estimate).max(0.0) as u32
        } else {
            0
        };
        let reset_secs = window_secs - (now_secs % window_secs);

        Ok(RateLimitResult {
            allowed,
            limit: config.requests_per_window,
            remaining,
            reset_time: Duration::from_secs(reset_secs),
        })
    }

    /// Drop in-memory entries that have been idle for two full windows.
    pub async fn cleanup_expired(&self) {
        let entries = match &self.store {
            RateLimitStore::InMemory { entries } => entries,
            RateLimitStore::Redis { fallback, .. } => fallback,
        };
        let now = Instant::now();
        let horizon = self.config.window_duration * 2;
        entries.retain(|_, entry| now.duration_since(entry.window_start) < horizon);
    }
}

#[derive(Debug)]
pub struct RateLimitResult {
    pub allowed: bool,
    pub limit: u32,
    pub remaining: u32,
    pub reset_time: Duration,
}

/// Per-path-prefix limit override, optionally restricted to one HTTP method.
#[derive(Clone, Debug)]
pub struct PathPolicy {
    pub prefix: String,
    pub method: Option<http::Method>,
    pub requests_per_window: u32,
    pub window_duration: Duration,
}

/// Rate limit key for a request: the caller IP taken from the usual proxy
/// headers.
pub fn extract_ip_key(request: &Request) -> String {
    if let Some(forwarded) = request.headers().get("x-forwarded-for") {
        if let Ok(forwarded_str) = forwarded.to_str() {
            if let Some(ip) = forwarded_str.split(',').next() {
                return format!("ip:{}", ip.trim());
            }
        }
    }

    if let Some(real_ip) = request.headers().get("x-real-ip") {
        if let Ok(ip_str) = real_ip.to_str() {
            return format!("ip:{}", ip_str);
        }
    }

    "ip:unknown".to_string()
}

// Layer implementation for tower
#[derive(Clone)]
pub struct RateLimitLayer {
    rate_limiter: RateLimiter,
    path_policies: Arc<Vec<PathPolicy>>,
}

impl RateLimitLayer {
    pub fn new(config: RateLimitConfig, backend: RateLimitBackend) -> Self {
        Self {
            rate_limiter: RateLimiter::new(config, backend),
            path_policies: Arc::new(Vec::new()),
        }
    }

    pub fn with_policies(mut self, policies: Vec<PathPolicy>) -> Self {
        self.path_policies = Arc::new(policies);
        self
    }
}

impl<S> tower::Layer<S> for RateLimitLayer {
    type Service = RateLimitService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        RateLimitService {
            inner,
            rate_limiter: self.rate_limiter.clone(),
            path_policies: self.path_policies.clone(),
        }
    }
}

#[derive(Clone)]
pub struct RateLimitService<S> {
    inner: S,
    rate_limiter: RateLimiter,
    path_policies: Arc<Vec<PathPolicy>>,
}

impl<S> tower::Service<Request> for RateLimitService<S>
where
    S: tower::Service<Request, Response = Response<axum::body::Body>> + Clone + Send + 'static,
    S::Future: Send + 'static,
{
    type Response = Response<axum::body::Body>;
    type Error = S::Error;
    type Future = std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<Self::Response, Self::Error>> + Send>,
    >;

    fn poll_ready(
        &mut self,
        cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, request: Request) -> Self::Future {
        let rate_limiter = self.rate_limiter.clone();
        let mut inner = self.inner.clone();
        let policies = self.path_policies.clone();

        Box::pin(async move {
            // Health and documentation endpoints are never limited
            let path = request.uri().path().to_string();
            if path.starts_with("/health")
                || path.starts_with("/swagger-ui")
                || path.starts_with("/api-docs")
            {
                return inner.call(request).await;
            }

            let mut key = extract_ip_key(&request);

            // Path policy overrides the global limit. The counter key is
            // scoped to the policy prefix so unrelated traffic from the same
            // caller does not consume the policy's budget.
            let mut effective = rate_limiter.config().clone();
            for p in policies.iter() {
                let method_matches = p.method.as_ref().map_or(true, |m| m == request.method());
                if method_matches && path.starts_with(&p.prefix) {
                    effective.requests_per_window = p.requests_per_window;
                    effective.window_duration = p.window_duration;
                    key = format!("{}:{}", p.prefix, key);
                    break;
                }
            }

            let limiter = if effective.requests_per_window
                != rate_limiter.config().requests_per_window
                || effective.window_duration != rate_limiter.config().window_duration
            {
                rate_limiter.with_config(effective)
            } else {
                rate_limiter.clone()
            };

            match limiter.check_rate_limit(&key).await {
                Ok(result) => {
                    if !result.allowed {
                        warn!("Rate limit exceeded for key: {}", key);
                        counter!(
                            "rate_limit_denied_total",
                            1,
                            "path" => path.clone(),
                        );

                        let body = serde_json::json!({
                            "status": "error",
                            "message": "You have reached the maximum number of requests. Please try again later.",
                            "limit": result.limit,
                            "remaining": result.remaining,
                            "reset": result.reset_time.as_secs(),
                        });
                        let mut response = Response::new(axum::body::Body::from(body.to_string()));
                        *response.status_mut() = StatusCode::TOO_MANY_REQUESTS;
                        response.headers_mut().insert(
                            http::header::CONTENT_TYPE,
                            http::HeaderValue::from_static("application/json"),
                        );

                        if limiter.config().enable_headers {
                            let headers = response.headers_mut();
                            headers.insert("X-RateLimit-Limit", num_to_header_value(result.limit));
                            headers.insert("X-RateLimit-Remaining", num_to_header_value(0));
                            headers.insert(
                                "X-RateLimit-Reset",
                                num_to_header_value(result.reset_time.as_secs()),
                            );
                        }

                        return Ok(response);
                    }

                    let mut response = inner.call(request).await?;

                    if limiter.config().enable_headers {
                        let headers = response.headers_mut();
                        headers.insert("X-RateLimit-Limit", num_to_header_value(result.limit));
                        headers.insert(
                            "X-RateLimit-Remaining",
                            num_to_header_value(result.remaining),
                        );
                        headers.insert(
                            "X-RateLimit-Reset",
                            num_to_header_value(result.reset_time.as_secs()),
                        );
                    }

                    Ok(response)
                }
                Err(e) => {
                    warn!("Rate limiter error: {}", e);
                    inner.call(request).await
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(limit: u32, window_ms: u64) -> RateLimitConfig {
        RateLimitConfig {
            requests_per_window: limit,
            window_duration: Duration::from_millis(window_ms),
            enable_headers: true,
        }
    }

    #[tokio::test]
    async fn allows_requests_under_the_limit() {
        let limiter = RateLimiter::in_memory(config(5, 60_000));

        for _ in 0..5 {
            let result = limiter.check_rate_limit("ip:10.0.0.1").await.unwrap();
            assert!(result.allowed);
        }
    }

    #[tokio::test]
    async fn denies_requests_over_the_limit() {
        let limiter = RateLimiter::in_memory(config(3, 60_000));

        for _ in 0..3 {
            assert!(limiter.check_rate_limit("ip:10.0.0.2").await.unwrap().allowed);
        }
        let denied = limiter.check_rate_limit("ip:10.0.0.2").await.unwrap();
        assert!(!denied.allowed);
        assert_eq!(denied.remaining, 0);
    }

    #[tokio::test]
    async fn keys_are_independent() {
        let limiter = RateLimiter::in_memory(config(1, 60_000));

        assert!(limiter.check_rate_limit("ip:10.0.0.3").await.unwrap().allowed);
        assert!(!limiter.check_rate_limit("ip:10.0.0.3").await.unwrap().allowed);
        assert!(limiter.check_rate_limit("ip:10.0.0.4").await.unwrap().allowed);
    }

    #[tokio::test]
    async fn window_decay_allows_requests_again() {
        let limiter = RateLimiter::in_memory(config(2, 50));

        assert!(limiter.check_rate_limit("ip:10.0.0.5").await.unwrap().allowed);
        assert!(limiter.check_rate_limit("ip:10.0.0.5").await.unwrap().allowed);
        assert!(!limiter.check_rate_limit("ip:10.0.0.5").await.unwrap().allowed);

        // After two full windows the previous window no longer contributes.
        tokio::time::sleep(Duration::from_millis(120)).await;
        assert!(limiter.check_rate_limit("ip:10.0.0.5").await.unwrap().allowed);
    }

    #[tokio::test]
    async fn boundary_burst_is_smoothed_by_previous_window() {
        let limiter = RateLimiter::in_memory(config(4, 1_000));

        for _ in 0..4 {
            assert!(limiter.check_rate_limit("ip:10.0.0.6").await.unwrap().allowed);
        }

        // Halfway into the next window the previous one still weighs in at
        // ~0.5, so a fresh full burst must not be admitted in one go.
        tokio::time::sleep(Duration::from_millis(1_500)).await;
        let first = limiter.check_rate_limit("ip:10.0.0.6").await.unwrap();
        assert!(first.allowed);
        let mut denied = false;
        for _ in 0..3 {
            if !limiter.check_rate_limit("ip:10.0.0.6").await.unwrap().allowed {
                denied = true;
            }
        }
        assert!(denied);
    }
}
