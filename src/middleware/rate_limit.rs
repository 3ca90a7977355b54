use actix_web::{
    body::{BoxBody, MessageBody},
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    Error, HttpResponse,
};
use dashmap::DashMap;
use futures_util::future::LocalBoxFuture;
use std::future::{ready, Ready};
use std::net::IpAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::warn;

pub const GENERAL_LIMIT_MESSAGE: &str = "Too many requests from this IP, please try again later.";
pub const AI_LIMIT_MESSAGE: &str = "Too many AI requests, please slow down.";

struct WindowState {
    count: u32,
    started: Instant,
}

/// Fixed-window request counter keyed by client IP. The window resets fully
/// once it has elapsed; counts are advisory and in-memory only.
#[derive(Clone)]
pub struct FixedWindowLimiter {
    max_requests: u32,
    window: Duration,
    windows: Arc<DashMap<IpAddr, WindowState>>,
}

impl FixedWindowLimiter {
    pub fn new(max_requests: u32, window: Duration) -> Self {
        FixedWindowLimiter {
            max_requests,
            window,
            windows: Arc::new(DashMap::new()),
        }
    }

    /// Record one request from `ip` and report whether it is still within
    /// the window's allowance.
    pub fn check(&self, ip: IpAddr) -> bool {
        let now = Instant::now();
        let mut state = self.windows.entry(ip).or_insert(WindowState {
            count: 0,
            started: now,
        });

        if now.duration_since(state.started) >= self.window {
            state.count = 0;
            state.started = now;
        }

        state.count += 1;
        state.count <= self.max_requests
    }
}

/// Middleware wrapper around a [`FixedWindowLimiter`]. Each instance carries
/// its own rejection message so the general and AI limiters stay
/// distinguishable to clients.
#[derive(Clone)]
pub struct RateLimitMiddleware {
    limiter: FixedWindowLimiter,
    message: &'static str,
}

impl RateLimitMiddleware {
    pub fn new(max_requests: u32, window: Duration, message: &'static str) -> Self {
        RateLimitMiddleware {
            limiter: FixedWindowLimiter::new(max_requests, window),
            message,
        }
    }
}

impl<S, B> Transform<S, ServiceRequest> for RateLimitMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: MessageBody + 'static,
{
    type Response = ServiceResponse<BoxBody>;
    type Error = Error;
    type InitError = ();
    type Transform = RateLimitMiddlewareService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RateLimitMiddlewareService {
            service,
            limiter: self.limiter.clone(),
            message: self.message,
        }))
    }
}

pub struct RateLimitMiddlewareService<S> {
    service: S,
    limiter: FixedWindowLimiter,
    message: &'static str,
}

impl<S, B> Service<ServiceRequest> for RateLimitMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: MessageBody + 'static,
{
    type Response = ServiceResponse<BoxBody>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        // Extract client IP
        let ip = req
            .connection_info()
            .peer_addr()
            .and_then(|addr| addr.split(':').next())
            .and_then(|ip_str| ip_str.parse::<IpAddr>().ok())
            .unwrap_or_else(|| "127.0.0.1".parse().unwrap());

        // Check rate limit
        if !self.limiter.check(ip) {
            warn!(ip = %ip, "Rate limit exceeded");
            let message = self.message;
            let (req, _pl) = req.into_parts();
            let res = HttpResponse::TooManyRequests().json(serde_json::json!({
                "error": message
            }));
            return Box::pin(
                async move { Ok(ServiceResponse::new(req, res).map_into_boxed_body()) },
            );
        }

        let fut = self.service.call(req);
        Box::pin(async move {
            let res = fut.await?;
            Ok(res.map_into_boxed_body())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ip(last: u8) -> IpAddr {
        IpAddr::from([127, 0, 0, last])
    }

    #[test]
    fn test_allows_up_to_limit() {
        let limiter = FixedWindowLimiter::new(20, Duration::from_secs(60));

        for _ in 0..20 {
            assert!(limiter.check(ip(1)));
        }
        // 21st request in the same window is rejected
        assert!(!limiter.check(ip(1)));
    }

    #[test]
    fn test_keys_are_independent() {
        let limiter = FixedWindowLimiter::new(1, Duration::from_secs(60));

        assert!(limiter.check(ip(1)));
        assert!(!limiter.check(ip(1)));
        assert!(limiter.check(ip(2)));
    }

    #[test]
    fn test_window_resets_after_expiry() {
        let limiter = FixedWindowLimiter::new(2, Duration::from_millis(50));

        assert!(limiter.check(ip(3)));
        assert!(limiter.check(ip(3)));
        assert!(!limiter.check(ip(3)));

        std::thread::sleep(Duration::from_millis(60));

        // Full reset, not a gradual refill
        assert!(limiter.check(ip(3)));
        assert!(limiter.check(ip(3)));
        assert!(!limiter.check(ip(3)));
    }

    #[test]
    fn test_rejected_requests_do_not_extend_window() {
        let limiter = FixedWindowLimiter::new(1, Duration::from_millis(50));

        assert!(limiter.check(ip(4)));
        assert!(!limiter.check(ip(4)));
        assert!(!limiter.check(ip(4)));

        std::thread::sleep(Duration::from_millis(60));

        assert!(limiter.check(ip(4)));
    }
}
