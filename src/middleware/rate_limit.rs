//! Fixed-window rate limiting per client address
//!
//! State is bounded: once `capacity` addresses are tracked, expired windows
//! are swept and, if still full, the window closest to expiry is dropped.

use async_trait::async_trait;
use hyper::header::{HeaderValue, RETRY_AFTER};
use std::collections::HashMap;
use std::net::{IpAddr, Ipv4Addr};
use std::sync::Mutex;
use std::time::{Duration, Instant};

use super::{Flow, Middleware};
use crate::config::RateLimitConfig;
use crate::error::DispatchError;
use crate::http::{build_error_response, RequestContext};
use crate::logger;

/// Longest accepted window; larger configured values are clamped
const MAX_WINDOW: Duration = Duration::from_secs(10 * 365 * 24 * 60 * 60);

#[derive(Debug, Clone, Copy)]
struct Window {
    count: u32,
    reset_at: Instant,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateDecision {
    Allowed { remaining: u32 },
    Limited { retry_after: Duration },
}

#[derive(Debug)]
pub struct RateLimiter {
    max_requests: u32,
    window: Duration,
    capacity: usize,
    windows: Mutex<HashMap<IpAddr, Window>>,
}

impl RateLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            max_requests: config.max_requests,
            window: Duration::from_secs(config.window_secs).min(MAX_WINDOW),
            capacity: config.capacity.max(1),
            windows: Mutex::new(HashMap::new()),
        }
    }

    pub fn check(&self, key: IpAddr) -> RateDecision {
        self.check_at(key, Instant::now())
    }

    /// Count one request from `key` at `now`
    pub fn check_at(&self, key: IpAddr, now: Instant) -> RateDecision {
        let Ok(mut windows) = self.windows.lock() else {
            // a poisoned limiter must not take the server down
            return RateDecision::Allowed { remaining: 0 };
        };

        if !windows.contains_key(&key) && windows.len() >= self.capacity {
            self.evict(&mut windows, now);
        }

        let reset_at = self.window_end(now);
        let window = windows.entry(key).or_insert(Window { count: 0, reset_at });
        if now >= window.reset_at {
            *window = Window { count: 0, reset_at };
        }

        if window.count >= self.max_requests {
            return RateDecision::Limited {
                retry_after: window.reset_at.saturating_duration_since(now),
            };
        }
        window.count += 1;
        RateDecision::Allowed {
            remaining: self.max_requests - window.count,
        }
    }

    fn window_end(&self, now: Instant) -> Instant {
        now.checked_add(self.window).unwrap_or(now + MAX_WINDOW)
    }

    /// Make room for one more address
    fn evict(&self, windows: &mut HashMap<IpAddr, Window>, now: Instant) {
        windows.retain(|_, w| w.reset_at > now);
        if windows.len() < self.capacity {
            return;
        }
        let oldest = windows
            .iter()
            .min_by_key(|(_, w)| w.reset_at)
            .map(|(k, _)| *k);
        if let Some(key) = oldest {
            windows.remove(&key);
        }
    }

    pub fn tracked(&self) -> usize {
        self.windows.lock().map(|w| w.len()).unwrap_or(0)
    }
}

/// Middleware answering `429` once a client exceeds its quota
#[derive(Debug)]
pub struct RateLimit {
    limiter: RateLimiter,
}

impl RateLimit {
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            limiter: RateLimiter::new(config),
        }
    }
}

#[async_trait]
impl Middleware for RateLimit {
    fn name(&self) -> &'static str {
        "rate-limit"
    }

    async fn handle(&self, ctx: &mut RequestContext) -> Flow {
        let key = ctx
            .remote_addr
            .map_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED), |addr| addr.ip());

        match self.limiter.check(key) {
            RateDecision::Allowed { .. } => Flow::Proceed,
            RateDecision::Limited { retry_after } => {
                logger::log_warning(&format!("Rate limit exceeded for {key}"));
                let mut response = build_error_response(&DispatchError::RateLimited);
                response
                    .headers_mut()
                    .insert(RETRY_AFTER, HeaderValue::from(retry_after.as_secs().max(1)));
                Flow::Respond(response)
            }
        }
    }
}
