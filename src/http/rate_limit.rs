//! Per-address sliding-window rate limiter for `/api/ask`.
//!
//! Keeps the timestamps of recent hits for each client IP. A hit is allowed
//! while fewer than `max_requests` timestamps fall inside the trailing
//! `window`. State lives in memory for the life of the process.

use std::collections::{HashMap, VecDeque};
use std::net::IpAddr;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use crate::config::RateLimitConfig;

/// Above this many tracked addresses, idle entries are swept on the next hit.
const SWEEP_THRESHOLD: usize = 1024;

#[derive(Debug)]
pub struct RateLimiter {
    max_requests: usize,
    window: Duration,
    hits: Mutex<HashMap<IpAddr, VecDeque<Instant>>>,
}

impl RateLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            max_requests: config.max_requests,
            window: config.window,
            hits: Mutex::new(HashMap::new()),
        }
    }

    /// Record a hit from `key` now. `Err` carries how long until the oldest
    /// hit in the window expires.
    pub fn check(&self, key: IpAddr) -> Result<(), Duration> {
        self.check_at(key, Instant::now())
    }

    /// [`RateLimiter::check`] with an explicit clock.
    pub fn check_at(&self, key: IpAddr, now: Instant) -> Result<(), Duration> {
        let mut hits = self.hits.lock().unwrap_or_else(|poisoned| poisoned.into_inner());

        if hits.len() > SWEEP_THRESHOLD {
            let window = self.window;
            hits.retain(|_, q| q.back().is_some_and(|t| now.saturating_duration_since(*t) < window));
        }

        let queue = hits.entry(key).or_default();
        while queue
            .front()
            .is_some_and(|t| now.saturating_duration_since(*t) >= self.window)
        {
            queue.pop_front();
        }

        if queue.len() >= self.max_requests {
            let oldest = queue.front().copied().unwrap_or(now);
            let retry_after = self.window.saturating_sub(now.saturating_duration_since(oldest));
            return Err(retry_after);
        }

        queue.push_back(now);
        Ok(())
    }

    /// Number of addresses currently tracked.
    pub fn tracked(&self) -> usize {
        self.hits.lock().unwrap_or_else(|poisoned| poisoned.into_inner()).len()
    }
}
