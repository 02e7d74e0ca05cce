//! Per-client fixed-window rate limiting.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::time::{self, Instant};

use crate::observability::metrics;

/// Length of one counting window.
pub const WINDOW: Duration = Duration::from_secs(60);

/// Request count for one client within the current window.
#[derive(Debug, Clone, Copy)]
struct RateWindow {
    count: u32,
    reset_at: Instant,
}

impl RateWindow {
    fn start(now: Instant) -> Self {
        Self {
            count: 1,
            reset_at: now + WINDOW,
        }
    }
}

/// Admits or rejects requests per client IP.
///
/// One mutex guards the whole map; the critical section is a single lookup
/// and update and is never held across I/O.
pub struct RateLimiter {
    windows: Mutex<HashMap<String, RateWindow>>,
    limit: u32,
}

impl RateLimiter {
    /// Create a limiter admitting `limit` requests per client per minute.
    pub fn new(limit: u32) -> Self {
        Self {
            windows: Mutex::new(HashMap::new()),
            limit,
        }
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    /// Returns true if the request is admitted.
    pub fn admit(&self, client_ip: &str) -> bool {
        self.admit_at(client_ip, Instant::now())
    }

    /// Same as [`admit`](Self::admit) with an explicit clock reading.
    pub fn admit_at(&self, client_ip: &str, now: Instant) -> bool {
        let mut windows = self.windows.lock().expect("rate limiter mutex poisoned");

        match windows.get_mut(client_ip) {
            Some(window) if now < window.reset_at => {
                if window.count >= self.limit {
                    return false;
                }
                window.count += 1;
                true
            }
            // Missing or expired: a fresh window replaces the old one.
            _ => {
                windows.insert(client_ip.to_string(), RateWindow::start(now));
                metrics::record_rate_limit_clients(windows.len());
                true
            }
        }
    }

    /// Drop windows whose reset time has passed. Returns how many were removed.
    ///
    /// An expired window and a missing one both start fresh on the next
    /// request, so sweeping never changes an admission decision.
    pub fn sweep_expired(&self, now: Instant) -> usize {
        let mut windows = self.windows.lock().expect("rate limiter mutex poisoned");
        let before = windows.len();
        windows.retain(|_, window| now < window.reset_at);
        metrics::record_rate_limit_clients(windows.len());
        before - windows.len()
    }

    /// Number of clients currently tracked.
    pub fn tracked_clients(&self) -> usize {
        self.windows.lock().expect("rate limiter mutex poisoned").len()
    }

    /// Periodically sweep expired windows until shutdown.
    pub async fn run_sweeper(&self, interval: Duration, mut shutdown: broadcast::Receiver<()>) {
        let mut ticker = time::interval(interval);
        // The first tick completes immediately.
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let removed = self.sweep_expired(Instant::now());
                    if removed > 0 {
                        tracing::debug!(removed, remaining = self.tracked_clients(), "Swept expired rate limit windows");
                    }
                }
                _ = shutdown.recv() => {
                    tracing::debug!("Rate limit sweeper received shutdown signal");
                    break;
                }
            }
        }
    }
}
