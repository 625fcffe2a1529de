//! Local request/token budget for providers with tight vendor-side limits.
//!
//! Sliding one-minute windows over request timestamps and token counts, plus
//! a circuit breaker that pauses all traffic for a cooldown after the vendor
//! reports 429. Counters live behind a mutex so concurrent request tasks
//! cannot interleave updates.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use tracing::warn;

#[derive(Debug, Clone, Copy)]
pub struct RateLimitConfig {
    /// Requests per window.
    pub rpm: usize,
    /// Tokens per window (input + output).
    pub tpm: u32,
    pub window: Duration,
}

impl RateLimitConfig {
    /// Groq free-tier limits.
    pub fn groq_free_tier() -> Self {
        Self {
            rpm: 30,
            tpm: 6000,
            window: Duration::from_secs(60),
        }
    }
}

#[derive(Debug, Default)]
struct Windows {
    requests: VecDeque<Instant>,
    tokens: VecDeque<(Instant, u32)>,
    circuit_open_until: Option<Instant>,
}

/// Outcome of a budget check. `Wait` carries a hint for how long until the
/// oldest window entry expires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Budget {
    Allowed,
    Wait(Duration),
}

#[derive(Debug)]
pub struct SlidingWindowLimiter {
    config: RateLimitConfig,
    windows: Mutex<Windows>,
}

impl SlidingWindowLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            config,
            windows: Mutex::new(Windows::default()),
        }
    }

    /// Checks whether a request with `estimated_tokens` fits the current
    /// budget. Does not reserve; callers record actual usage after the call.
    pub fn check(&self, estimated_tokens: u32) -> Budget {
        let now = Instant::now();
        let mut w = self.windows.lock().unwrap();
        Self::prune(&mut w, now, self.config.window);

        if let Some(until) = w.circuit_open_until {
            if now < until {
                return Budget::Wait(until - now);
            }
            w.circuit_open_until = None;
        }

        if w.requests.len() >= self.config.rpm {
            let oldest = *w.requests.front().expect("rpm window non-empty");
            warn!(
                used = w.requests.len(),
                limit = self.config.rpm,
                "request budget exhausted"
            );
            return Budget::Wait(Self::until_expiry(oldest, now, self.config.window));
        }

        let used: u32 = w.tokens.iter().map(|(_, n)| n).sum();
        if used.saturating_add(estimated_tokens) > self.config.tpm {
            warn!(
                used,
                estimated = estimated_tokens,
                limit = self.config.tpm,
                "token budget exhausted"
            );
            let hint = w
                .tokens
                .front()
                .map(|(t, _)| Self::until_expiry(*t, now, self.config.window))
                .unwrap_or(self.config.window);
            return Budget::Wait(hint);
        }

        Budget::Allowed
    }

    /// Records actual usage for a completed request.
    pub fn record(&self, tokens: u32) {
        let now = Instant::now();
        let mut w = self.windows.lock().unwrap();
        w.requests.push_back(now);
        w.tokens.push_back((now, tokens));
    }

    /// Trips the circuit breaker, pausing all traffic for `cooldown`.
    pub fn trip(&self, cooldown: Duration) {
        warn!(cooldown_ms = cooldown.as_millis() as u64, "circuit breaker tripped");
        let mut w = self.windows.lock().unwrap();
        w.circuit_open_until = Some(Instant::now() + cooldown);
    }

    fn prune(w: &mut Windows, now: Instant, window: Duration) {
        let expired = |t: Instant| now.duration_since(t) > window;
        while w.requests.front().is_some_and(|&t| expired(t)) {
            w.requests.pop_front();
        }
        while w.tokens.front().is_some_and(|&(t, _)| expired(t)) {
            w.tokens.pop_front();
        }
    }

    fn until_expiry(entry: Instant, now: Instant, window: Duration) -> Duration {
        (entry + window)
            .checked_duration_since(now)
            .unwrap_or(Duration::from_millis(1))
    }
}
