//! Fixed-window rate limiting for the lookup endpoint
//!
//! Advisory abuse protection, not a correctness guarantee: counters live
//! in process memory behind an injected store, are never persisted, and
//! reset on restart. Not shared across processes.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Requests admitted per identifier and window.
pub const MAX_REQUESTS: u32 = 120;

/// Window length.
pub const WINDOW: Duration = Duration::from_secs(60);

/// Per-identifier counter with its window expiry.
#[derive(Clone, Copy, Debug)]
pub struct RateLimitEntry {
    pub count: u32,
    pub reset_at: Instant,
}

/// Keyed counter storage with expiry managed by the limiter.
///
/// The seam exists so the backing map can be swapped (and tested) without
/// any module-level state; the default keeps everything inside one owned
/// component.
pub trait CounterStore: Send + Sync {
    fn get(&self, key: &str) -> Option<RateLimitEntry>;
    fn set(&self, key: &str, entry: RateLimitEntry);
    fn remove(&self, key: &str);
}

#[derive(Default)]
pub struct MemoryCounterStore {
    entries: Mutex<HashMap<String, RateLimitEntry>>,
}

impl CounterStore for MemoryCounterStore {
    fn get(&self, key: &str) -> Option<RateLimitEntry> {
        self.entries.lock().unwrap().get(key).copied()
    }

    fn set(&self, key: &str, entry: RateLimitEntry) {
        self.entries.lock().unwrap().insert(key.to_string(), entry);
    }

    fn remove(&self, key: &str) {
        self.entries.lock().unwrap().remove(key);
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RateLimitDecision {
    pub allowed: bool,
    pub remaining: u32,
}

pub struct RateLimiter {
    store: Box<dyn CounterStore>,
    max_requests: u32,
    window: Duration,
}

impl RateLimiter {
    pub fn new() -> Self {
        Self::with_store(Box::new(MemoryCounterStore::default()), MAX_REQUESTS, WINDOW)
    }

    pub fn with_store(store: Box<dyn CounterStore>, max_requests: u32, window: Duration) -> Self {
        Self {
            store,
            max_requests,
            window,
        }
    }

    pub fn check(&self, identifier: &str) -> RateLimitDecision {
        self.check_at(identifier, Instant::now())
    }

    /// Time-parameterized check so window expiry is testable.
    pub fn check_at(&self, identifier: &str, now: Instant) -> RateLimitDecision {
        // Expired windows are discarded before evaluating.
        if let Some(entry) = self.store.get(identifier) {
            if now > entry.reset_at {
                self.store.remove(identifier);
            }
        }

        match self.store.get(identifier) {
            None => {
                self.store.set(
                    identifier,
                    RateLimitEntry {
                        count: 1,
                        reset_at: now + self.window,
                    },
                );
                RateLimitDecision {
                    allowed: true,
                    remaining: self.max_requests - 1,
                }
            }
            Some(entry) if entry.count >= self.max_requests => RateLimitDecision {
                allowed: false,
                remaining: 0,
            },
            Some(mut entry) => {
                entry.count += 1;
                self.store.set(identifier, entry);
                RateLimitDecision {
                    allowed: true,
                    remaining: self.max_requests - entry.count,
                }
            }
        }
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new()
    }
}
