use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

/// Sliding-window request counter keyed by client address.
///
/// Clients whose window has emptied are swept at most once per window, so the
/// key set stays bounded by the clients seen in roughly the last two windows.
#[derive(Debug, Clone)]
pub struct IpRateLimiter {
    inner: Arc<Mutex<LimiterState>>,
    window: Duration,
    max_requests: usize,
}

#[derive(Debug)]
struct LimiterState {
    hits: HashMap<String, VecDeque<Instant>>,
    last_sweep: Instant,
}

impl IpRateLimiter {
    pub fn new(window: Duration, max_requests: usize) -> Self {
        Self {
            inner: Arc::new(Mutex::new(LimiterState {
                hits: HashMap::new(),
                last_sweep: Instant::now(),
            })),
            window,
            max_requests,
        }
    }

    pub fn allow(&self, key: &str) -> bool {
        self.allow_at(key, Instant::now())
    }

    pub fn tracked_keys(&self) -> usize {
        self.inner.lock().hits.len()
    }

    fn allow_at(&self, key: &str, now: Instant) -> bool {
        let mut state = self.inner.lock();

        if now.saturating_duration_since(state.last_sweep) > self.window {
            let window = self.window;
            state.hits.retain(|_, queue| {
                expire(queue, now, window);
                !queue.is_empty()
            });
            state.last_sweep = now;
        }

        let queue = state.hits.entry(key.to_string()).or_default();
        expire(queue, now, self.window);

        if queue.len() >= self.max_requests {
            return false;
        }

        queue.push_back(now);
        true
    }
}

fn expire(queue: &mut VecDeque<Instant>, now: Instant, window: Duration) {
    while let Some(front) = queue.front() {
        if now.saturating_duration_since(*front) > window {
            queue.pop_front();
        } else {
            break;
        }
    }
}
