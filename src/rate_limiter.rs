use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

/// Fixed-window request limiter keyed by client identity.
///
/// Each key may make `max_requests` calls per window. The window starts at the
/// first request and resets once it has fully elapsed.
#[derive(Debug, Clone)]
pub struct RateLimiter {
    inner: Arc<Inner>,
}

#[derive(Debug)]
struct Inner {
    max_requests: u32,
    window: Duration,
    windows: Mutex<HashMap<String, Window>>,
}

#[derive(Debug, Clone, Copy)]
struct Window {
    started: Instant,
    count: u32,
}

impl RateLimiter {
    pub fn new(max_requests: u32, window: Duration) -> Self {
        Self {
            inner: Arc::new(Inner {
                max_requests,
                window,
                windows: Mutex::new(HashMap::new()),
            }),
        }
    }

    /// Count a request for `key`. On refusal returns the time until the window resets.
    pub async fn check(&self, key: &str) -> Result<(), Duration> {
        let now = Instant::now();
        let mut windows = self.inner.windows.lock().await;

        // drop expired windows so idle clients don't accumulate
        windows.retain(|_, w| now.duration_since(w.started) < self.inner.window);

        let window = windows.entry(key.to_string()).or_insert(Window {
            started: now,
            count: 0,
        });

        if window.count >= self.inner.max_requests {
            let elapsed = now.duration_since(window.started);
            return Err(self.inner.window.saturating_sub(elapsed));
        }

        window.count += 1;
        Ok(())
    }
}
