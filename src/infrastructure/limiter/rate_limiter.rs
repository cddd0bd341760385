use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use dashmap::DashMap;
use parking_lot::Mutex;
use tokio::time::sleep;

/// Outcome of a rate-limit check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Allowed,
    Denied { retry_after: Duration },
}

#[derive(Debug)]
struct WindowEntry {
    count: u32,
    window_reset_at: Instant,
}

/// Fixed-window counter per client key, kept in process memory. Counters
/// reset on restart and are not shared across instances; the limiter is
/// best-effort only. The read-check-write runs under the per-key mutex so
/// two concurrent requests cannot both slip past the limit.
#[derive(Clone)]
pub struct RateLimiterStore {
    map: Arc<DashMap<String, Arc<Mutex<WindowEntry>>>>,
    window: Duration,
    max_per_window: u32,
}

impl RateLimiterStore {
    pub fn new(window: Duration, max_per_window: u32) -> Self {
        RateLimiterStore {
            map: Arc::new(DashMap::new()),
            window,
            max_per_window,
        }
    }

    pub fn check(&self, key: &str) -> Decision {
        self.check_at(key, Instant::now())
    }

    fn check_at(&self, key: &str, now: Instant) -> Decision {
        let entry = self.entry(key, now);
        let mut entry = entry.lock();

        if now >= entry.window_reset_at {
            entry.count = 1;
            entry.window_reset_at = now + self.window;
            return Decision::Allowed;
        }
        if entry.count >= self.max_per_window {
            return Decision::Denied {
                retry_after: entry.window_reset_at - now,
            };
        }
        entry.count += 1;
        Decision::Allowed
    }

    fn entry(&self, key: &str, now: Instant) -> Arc<Mutex<WindowEntry>> {
        if let Some(existing) = self.map.get(key) {
            return existing.clone();
        }
        // Fresh entries start expired; check_at opens the window.
        let fresh = Arc::new(Mutex::new(WindowEntry {
            count: 0,
            window_reset_at: now,
        }));
        match self.map.entry(key.to_string()) {
            dashmap::mapref::entry::Entry::Occupied(entry) => entry.get().clone(),
            dashmap::mapref::entry::Entry::Vacant(entry) => {
                entry.insert(fresh.clone());
                fresh
            }
        }
    }

    /// Drops every entry whose window has expired. Returns how many were
    /// removed.
    pub fn sweep(&self, now: Instant) -> usize {
        let expired: Vec<String> = self
            .map
            .iter()
            .filter_map(|entry| {
                let e = entry.value().lock();
                if now >= e.window_reset_at {
                    Some(entry.key().clone())
                } else {
                    None
                }
            })
            .collect();

        let removed = expired.len();
        for key in expired {
            self.map.remove(&key);
        }
        removed
    }

    /// Periodically reclaims expired entries so the table does not grow
    /// with one entry per client address forever. Must be called from
    /// within a tokio runtime.
    pub fn spawn_sweeper(&self, interval: Duration) {
        let store = self.clone();
        tokio::spawn(async move {
            loop {
                sleep(interval).await;
                let removed = store.sweep(Instant::now());
                if removed > 0 {
                    tracing::debug!(removed, "swept expired rate-limit entries");
                }
            }
        });
    }

    #[cfg(test)]
    fn tracked_keys(&self) -> usize {
        self.map.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WINDOW: Duration = Duration::from_millis(60_000);

    fn store() -> RateLimiterStore {
        RateLimiterStore::new(WINDOW, 3)
    }

    #[test]
    fn first_three_requests_pass_the_fourth_is_denied() {
        let store = store();
        let now = Instant::now();

        for i in 0..3 {
            assert_eq!(
                store.check_at("203.0.113.5", now + Duration::from_secs(i)),
                Decision::Allowed
            );
        }

        match store.check_at("203.0.113.5", now + Duration::from_secs(3)) {
            Decision::Denied { retry_after } => {
                assert!(retry_after > Duration::ZERO);
                assert!(retry_after <= WINDOW);
            }
            Decision::Allowed => panic!("fourth request in window must be denied"),
        }
    }

    #[test]
    fn keys_are_limited_independently() {
        let store = store();
        let now = Instant::now();

        for _ in 0..3 {
            store.check_at("a", now);
        }
        assert!(matches!(
            store.check_at("a", now),
            Decision::Denied { .. }
        ));
        assert_eq!(store.check_at("b", now), Decision::Allowed);
    }

    #[test]
    fn an_expired_window_starts_a_fresh_count() {
        let store = store();
        let now = Instant::now();

        for _ in 0..3 {
            store.check_at("key", now);
        }
        assert!(matches!(store.check_at("key", now), Decision::Denied { .. }));

        let later = now + WINDOW + Duration::from_millis(1);
        assert_eq!(store.check_at("key", later), Decision::Allowed);
        // The reset really was a reset: two more fit into the new window.
        assert_eq!(store.check_at("key", later), Decision::Allowed);
        assert_eq!(store.check_at("key", later), Decision::Allowed);
        assert!(matches!(store.check_at("key", later), Decision::Denied { .. }));
    }

    #[test]
    fn retry_after_shrinks_as_the_window_ages() {
        let store = store();
        let now = Instant::now();

        for _ in 0..3 {
            store.check_at("key", now);
        }
        let early = match store.check_at("key", now + Duration::from_secs(10)) {
            Decision::Denied { retry_after } => retry_after,
            _ => panic!("expected denial"),
        };
        let late = match store.check_at("key", now + Duration::from_secs(50)) {
            Decision::Denied { retry_after } => retry_after,
            _ => panic!("expected denial"),
        };
        assert!(late < early);
    }

    #[test]
    fn sweep_reclaims_only_expired_entries() {
        let store = store();
        let now = Instant::now();

        store.check_at("old", now);
        store.check_at("fresh", now + Duration::from_secs(30));
        assert_eq!(store.tracked_keys(), 2);

        let removed = store.sweep(now + WINDOW + Duration::from_secs(1));
        assert_eq!(removed, 1);
        assert_eq!(store.tracked_keys(), 1);

        // The swept key simply starts over.
        assert_eq!(
            store.check_at("old", now + WINDOW + Duration::from_secs(2)),
            Decision::Allowed
        );
    }
}
