// Preloader counters: sessions, routed events, subscription churn.

use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PreloadStatsSnapshot {
    pub sessions_registered: u64,
    pub sessions_completed: u64,
    pub session_requests_failed: u64,
    pub progress_routed: u64,
    /// Events whose session id was not registered (stale or unknown).
    pub events_ignored: u64,
    pub attaches: u64,
    pub detaches: u64,
}

pub struct PreloadStats {
    sessions_registered: AtomicU64,
    sessions_completed: AtomicU64,
    session_requests_failed: AtomicU64,
    progress_routed: AtomicU64,
    events_ignored: AtomicU64,
    attaches: AtomicU64,
    detaches: AtomicU64,
}

impl PreloadStats {
    pub fn new() -> Self {
        Self {
            sessions_registered: AtomicU64::new(0),
            sessions_completed: AtomicU64::new(0),
            session_requests_failed: AtomicU64::new(0),
            progress_routed: AtomicU64::new(0),
            events_ignored: AtomicU64::new(0),
            attaches: AtomicU64::new(0),
            detaches: AtomicU64::new(0),
        }
    }

    pub fn record_registered(&self) {
        self.sessions_registered.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_completed(&self) {
        self.sessions_completed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_request_failed(&self) {
        self.session_requests_failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_progress(&self) {
        self.progress_routed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_ignored(&self) {
        self.events_ignored.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_attach(&self) {
        self.attaches.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_detach(&self) {
        self.detaches.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> PreloadStatsSnapshot {
        PreloadStatsSnapshot {
            sessions_registered: self.sessions_registered.load(Ordering::Relaxed),
            sessions_completed: self.sessions_completed.load(Ordering::Relaxed),
            session_requests_failed: self.session_requests_failed.load(Ordering::Relaxed),
            progress_routed: self.progress_routed.load(Ordering::Relaxed),
            events_ignored: self.events_ignored.load(Ordering::Relaxed),
            attaches: self.attaches.load(Ordering::Relaxed),
            detaches: self.detaches.load(Ordering::Relaxed),
        }
    }
}

impl Default for PreloadStats {
    fn default() -> Self {
        Self::new()
    }
}
