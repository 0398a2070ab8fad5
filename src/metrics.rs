//! Resolution counters and debug event histories.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::SystemTime;

/// Bounded history length for debug-mode event logs.
pub(crate) const HISTORY_CAP: usize = 1024;

/// One recorded registration or resolution, kept only in debug mode.
#[derive(Debug, Clone)]
pub struct DebugEvent {
    pub name: &'static str,
    pub at: SystemTime,
}

/// Point-in-time view of container metrics.
///
/// `total_resolutions` counts every successful resolution since creation or
/// the last [`clear_metrics`](crate::ServiceContainer::clear_metrics).
/// `resolutions_by_token` is populated only while debug mode is on.
#[derive(Debug, Clone, Default)]
pub struct MetricsSnapshot {
    pub total_resolutions: u64,
    pub total_services: u64,
    pub resolutions_by_token: HashMap<&'static str, u64>,
}

#[derive(Default)]
struct MetricsDetail {
    per_token: HashMap<&'static str, u64>,
    registrations: VecDeque<DebugEvent>,
    resolutions: VecDeque<DebugEvent>,
}

/// Shared counters owned by a container.
///
/// The hot path touches only `total_resolutions`; per-token counts and event
/// histories sit behind a mutex and are written only in debug mode.
pub(crate) struct ContainerMetrics {
    total_resolutions: AtomicU64,
    total_services: AtomicU64,
    detail: Mutex<MetricsDetail>,
}

impl ContainerMetrics {
    pub(crate) fn new() -> Self {
        Self {
            total_resolutions: AtomicU64::new(0),
            total_services: AtomicU64::new(0),
            detail: Mutex::new(MetricsDetail::default()),
        }
    }

    pub(crate) fn record_resolution(&self, name: &'static str, debug: bool) {
        self.total_resolutions.fetch_add(1, Ordering::Relaxed);
        if debug {
            let mut detail = self.detail.lock().unwrap_or_else(|e| e.into_inner());
            *detail.per_token.entry(name).or_insert(0) += 1;
            push_capped(&mut detail.resolutions, name);
        }
    }

    pub(crate) fn record_registration(&self, name: &'static str, debug: bool) {
        if debug {
            let mut detail = self.detail.lock().unwrap_or_else(|e| e.into_inner());
            push_capped(&mut detail.registrations, name);
        }
    }

    pub(crate) fn set_total_services(&self, count: usize) {
        self.total_services.store(count as u64, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self) -> MetricsSnapshot {
        let detail = self.detail.lock().unwrap_or_else(|e| e.into_inner());
        MetricsSnapshot {
            total_resolutions: self.total_resolutions.load(Ordering::Relaxed),
            total_services: self.total_services.load(Ordering::Relaxed),
            resolutions_by_token: detail.per_token.clone(),
        }
    }

    /// Zeroes the resolution counters and histories. `total_services` tracks
    /// the registry and is left alone.
    pub(crate) fn clear(&self) {
        self.total_resolutions.store(0, Ordering::Relaxed);
        let mut detail = self.detail.lock().unwrap_or_else(|e| e.into_inner());
        detail.per_token.clear();
        detail.registrations.clear();
        detail.resolutions.clear();
    }

    pub(crate) fn debug_events(&self) -> (Vec<DebugEvent>, Vec<DebugEvent>) {
        let detail = self.detail.lock().unwrap_or_else(|e| e.into_inner());
        (
            detail.registrations.iter().cloned().collect(),
            detail.resolutions.iter().cloned().collect(),
        )
    }
}

fn push_capped(events: &mut VecDeque<DebugEvent>, name: &'static str) {
    if events.len() == HISTORY_CAP {
        events.pop_front();
    }
    events.push_back(DebugEvent {
        name,
        at: SystemTime::now(),
    });
}
