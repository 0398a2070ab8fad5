//! Point-in-time container diagnostics.

use std::time::SystemTime;

use crate::metrics::{DebugEvent, MetricsSnapshot};

/// Event histories captured while debug mode was on.
#[derive(Debug, Clone, Default)]
pub struct DebugInfo {
    /// Registration events, oldest first, bounded.
    pub registrations: Vec<DebugEvent>,
    /// Successful resolution events, oldest first, bounded.
    pub resolutions: Vec<DebugEvent>,
}

/// Full diagnostic snapshot of a container.
///
/// Produced by [`ServiceContainer::diagnostics`]; `debug_info` is `Some`
/// only if debug mode has ever been enabled on the container.
///
/// [`ServiceContainer::diagnostics`]: crate::ServiceContainer::diagnostics
#[derive(Debug, Clone)]
pub struct ContainerDiagnostics {
    /// Process-unique container id, e.g. `container-3`.
    pub container_id: String,
    pub created_at: SystemTime,
    pub is_disposed: bool,
    /// Token names in registration order.
    pub registered_services: Vec<&'static str>,
    pub metrics: MetricsSnapshot,
    pub debug_info: Option<DebugInfo>,
}
