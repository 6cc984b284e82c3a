//! Tracing and logging setup shared by both service binaries.

/// Tracing configuration (filters, layers).
pub mod tracing;

/// Initialize process-wide tracing for `service` and log that it started.
///
/// Safe to call multiple times; subsequent calls become no-ops.
pub fn init(service: &'static str) {
    if tracing::init() {
        ::tracing::info!(service, "tracing initialized");
    }
}
