//! Where audit events go.

use super::AuditEvent;

/// Receives one event per authentication decision.
///
/// Implementations must not block; the pipeline calls `record` inline on the
/// request path.
pub trait AuditSink: Send + Sync {
    /// Records an event.
    fn record(&self, event: &AuditEvent);
}

/// Emits audit events as structured `tracing` events under the
/// `venue_authn::audit` target.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingAuditSink;

impl AuditSink for TracingAuditSink {
    fn record(&self, event: &AuditEvent) {
        tracing::info!(
            target: "venue_authn::audit",
            request_id = ?event.request_id(),
            policy = event.policy(),
            outcome = %event.outcome(),
            user_id = ?event.user_id(),
            source = ?event.source().map(|s| s.as_str()),
            reason = ?event.reason(),
            "authentication decision"
        );
    }
}
