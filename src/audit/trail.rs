//! In-memory audit recorder.

use parking_lot::Mutex;

use super::{AuditEvent, AuditSink};

/// In-memory recorder for audit events.
///
/// Stores events in arrival order. Safe to share across request tasks.
///
/// # Example
///
/// ```
/// use venue_authn::audit::{AuditEvent, AuditOutcome, AuditSink, AuditTrail};
///
/// let trail = AuditTrail::new();
/// trail.record(&AuditEvent::new(Some("req-1"), "strict", AuditOutcome::Rejected));
///
/// assert_eq!(trail.len(), 1);
/// assert_eq!(trail.events()[0].request_id(), Some("req-1"));
/// ```
#[derive(Debug, Default)]
pub struct AuditTrail {
    events: Mutex<Vec<AuditEvent>>,
}

impl AuditTrail {
    /// Creates an empty trail.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a snapshot of all recorded events.
    pub fn events(&self) -> Vec<AuditEvent> {
        self.events.lock().clone()
    }

    /// Returns the number of recorded events.
    pub fn len(&self) -> usize {
        self.events.lock().len()
    }

    /// Returns true if no events have been recorded.
    pub fn is_empty(&self) -> bool {
        self.events.lock().is_empty()
    }

    /// Clears all recorded events.
    pub fn clear(&self) {
        self.events.lock().clear();
    }
}

impl AuditSink for AuditTrail {
    fn record(&self, event: &AuditEvent) {
        self.events.lock().push(event.clone());
    }
}
