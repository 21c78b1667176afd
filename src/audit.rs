//! Audit sink for authentication decisions.
//!
//! The pipeline emits exactly one [`AuditEvent`] per request it decides on.
//! Where those events end up is the application's business:
//! - [`TracingAuditSink`]: structured `tracing` events (the default)
//! - [`AuditTrail`]: in-memory recorder for tests and inspection
//!
//! Events only carry safe metadata: never the token, never a request body.

mod event;
mod sink;
mod trail;

pub use event::{AuditEvent, AuditOutcome};
pub use sink::{AuditSink, TracingAuditSink};
pub use trail::AuditTrail;
