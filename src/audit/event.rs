//! Audit event schema.

use std::fmt;

use crate::error::AuthFailure;
use crate::extract::TokenSource;
use crate::store::UserId;

/// What the pipeline decided for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditOutcome {
    /// An identity was attached
    Authenticated,
    /// The request proceeded without an identity
    Anonymous,
    /// The request was terminated with a 401
    Rejected,
}

impl fmt::Display for AuditOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuditOutcome::Authenticated => write!(f, "authenticated"),
            AuditOutcome::Anonymous => write!(f, "anonymous"),
            AuditOutcome::Rejected => write!(f, "rejected"),
        }
    }
}

/// One authentication decision.
///
/// `reason` is the internal failure cause, which is more precise than the
/// wire error code. For anonymous requests under the optional policy it
/// records the failure that was swallowed, if any.
///
/// # Example
///
/// ```
/// use venue_authn::audit::{AuditEvent, AuditOutcome};
/// use venue_authn::AuthFailure;
///
/// let event = AuditEvent::new(Some("req-123"), "strict", AuditOutcome::Rejected)
///     .with_reason(AuthFailure::TokenExpired);
///
/// assert_eq!(event.request_id(), Some("req-123"));
/// assert_eq!(event.reason(), Some(AuthFailure::TokenExpired));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditEvent {
    request_id: Option<String>,
    policy: &'static str,
    outcome: AuditOutcome,
    user_id: Option<UserId>,
    source: Option<TokenSource>,
    reason: Option<AuthFailure>,
}

impl AuditEvent {
    /// Creates an event with the required fields.
    pub fn new(request_id: Option<&str>, policy: &'static str, outcome: AuditOutcome) -> Self {
        Self {
            request_id: request_id.map(str::to_owned),
            policy,
            outcome,
            user_id: None,
            source: None,
            reason: None,
        }
    }

    /// Sets the authenticated user.
    pub fn with_user(mut self, user_id: UserId) -> Self {
        self.user_id = Some(user_id);
        self
    }

    /// Sets where the token came from.
    pub fn with_source(mut self, source: TokenSource) -> Self {
        self.source = Some(source);
        self
    }

    /// Sets the internal failure cause.
    pub fn with_reason(mut self, reason: AuthFailure) -> Self {
        self.reason = Some(reason);
        self
    }

    /// Correlation id, if the request carried one.
    pub fn request_id(&self) -> Option<&str> {
        self.request_id.as_deref()
    }

    /// Name of the policy that made the decision.
    pub fn policy(&self) -> &'static str {
        self.policy
    }

    /// The decision.
    pub fn outcome(&self) -> AuditOutcome {
        self.outcome
    }

    /// The authenticated user, if any.
    pub fn user_id(&self) -> Option<UserId> {
        self.user_id
    }

    /// Header or cookie, if a token was found.
    pub fn source(&self) -> Option<TokenSource> {
        self.source
    }

    /// Internal failure cause, if any.
    pub fn reason(&self) -> Option<AuthFailure> {
        self.reason
    }
}

impl fmt::Display for AuditEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "AuditEvent[policy={}, outcome={}, request_id={}",
            self.policy,
            self.outcome,
            self.request_id.as_deref().unwrap_or("<none>")
        )?;

        if let Some(user_id) = self.user_id {
            write!(f, ", user_id={}", user_id)?;
        }
        if let Some(source) = self.source {
            write!(f, ", source={}", source.as_str())?;
        }
        if let Some(reason) = self.reason {
            write!(f, ", reason={:?}", reason)?;
        }

        write!(f, "]")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn audit_outcome_display() {
        assert_eq!(AuditOutcome::Authenticated.to_string(), "authenticated");
        assert_eq!(AuditOutcome::Anonymous.to_string(), "anonymous");
        assert_eq!(AuditOutcome::Rejected.to_string(), "rejected");
    }

    #[test]
    fn audit_event_minimal() {
        let event = AuditEvent::new(None, "optional", AuditOutcome::Anonymous);

        assert!(event.request_id().is_none());
        assert_eq!(event.policy(), "optional");
        assert!(event.user_id().is_none());
        assert!(event.source().is_none());
        assert!(event.reason().is_none());
        assert!(event.to_string().contains("request_id=<none>"));
    }

    #[test]
    fn audit_event_builder_pattern() {
        let event = AuditEvent::new(Some("req-9"), "strict", AuditOutcome::Authenticated)
            .with_user(42)
            .with_source(TokenSource::Cookie);

        assert_eq!(event.user_id(), Some(42));
        assert_eq!(event.source(), Some(TokenSource::Cookie));
        assert_eq!(
            event.to_string(),
            "AuditEvent[policy=strict, outcome=authenticated, request_id=req-9, user_id=42, source=cookie]"
        );
    }

    #[test]
    fn audit_event_keeps_precise_reason() {
        let event = AuditEvent::new(Some("req-1"), "lenient", AuditOutcome::Rejected)
            .with_reason(AuthFailure::TokenMalformed);

        // The wire code would be TOKEN_INVALID; the audit record keeps the cause.
        assert!(event.to_string().contains("reason=TokenMalformed"));
    }
}
