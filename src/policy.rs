//! Authentication policies.
//!
//! | Policy | No token | Verification fails | Verification succeeds |
//! |---|---|---|---|
//! | `Strict` | `Rejected(TokenMissing)` | `Rejected(failure)` | `Authenticated` |
//! | `Lenient { grace }` | `Rejected(TokenMissing)` | `Rejected(failure)` | `Authenticated` |
//! | `Optional` | `Anonymous` | `Anonymous` | `Authenticated` |
//!
//! `Lenient` differs from `Strict` only in accepting tokens that expired no
//! more than `grace` ago; it backs token-refresh endpoints. `Optional` treats
//! every failure kind the same way, so an optional endpoint stays reachable
//! for anonymous traffic no matter what credentials arrive.

use std::sync::Arc;
use std::time::Duration;

use http::HeaderMap;
use tracing::debug;

use crate::audit::{AuditEvent, AuditOutcome, AuditSink, TracingAuditSink};
use crate::config::AuthConfig;
use crate::error::AuthFailure;
use crate::extract::{extract_token, TokenSource};
use crate::identity::Identity;
use crate::verifier::{IdentityVerifier, VerifyMode};

/// How a route treats callers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AuthPolicy {
    /// Identity required; any failure rejects. Default for protected routes.
    #[default]
    Strict,
    /// Identity required; tokens expired by at most `grace` still pass.
    Lenient {
        /// Grace window after expiry (inclusive)
        grace: Duration,
    },
    /// Identity attached when verification succeeds; never rejects.
    Optional,
}

impl AuthPolicy {
    /// Lenient policy with the given grace window.
    pub fn lenient(grace: Duration) -> Self {
        AuthPolicy::Lenient { grace }
    }

    /// Short name used in logs and audit events.
    pub fn name(self) -> &'static str {
        match self {
            AuthPolicy::Strict => "strict",
            AuthPolicy::Lenient { .. } => "lenient",
            AuthPolicy::Optional => "optional",
        }
    }

    fn verify_mode(self) -> VerifyMode {
        match self {
            AuthPolicy::Strict | AuthPolicy::Optional => VerifyMode::Strict,
            AuthPolicy::Lenient { grace } => VerifyMode::Lenient(grace),
        }
    }
}

/// The fate of one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Proceed with this identity
    Authenticated(Identity),
    /// Proceed with no identity (optional policy only)
    Anonymous,
    /// Stop here and answer 401
    Rejected(AuthFailure),
}

impl Outcome {
    /// The identity, if authenticated.
    pub fn identity(&self) -> Option<&Identity> {
        match self {
            Outcome::Authenticated(identity) => Some(identity),
            Outcome::Anonymous | Outcome::Rejected(_) => None,
        }
    }

    /// The failure, if rejected.
    pub fn failure(&self) -> Option<AuthFailure> {
        match self {
            Outcome::Rejected(failure) => Some(*failure),
            Outcome::Authenticated(_) | Outcome::Anonymous => None,
        }
    }

    /// Returns true if the request must not reach downstream handlers.
    pub fn is_rejected(&self) -> bool {
        matches!(self, Outcome::Rejected(_))
    }

    fn audit_outcome(&self) -> AuditOutcome {
        match self {
            Outcome::Authenticated(_) => AuditOutcome::Authenticated,
            Outcome::Anonymous => AuditOutcome::Anonymous,
            Outcome::Rejected(_) => AuditOutcome::Rejected,
        }
    }
}

/// Extractor + verifier + policy branch, bound to one [`AuthConfig`].
///
/// `Authenticator` decides; it does not write responses. The
/// [`AuthLayer`](crate::web::AuthLayer) turns a rejection into a 401.
pub struct Authenticator {
    verifier: IdentityVerifier,
    config: AuthConfig,
    audit: Arc<dyn AuditSink>,
}

impl Authenticator {
    /// Creates an authenticator that audits through `tracing`.
    ///
    /// The verifier's lookup timeout is taken from `config`.
    pub fn new(verifier: IdentityVerifier, config: AuthConfig) -> Self {
        Self {
            verifier: verifier.with_lookup_timeout(config.lookup_timeout()),
            config,
            audit: Arc::new(TracingAuditSink),
        }
    }

    /// Replaces the audit sink.
    pub fn with_audit_sink(mut self, audit: Arc<dyn AuditSink>) -> Self {
        self.audit = audit;
        self
    }

    /// The configuration this authenticator was built with.
    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    /// Lenient policy using the configured grace period.
    pub fn lenient_policy(&self) -> AuthPolicy {
        AuthPolicy::lenient(self.config.grace_period())
    }

    /// Decides the fate of a request from its headers.
    ///
    /// `request_id` is only used for logging and auditing.
    pub async fn authenticate(
        &self,
        policy: AuthPolicy,
        headers: &HeaderMap,
        request_id: Option<&str>,
    ) -> Outcome {
        let Some(extracted) = extract_token(headers, &self.config.cookie_name) else {
            let outcome = match policy {
                AuthPolicy::Optional => Outcome::Anonymous,
                AuthPolicy::Strict | AuthPolicy::Lenient { .. } => {
                    Outcome::Rejected(AuthFailure::TokenMissing)
                }
            };
            self.record(policy, &outcome, None, Some(AuthFailure::TokenMissing), request_id);
            return outcome;
        };

        let verified = self
            .verifier
            .verify(&extracted.token, policy.verify_mode())
            .await;

        let (outcome, reason) = match (verified, policy) {
            (Ok(identity), _) => (Outcome::Authenticated(identity), None),
            (Err(failure), AuthPolicy::Optional) => {
                debug!(
                    request_id,
                    reason = %failure,
                    source = extracted.source.as_str(),
                    "optional auth: continuing anonymously"
                );
                (Outcome::Anonymous, Some(failure))
            }
            (Err(failure), AuthPolicy::Strict | AuthPolicy::Lenient { .. }) => {
                (Outcome::Rejected(failure), Some(failure))
            }
        };

        self.record(policy, &outcome, Some(extracted.source), reason, request_id);
        outcome
    }

    fn record(
        &self,
        policy: AuthPolicy,
        outcome: &Outcome,
        source: Option<TokenSource>,
        reason: Option<AuthFailure>,
        request_id: Option<&str>,
    ) {
        let mut event = AuditEvent::new(request_id, policy.name(), outcome.audit_outcome());
        if let Some(identity) = outcome.identity() {
            event = event.with_user(identity.user_id());
        }
        if let Some(source) = source {
            event = event.with_source(source);
        }
        if let Some(reason) = reason {
            event = event.with_reason(reason);
        }

        debug!(
            request_id,
            policy = policy.name(),
            outcome = %event.outcome(),
            reason = ?reason,
            "authentication decided"
        );
        self.audit.record(&event);
    }
}

impl std::fmt::Debug for Authenticator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Authenticator")
            .field("verifier", &self.verifier)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
