//! Token → identity verification.
//!
//! ```text
//! raw token ──Signer::decode──▶ Claims ──expiry check──▶ subject ──UserStore──▶ User ──▶ Identity
//!              │                        │                  │                      │
//!              ▼                        ▼                  ▼                      ▼
//!     TokenMalformed /            TokenExpired       TokenInvalid          TokenInvalid
//!     TokenInvalid                                   (bad subject)   (missing/deleted/inactive,
//!                                                                     store error, timeout)
//! ```
//!
//! Distinct internal causes collapse into `TokenInvalid` at this boundary so
//! the endpoint cannot be used for account enumeration. The precise cause is
//! logged where it happens.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use crate::claims::Claims;
use crate::clock::{Clock, SystemClock};
use crate::error::AuthFailure;
use crate::identity::Identity;
use crate::signer::{DecodeError, Signer};
use crate::store::{StoreError, User, UserId, UserStore};
use crate::token::BearerToken;

const DEFAULT_LOOKUP_TIMEOUT: Duration = Duration::from_secs(2);

/// How expiry is judged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerifyMode {
    /// Any expired token is rejected
    Strict,
    /// A token expired by at most the given duration is still accepted
    Lenient(Duration),
}

/// Turns a raw token into a verified [`Identity`].
///
/// Holds only read-only collaborators, so one verifier can serve any number
/// of concurrent requests.
pub struct IdentityVerifier {
    signer: Arc<dyn Signer>,
    store: Arc<dyn UserStore>,
    clock: Arc<dyn Clock>,
    lookup_timeout: Duration,
}

impl IdentityVerifier {
    /// Creates a verifier with the system clock and a 2s lookup timeout.
    pub fn new(signer: Arc<dyn Signer>, store: Arc<dyn UserStore>) -> Self {
        Self {
            signer,
            store,
            clock: Arc::new(SystemClock),
            lookup_timeout: DEFAULT_LOOKUP_TIMEOUT,
        }
    }

    /// Replaces the clock used for expiry checks.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Bounds the user store lookup. A lookup that takes longer is abandoned
    /// and the token is treated as invalid.
    pub fn with_lookup_timeout(mut self, timeout: Duration) -> Self {
        self.lookup_timeout = timeout;
        self
    }

    /// Verifies `token` under `mode`.
    ///
    /// # Errors
    ///
    /// - [`AuthFailure::TokenMalformed`] if the string is not a token
    /// - [`AuthFailure::TokenExpired`] if it is past expiry (plus grace)
    /// - [`AuthFailure::TokenInvalid`] for a bad signature, an unparseable
    ///   subject, or a subject that is not a live, active user
    pub async fn verify(
        &self,
        token: &BearerToken,
        mode: VerifyMode,
    ) -> Result<Identity, AuthFailure> {
        let claims = self
            .signer
            .decode(token.expose_secret())
            .map_err(|err| {
                debug!(reason = %err, token_len = token.len(), "token decode failed");
                match err {
                    DecodeError::Malformed => AuthFailure::TokenMalformed,
                    DecodeError::BadSignature => AuthFailure::TokenInvalid,
                }
            })?;

        self.check_expiry(&claims, mode)?;

        let user_id: UserId = claims.sub.parse().map_err(|_| {
            debug!(reason = "subject is not a user id", "token rejected");
            AuthFailure::TokenInvalid
        })?;

        let user = self.resolve(user_id).await?;

        if user.deleted_at.is_some() {
            debug!(user_id, reason = "user deleted", "token rejected");
            return Err(AuthFailure::TokenInvalid);
        }
        if !user.is_active {
            debug!(user_id, reason = "user inactive", "token rejected");
            return Err(AuthFailure::TokenInvalid);
        }

        Ok(Identity::from_user(&user))
    }

    /// A token is expired once `now` is strictly past `exp`. Under
    /// `Lenient(grace)` it stays acceptable while `now - exp <= grace`.
    fn check_expiry(&self, claims: &Claims, mode: VerifyMode) -> Result<(), AuthFailure> {
        let overdue_ms = self
            .clock
            .now()
            .timestamp_millis()
            .saturating_sub(claims.exp.saturating_mul(1_000));

        let allowed_ms = match mode {
            VerifyMode::Strict => 0,
            VerifyMode::Lenient(grace) => i64::try_from(grace.as_millis()).unwrap_or(i64::MAX),
        };

        if overdue_ms > allowed_ms {
            debug!(
                sub = %claims.sub,
                overdue_ms,
                allowed_ms,
                "token expired"
            );
            return Err(AuthFailure::TokenExpired);
        }

        if overdue_ms > 0 {
            debug!(sub = %claims.sub, overdue_ms, "accepting token within grace period");
        }

        Ok(())
    }

    async fn resolve(&self, user_id: UserId) -> Result<User, AuthFailure> {
        let lookup = self.store.find_active_by_id(user_id);

        match tokio::time::timeout(self.lookup_timeout, lookup).await {
            Ok(Ok(user)) => Ok(user),
            Ok(Err(StoreError::NotFound(_))) => {
                debug!(user_id, reason = "user not found", "token rejected");
                Err(AuthFailure::TokenInvalid)
            }
            Ok(Err(err)) => {
                warn!(user_id, error = %err, "user lookup failed");
                Err(AuthFailure::TokenInvalid)
            }
            Err(_) => {
                warn!(
                    user_id,
                    timeout_ms = u64::try_from(self.lookup_timeout.as_millis()).unwrap_or(u64::MAX),
                    "user lookup timed out"
                );
                Err(AuthFailure::TokenInvalid)
            }
        }
    }
}

impl std::fmt::Debug for IdentityVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdentityVerifier")
            .field("clock", &self.clock)
            .field("lookup_timeout", &self.lookup_timeout)
            .finish_non_exhaustive()
    }
}
