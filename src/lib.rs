//! Request authentication pipeline for the venue and show discovery API.
//!
//! Every inbound request is classified before any handler runs:
//! - **Extract**: a bearer token from `Authorization: Bearer`, else the
//!   `auth_token` session cookie
//! - **Verify**: signature, expiry (optionally with a grace window), and a
//!   live, active account in the user store
//! - **Decide**: per route policy, proceed with an identity, proceed
//!   anonymously, or reject with a 401 JSON envelope
//!
//! # Core Types
//!
//! - [`BearerToken`]: Raw token that never shows up in logs
//! - [`IdentityVerifier`]: Token to [`Identity`] or [`AuthFailure`]
//! - [`AuthPolicy`]: `Strict`, `Lenient { grace }`, or `Optional`
//! - [`Authenticator`]: Extraction, verification, and the policy branch
//! - [`AuthLayer`]: Tower layer wiring the authenticator into axum
//! - [`CurrentIdentity`] / [`MaybeIdentity`]: Handler extractors
//!
//! # Examples
//!
//! ```
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! use http::{header, HeaderMap, HeaderValue};
//! use venue_authn::{
//!     AuthConfig, AuthPolicy, Authenticator, HmacSigner, IdentityVerifier,
//!     InMemoryUserStore, Outcome, Signer, User,
//! };
//!
//! # tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap().block_on(async {
//! let signer = Arc::new(HmacSigner::new(b"change-me", Duration::from_secs(3600)));
//! let store = Arc::new(InMemoryUserStore::new());
//! store.insert(User::new(42, "ana@example.com"));
//!
//! let auth = Authenticator::new(
//!     IdentityVerifier::new(signer.clone(), store),
//!     AuthConfig::default(),
//! );
//!
//! let token = signer.issue(42).unwrap();
//! let mut headers = HeaderMap::new();
//! headers.insert(
//!     header::AUTHORIZATION,
//!     HeaderValue::from_str(&format!("Bearer {token}")).unwrap(),
//! );
//!
//! let outcome = auth.authenticate(AuthPolicy::Strict, &headers, None).await;
//! assert_eq!(outcome.identity().map(|id| id.user_id()), Some(42));
//!
//! let anonymous = auth.authenticate(AuthPolicy::Optional, &HeaderMap::new(), None).await;
//! assert_eq!(anonymous, Outcome::Anonymous);
//! # });
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod audit;
mod claims;
mod clock;
mod config;
mod context;
mod error;
pub mod extract;
mod identity;
mod policy;
mod request_id;
mod response;
mod signer;
mod store;
mod token;
mod verifier;
pub mod web;

pub use claims::Claims;
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{AuthConfig, CookieClearSpec, SameSitePolicy};
pub use context::{
    current_identity, with_identity, CurrentIdentity, IdentityAlreadySet, MaybeIdentity,
};
pub use error::{AuthFailure, ConfigError, ErrorCode};
pub use extract::{extract_token, ExtractedToken, TokenSource, DEFAULT_COOKIE_NAME};
pub use identity::Identity;
pub use policy::{AuthPolicy, Authenticator, Outcome};
pub use request_id::{correlation_id, RequestId, REQUEST_ID_HEADER};
pub use response::{failure_response, ErrorEnvelope};
pub use signer::{DecodeError, HmacSigner, IssueError, Signer};
pub use store::{InMemoryUserStore, StoreError, User, UserId, UserStore};
pub use token::BearerToken;
pub use verifier::{IdentityVerifier, VerifyMode};
pub use web::AuthLayer;
