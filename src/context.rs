//! Request-scoped identity.
//!
//! The identity (or its explicit absence) lives in the request's
//! [`Extensions`] under a private key type, so unrelated extensions cannot
//! collide with it and nothing outside this module can overwrite it.
//!
//! # Examples
//!
//! ```
//! use http::Extensions;
//! use venue_authn::{current_identity, with_identity};
//!
//! let mut extensions = Extensions::new();
//! assert!(current_identity(&extensions).is_none());
//!
//! with_identity(&mut extensions, None).unwrap();
//! assert!(current_identity(&extensions).is_none());
//!
//! // Set once: a second attach is refused.
//! assert!(with_identity(&mut extensions, None).is_err());
//! ```

use std::convert::Infallible;
use std::sync::Arc;

use axum::extract::FromRequestParts;
use axum::response::{IntoResponse, Response};
use http::request::Parts;
use http::{Extensions, StatusCode};
use thiserror::Error;
use tracing::error;

use crate::error::AuthFailure;
use crate::identity::Identity;
use crate::request_id::correlation_id;
use crate::response::failure_response;

/// Extension slot. `None` inside means "authenticated anonymously".
#[derive(Clone)]
struct IdentitySlot(Option<Arc<Identity>>);

/// The request already carries an identity decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("request identity is already set")]
pub struct IdentityAlreadySet;

/// Attaches the authentication result to a request.
///
/// Succeeds only once per request; later calls leave the first value in
/// place and return [`IdentityAlreadySet`].
pub fn with_identity(
    extensions: &mut Extensions,
    identity: Option<Identity>,
) -> Result<(), IdentityAlreadySet> {
    if extensions.get::<IdentitySlot>().is_some() {
        return Err(IdentityAlreadySet);
    }
    extensions.insert(IdentitySlot(identity.map(Arc::new)));
    Ok(())
}

/// The verified caller of this request, if any.
pub fn current_identity(extensions: &Extensions) -> Option<&Identity> {
    extensions
        .get::<IdentitySlot>()
        .and_then(|slot| slot.0.as_deref())
}

fn is_attached(extensions: &Extensions) -> bool {
    extensions.get::<IdentitySlot>().is_some()
}

/// Extractor for handlers that need a caller.
///
/// Rejects with the standard 401 envelope when the request went through an
/// optional layer anonymously, and with a 500 when no authentication layer
/// ran at all.
#[derive(Debug, Clone)]
pub struct CurrentIdentity(pub Identity);

impl<S> FromRequestParts<S> for CurrentIdentity
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        if let Some(identity) = current_identity(&parts.extensions) {
            return Ok(CurrentIdentity(identity.clone()));
        }

        let request_id = correlation_id(&parts.extensions, &parts.headers);
        if is_attached(&parts.extensions) {
            return Err(failure_response(
                AuthFailure::TokenMissing,
                request_id.as_deref(),
                None,
            ));
        }

        error!(
            request_id = request_id.as_deref(),
            path = parts.uri.path(),
            "identity requested but auth layer not configured"
        );
        Err(StatusCode::INTERNAL_SERVER_ERROR.into_response())
    }
}

/// Extractor for handlers that personalize when a caller is present.
#[derive(Debug, Clone)]
pub struct MaybeIdentity(pub Option<Identity>);

impl<S> FromRequestParts<S> for MaybeIdentity
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(MaybeIdentity(current_identity(&parts.extensions).cloned()))
    }
}
