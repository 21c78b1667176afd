//! Axum integration.
//!
//! [`AuthLayer`] runs the authentication policy in front of a router or a
//! single route:
//!
//! 1. CORS preflight requests pass straight through.
//! 2. [`Authenticator::authenticate`](crate::Authenticator::authenticate)
//!    decides the outcome from the request headers.
//! 3. `Rejected` ends the request with the 401 envelope (and a clearing
//!    cookie when configured). Downstream handlers never run.
//! 4. Otherwise the identity, or its absence, is attached with
//!    [`with_identity`](crate::with_identity) and the inner service is called.
//!
//! # Example Flow
//!
//! ```ignore
//! let auth = Arc::new(Authenticator::new(verifier, AuthConfig::from_env()?));
//!
//! let app = Router::new()
//!     .route("/me", get(me).layer(AuthLayer::strict(auth.clone())))
//!     .route("/auth/refresh", post(refresh).layer(AuthLayer::lenient(auth.clone())))
//!     .route("/shows", get(list_shows).layer(AuthLayer::optional(auth)));
//! ```

mod layer;

pub use layer::{AuthLayer, AuthService};
