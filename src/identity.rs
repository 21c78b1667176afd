use serde::Serialize;

use crate::store::{User, UserId};

/// The verified, request-scoped caller.
///
/// An `Identity` is built fresh from a store record on every successful
/// verification. It is read-only and never outlives the request that
/// produced it.
///
/// `Identity` cannot be constructed outside this crate; the only way to
/// obtain one is through the [`IdentityVerifier`](crate::IdentityVerifier).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Identity {
    user_id: UserId,
    email: String,
    is_active: bool,
    is_admin: bool,
}

impl Identity {
    pub(crate) fn from_user(user: &User) -> Self {
        Self {
            user_id: user.id,
            email: user.email.clone(),
            is_active: user.is_active,
            is_admin: user.is_admin,
        }
    }

    /// The authenticated user's id.
    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    /// The authenticated user's email, for handlers and audit trails.
    pub fn email(&self) -> &str {
        &self.email
    }

    /// Always `true` for identities produced by the verifier.
    pub fn is_active(&self) -> bool {
        self.is_active
    }

    /// Whether the user has administrative rights.
    pub fn is_admin(&self) -> bool {
        self.is_admin
    }
}
