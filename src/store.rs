//! The user store seam.
//!
//! The real store is the application's ORM layer. The pipeline only needs
//! one lookup, so the seam is a single async trait method.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use thiserror::Error;

/// Numeric user identifier, as stored in the `users` table.
pub type UserId = u64;

/// A user record as returned by the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    /// Primary key
    pub id: UserId,
    /// Login email
    pub email: String,
    /// Whether the account may sign in
    pub is_active: bool,
    /// Whether the account has administrative rights
    pub is_admin: bool,
    /// Soft-delete marker
    pub deleted_at: Option<DateTime<Utc>>,
}

impl User {
    /// Creates an active, non-admin, non-deleted user.
    pub fn new(id: UserId, email: impl Into<String>) -> Self {
        Self {
            id,
            email: email.into(),
            is_active: true,
            is_admin: false,
            deleted_at: None,
        }
    }

    /// Marks the user as an administrator.
    pub fn admin(mut self) -> Self {
        self.is_admin = true;
        self
    }

    /// Marks the user as inactive.
    pub fn inactive(mut self) -> Self {
        self.is_active = false;
        self
    }
}

/// User store failures.
#[derive(Debug, Error)]
pub enum StoreError {
    /// No live (non-deleted) user has this id
    #[error("user {0} not found")]
    NotFound(UserId),
    /// The store could not answer (connection lost, query failed, ...)
    #[error("user store unavailable: {0}")]
    Unavailable(String),
}

/// Resolves a subject id to account status.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Looks up a user that has not been deleted.
    ///
    /// Inactive users ARE returned; the caller decides what inactive means.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] for unknown or deleted users and
    /// [`StoreError::Unavailable`] when the backing store fails.
    async fn find_active_by_id(&self, id: UserId) -> Result<User, StoreError>;
}

/// In-memory user store.
///
/// Mirrors the scoping rules of the database-backed store: soft-deleted
/// rows are invisible to lookups, hard-deleted rows are gone.
///
/// # Examples
///
/// ```
/// use venue_authn::{InMemoryUserStore, User};
///
/// let store = InMemoryUserStore::new();
/// store.insert(User::new(1, "ana@example.com"));
/// assert!(store.deactivate(1));
/// assert!(store.hard_delete(1));
/// assert!(!store.hard_delete(1));
/// ```
#[derive(Debug, Default)]
pub struct InMemoryUserStore {
    users: RwLock<HashMap<UserId, User>>,
}

impl InMemoryUserStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces a user.
    pub fn insert(&self, user: User) {
        self.users.write().insert(user.id, user);
    }

    /// Flips a user to inactive. Returns `false` if the user does not exist.
    pub fn deactivate(&self, id: UserId) -> bool {
        self.update(id, |user| user.is_active = false)
    }

    /// Sets the soft-delete marker. Returns `false` if the user does not exist.
    pub fn soft_delete(&self, id: UserId) -> bool {
        self.update(id, |user| user.deleted_at = Some(Utc::now()))
    }

    /// Removes the user entirely. Returns `false` if the user did not exist.
    pub fn hard_delete(&self, id: UserId) -> bool {
        self.users.write().remove(&id).is_some()
    }

    /// Number of stored users, including soft-deleted ones.
    pub fn len(&self) -> usize {
        self.users.read().len()
    }

    /// Returns true if the store holds no users.
    pub fn is_empty(&self) -> bool {
        self.users.read().is_empty()
    }

    fn update(&self, id: UserId, change: impl FnOnce(&mut User)) -> bool {
        match self.users.write().get_mut(&id) {
            Some(user) => {
                change(user);
                true
            }
            None => false,
        }
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn find_active_by_id(&self, id: UserId) -> Result<User, StoreError> {
        self.users
            .read()
            .get(&id)
            .filter(|user| user.deleted_at.is_none())
            .cloned()
            .ok_or(StoreError::NotFound(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn lookup_returns_live_user() {
        let store = InMemoryUserStore::new();
        store.insert(User::new(1, "ana@example.com").admin());

        let user = store.find_active_by_id(1).await.unwrap();
        assert_eq!(user.email, "ana@example.com");
        assert!(user.is_admin);
        assert!(user.is_active);
    }

    #[tokio::test]
    async fn inactive_users_are_still_returned() {
        let store = InMemoryUserStore::new();
        store.insert(User::new(2, "ben@example.com"));
        assert!(store.deactivate(2));

        let user = store.find_active_by_id(2).await.unwrap();
        assert!(!user.is_active);
    }

    #[tokio::test]
    async fn soft_deleted_users_are_hidden() {
        let store = InMemoryUserStore::new();
        store.insert(User::new(3, "cy@example.com"));
        assert!(store.soft_delete(3));

        assert!(matches!(
            store.find_active_by_id(3).await,
            Err(StoreError::NotFound(3))
        ));
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn hard_deleted_users_are_gone() {
        let store = InMemoryUserStore::new();
        store.insert(User::new(4, "di@example.com"));
        assert!(store.hard_delete(4));

        assert!(matches!(
            store.find_active_by_id(4).await,
            Err(StoreError::NotFound(4))
        ));
        assert!(store.is_empty());
    }

    #[test]
    fn updates_on_missing_users_report_false() {
        let store = InMemoryUserStore::new();
        assert!(!store.deactivate(9));
        assert!(!store.soft_delete(9));
        assert!(!store.hard_delete(9));
    }
}
