use std::fmt;

/// A bearer token supplied by a caller.
///
/// The raw string is opaque to this crate; its structure belongs to the
/// [`Signer`](crate::Signer). `BearerToken` exists so that token material can
/// travel through the pipeline without ever showing up in logs.
///
/// # Security Properties
///
/// - Never empty (construction rejects empty strings)
/// - Debug and Display output is always `[REDACTED]`
/// - Does NOT implement `Deref`, `AsRef`, or `Clone`
/// - Access requires the explicit [`expose_secret`](Self::expose_secret) call
///
/// # Examples
///
/// ```
/// use venue_authn::BearerToken;
///
/// let token = BearerToken::new("eyJhbGciOi...").expect("non-empty");
/// assert_eq!(format!("{token:?}"), "[REDACTED]");
/// assert_eq!(token.expose_secret(), "eyJhbGciOi...");
///
/// assert!(BearerToken::new("").is_none());
/// ```
// No Clone, no derived Debug: token material is never copied or printed.
pub struct BearerToken {
    inner: String,
}

impl BearerToken {
    /// Wraps a raw token string. Returns `None` for an empty string.
    pub fn new(value: impl Into<String>) -> Option<Self> {
        let inner = value.into();
        if inner.is_empty() {
            None
        } else {
            Some(Self { inner })
        }
    }

    /// Explicitly exposes the raw token.
    ///
    /// Only the signer should need this. Do not log the returned value.
    pub fn expose_secret(&self) -> &str {
        &self.inner
    }

    /// Length of the raw token in bytes. Safe to log.
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Always `false`; a `BearerToken` cannot be empty.
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

impl fmt::Debug for BearerToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}

impl fmt::Display for BearerToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}
