//! Authentication configuration.
//!
//! All settings travel as an explicit [`AuthConfig`] value handed to the
//! [`Authenticator`](crate::Authenticator). There is no global state, so
//! several pipelines with different settings can coexist in one process.

use std::str::FromStr;
use std::time::Duration;

use cookie::{Cookie, SameSite};
use serde::Deserialize;

use crate::error::ConfigError;
use crate::extract::DEFAULT_COOKIE_NAME;

const DEFAULT_GRACE_PERIOD_SECS: u64 = 300;
const DEFAULT_LOOKUP_TIMEOUT_MS: u64 = 2_000;

/// Settings for the authentication pipeline.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use venue_authn::AuthConfig;
///
/// let config: AuthConfig = serde_json::from_str(r#"{ "grace_period_secs": 60 }"#).unwrap();
/// assert_eq!(config.cookie_name, "auth_token");
/// assert_eq!(config.grace_period(), Duration::from_secs(60));
/// assert!(config.clear_cookie.is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AuthConfig {
    /// Name of the session cookie that may carry the token
    pub cookie_name: String,
    /// How long after expiry the lenient policy still accepts a token
    pub grace_period_secs: u64,
    /// Upper bound on the user store lookup
    pub lookup_timeout_ms: u64,
    /// When set, every rejection also expires the session cookie
    pub clear_cookie: Option<CookieClearSpec>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            cookie_name: DEFAULT_COOKIE_NAME.to_string(),
            grace_period_secs: DEFAULT_GRACE_PERIOD_SECS,
            lookup_timeout_ms: DEFAULT_LOOKUP_TIMEOUT_MS,
            clear_cookie: None,
        }
    }
}

impl AuthConfig {
    /// Grace window used by the lenient policy.
    pub fn grace_period(&self) -> Duration {
        Duration::from_secs(self.grace_period_secs)
    }

    /// Maximum time to wait for the user store.
    pub fn lookup_timeout(&self) -> Duration {
        Duration::from_millis(self.lookup_timeout_ms)
    }

    /// Loads settings from the process environment.
    ///
    /// | Variable | Default |
    /// |---|---|
    /// | `AUTH_COOKIE_NAME` | `auth_token` |
    /// | `AUTH_GRACE_PERIOD_SECS` | `300` |
    /// | `AUTH_LOOKUP_TIMEOUT_MS` | `2000` |
    /// | `AUTH_CLEAR_COOKIE_ON_FAILURE` | `false` |
    /// | `AUTH_COOKIE_PATH` | `/` |
    /// | `AUTH_COOKIE_DOMAIN` | unset |
    /// | `AUTH_COOKIE_SECURE` | `true` |
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if a value does not parse or the result fails
    /// [`validate`](Self::validate).
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) with an arbitrary variable source.
    ///
    /// # Errors
    ///
    /// See [`from_env`](Self::from_env).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let cookie_name = lookup("AUTH_COOKIE_NAME").unwrap_or(defaults.cookie_name);
        let grace_period_secs = parse_var(&lookup, "AUTH_GRACE_PERIOD_SECS")?
            .unwrap_or(defaults.grace_period_secs);
        let lookup_timeout_ms = parse_var(&lookup, "AUTH_LOOKUP_TIMEOUT_MS")?
            .unwrap_or(defaults.lookup_timeout_ms);

        let clear_cookie = if parse_var(&lookup, "AUTH_CLEAR_COOKIE_ON_FAILURE")?.unwrap_or(false) {
            let mut spec = CookieClearSpec::new(cookie_name.clone());
            if let Some(path) = lookup("AUTH_COOKIE_PATH") {
                spec.path = path;
            }
            spec.domain = lookup("AUTH_COOKIE_DOMAIN").filter(|d| !d.is_empty());
            if let Some(secure) = parse_var(&lookup, "AUTH_COOKIE_SECURE")? {
                spec.secure = secure;
            }
            Some(spec)
        } else {
            None
        };

        let config = Self {
            cookie_name,
            grace_period_secs,
            lookup_timeout_ms,
            clear_cookie,
        };
        config.validate()?;
        Ok(config)
    }

    /// Checks invariants that serde defaults cannot express.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::EmptyCookieName`],
    /// [`ConfigError::ZeroLookupTimeout`], or
    /// [`ConfigError::ClearCookieNameMismatch`] when the clearing cookie
    /// names a cookie other than `cookie_name`.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.cookie_name.is_empty() {
            return Err(ConfigError::EmptyCookieName);
        }
        if self.lookup_timeout_ms == 0 {
            return Err(ConfigError::ZeroLookupTimeout);
        }
        if let Some(spec) = &self.clear_cookie {
            if spec.name != self.cookie_name {
                return Err(ConfigError::ClearCookieNameMismatch {
                    cookie_name: self.cookie_name.clone(),
                    clear_name: spec.name.clone(),
                });
            }
        }
        Ok(())
    }
}

fn parse_var<F, T>(lookup: &F, key: &'static str) -> Result<Option<T>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::InvalidValue { key, value: raw }),
    }
}

/// `SameSite` attribute of the session cookie.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SameSitePolicy {
    /// `SameSite=Strict`
    Strict,
    /// `SameSite=Lax`
    #[default]
    Lax,
    /// `SameSite=None`
    None,
}

impl From<SameSitePolicy> for SameSite {
    fn from(policy: SameSitePolicy) -> Self {
        match policy {
            SameSitePolicy::Strict => SameSite::Strict,
            SameSitePolicy::Lax => SameSite::Lax,
            SameSitePolicy::None => SameSite::None,
        }
    }
}

/// Attributes the session cookie was originally set with.
///
/// A clearing cookie must repeat them, or the browser treats it as a
/// different cookie and keeps the stale one.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CookieClearSpec {
    /// Cookie name
    pub name: String,
    /// `Path` attribute
    pub path: String,
    /// `Domain` attribute
    pub domain: Option<String>,
    /// `Secure` attribute
    pub secure: bool,
    /// `HttpOnly` attribute
    pub http_only: bool,
    /// `SameSite` attribute
    pub same_site: SameSitePolicy,
}

impl Default for CookieClearSpec {
    fn default() -> Self {
        Self::new(DEFAULT_COOKIE_NAME)
    }
}

impl CookieClearSpec {
    /// Spec for `name` with `Path=/`, `Secure`, `HttpOnly`, `SameSite=Lax`.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            path: "/".to_string(),
            domain: None,
            secure: true,
            http_only: true,
            same_site: SameSitePolicy::Lax,
        }
    }

    /// A cookie that immediately expires the session cookie.
    ///
    /// # Examples
    ///
    /// ```
    /// use venue_authn::CookieClearSpec;
    ///
    /// let header = CookieClearSpec::new("auth_token").expired_cookie().to_string();
    /// assert!(header.starts_with("auth_token=;"));
    /// assert!(header.contains("Max-Age=0"));
    /// assert!(header.contains("Path=/"));
    /// ```
    pub fn expired_cookie(&self) -> Cookie<'static> {
        let mut builder = Cookie::build((self.name.clone(), ""))
            .path(self.path.clone())
            .secure(self.secure)
            .http_only(self.http_only)
            .same_site(self.same_site.into())
            .max_age(cookie::time::Duration::ZERO)
            .expires(cookie::time::OffsetDateTime::UNIX_EPOCH);

        if let Some(domain) = &self.domain {
            builder = builder.domain(domain.clone());
        }

        builder.build()
    }
}
