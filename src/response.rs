//! The 401 answer.

use axum::response::{IntoResponse, Response};
use axum::Json;
use http::header::SET_COOKIE;
use http::HeaderValue;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::config::CookieClearSpec;
use crate::error::{AuthFailure, ErrorCode};

/// JSON body of every authentication failure.
///
/// ```json
/// {"success": false, "message": "Invalid token", "error_code": "TOKEN_INVALID", "request_id": "req-7"}
/// ```
///
/// `request_id` is left out entirely when the request carried none.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    /// Always `false`
    pub success: bool,
    /// Client-facing message
    pub message: String,
    /// Stable machine-readable code
    pub error_code: ErrorCode,
    /// Correlation identifier of the request, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
}

impl ErrorEnvelope {
    /// Builds the envelope for a failure.
    pub fn from_failure(failure: AuthFailure, request_id: Option<&str>) -> Self {
        Self {
            success: false,
            message: failure.public_message().to_string(),
            error_code: failure.error_code(),
            request_id: request_id.map(str::to_owned),
        }
    }
}

/// Builds the 401 response for `failure`.
///
/// When `clear` is given, a `Set-Cookie` header expiring the session cookie
/// is attached so the browser stops resending a dead token.
pub fn failure_response(
    failure: AuthFailure,
    request_id: Option<&str>,
    clear: Option<&CookieClearSpec>,
) -> Response {
    let envelope = ErrorEnvelope::from_failure(failure, request_id);
    let mut response = (failure.status(), Json(envelope)).into_response();

    if let Some(spec) = clear {
        match HeaderValue::from_str(&spec.expired_cookie().to_string()) {
            Ok(value) => {
                response.headers_mut().append(SET_COOKIE, value);
            }
            Err(err) => {
                warn!(cookie = %spec.name, error = %err, "cannot encode cookie clearing header");
            }
        }
    }

    response
}
