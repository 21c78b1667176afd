use http::{Extensions, HeaderMap};

/// Header carrying the correlation identifier.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Correlation identifier placed in request extensions by an upstream layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestId(pub String);

/// The request's correlation identifier.
///
/// A [`RequestId`] extension wins over the `x-request-id` header. Empty or
/// non-UTF-8 values count as absent.
pub fn correlation_id(extensions: &Extensions, headers: &HeaderMap) -> Option<String> {
    if let Some(RequestId(id)) = extensions.get::<RequestId>() {
        if !id.is_empty() {
            return Some(id.clone());
        }
    }

    headers
        .get(REQUEST_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(str::to_owned)
}
