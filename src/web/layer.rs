use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use axum::body::Body;
use axum::extract::Request;
use axum::response::Response;
use http::{header, HeaderMap, Method};
use tower::{Layer, Service};
use tracing::warn;

use crate::context::with_identity;
use crate::policy::{AuthPolicy, Authenticator, Outcome};
use crate::request_id::correlation_id;
use crate::response::failure_response;

/// Layer applying one [`AuthPolicy`] to the wrapped service.
///
/// Several layers can share one [`Authenticator`] while applying different
/// policies to different routes.
#[derive(Debug, Clone)]
pub struct AuthLayer {
    auth: Arc<Authenticator>,
    policy: AuthPolicy,
}

impl AuthLayer {
    /// Layer with an explicit policy.
    pub fn new(auth: Arc<Authenticator>, policy: AuthPolicy) -> Self {
        Self { auth, policy }
    }

    /// Identity required.
    pub fn strict(auth: Arc<Authenticator>) -> Self {
        Self::new(auth, AuthPolicy::Strict)
    }

    /// Identity required; the configured grace period applies to expiry.
    pub fn lenient(auth: Arc<Authenticator>) -> Self {
        let policy = auth.lenient_policy();
        Self::new(auth, policy)
    }

    /// Identity attached when available; never rejects.
    pub fn optional(auth: Arc<Authenticator>) -> Self {
        Self::new(auth, AuthPolicy::Optional)
    }

    /// The policy this layer applies.
    pub fn policy(&self) -> AuthPolicy {
        self.policy
    }
}

impl<S> Layer<S> for AuthLayer {
    type Service = AuthService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        AuthService {
            inner,
            auth: self.auth.clone(),
            policy: self.policy,
        }
    }
}

/// Service produced by [`AuthLayer`].
#[derive(Debug, Clone)]
pub struct AuthService<S> {
    inner: S,
    auth: Arc<Authenticator>,
    policy: AuthPolicy,
}

impl<S> Service<Request<Body>> for AuthService<S>
where
    S: Service<Request<Body>, Response = Response> + Clone + Send + 'static,
    S::Future: Send,
{
    type Response = Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut request: Request<Body>) -> Self::Future {
        let auth = self.auth.clone();
        let policy = self.policy;
        let not_ready_inner = self.inner.clone();
        let mut ready_inner = std::mem::replace(&mut self.inner, not_ready_inner);

        Box::pin(async move {
            if is_preflight_request(request.method(), request.headers()) {
                return ready_inner.call(request).await;
            }

            let request_id = correlation_id(request.extensions(), request.headers());
            let outcome = auth
                .authenticate(policy, request.headers(), request_id.as_deref())
                .await;

            let identity = match outcome {
                Outcome::Rejected(failure) => {
                    return Ok(failure_response(
                        failure,
                        request_id.as_deref(),
                        auth.config().clear_cookie.as_ref(),
                    ));
                }
                Outcome::Authenticated(identity) => Some(identity),
                Outcome::Anonymous => None,
            };

            // An outer layer already decided; its identity stands. Stacked
            // auth layers are a routing mistake.
            if let Err(err) = with_identity(request.extensions_mut(), identity) {
                warn!(
                    request_id = request_id.as_deref(),
                    policy = policy.name(),
                    "{err}, keeping the outer decision"
                );
            }

            ready_inner.call(request).await
        })
    }
}

/// OPTIONS with `Origin` and `Access-Control-Request-Method`.
fn is_preflight_request(method: &Method, headers: &HeaderMap) -> bool {
    method == Method::OPTIONS
        && headers.contains_key(header::ORIGIN)
        && headers.contains_key(header::ACCESS_CONTROL_REQUEST_METHOD)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::config::AuthConfig;
    use crate::context::current_identity;
    use crate::signer::{HmacSigner, Signer};
    use crate::store::{InMemoryUserStore, User};
    use crate::verifier::IdentityVerifier;
    use chrono::DateTime;
    use http::{HeaderValue, StatusCode};
    use std::convert::Infallible;
    use std::time::Duration;
    use tower::ServiceExt;
    use tracing_subscriber::fmt::MakeWriter;

    #[derive(Clone, Default)]
    struct Captured(Arc<parking_lot::Mutex<Vec<u8>>>);

    impl Captured {
        fn text(&self) -> String {
            String::from_utf8_lossy(&self.0.lock()).into_owned()
        }
    }

    impl std::io::Write for Captured {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl<'a> MakeWriter<'a> for Captured {
        type Writer = Captured;

        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }

    #[tokio::test]
    async fn stacked_layers_keep_outer_decision_and_warn() {
        let ttl = Duration::from_secs(600);
        let clock = Arc::new(ManualClock::new(
            DateTime::from_timestamp(1_700_000_000, 0).unwrap(),
        ));
        let signer = Arc::new(HmacSigner::with_clock(b"layer-secret", ttl, clock.clone()));
        let store = Arc::new(InMemoryUserStore::new());
        store.insert(User::new(1, "ana@example.com"));
        let verifier = IdentityVerifier::new(signer.clone(), store).with_clock(clock.clone());
        let auth = Arc::new(Authenticator::new(verifier, AuthConfig::default()));

        // Expired but within grace: optional (outer) goes anonymous, lenient (inner)
        // would authenticate.
        let token = signer.issue(1).unwrap();
        clock.advance(ttl + Duration::from_secs(10));

        let handler = tower::service_fn(|request: Request<Body>| async move {
            let status = match current_identity(request.extensions()) {
                Some(_) => StatusCode::OK,
                None => StatusCode::NO_CONTENT,
            };
            Ok::<_, Infallible>(
                http::Response::builder()
                    .status(status)
                    .body(Body::empty())
                    .unwrap(),
            )
        });
        let service =
            AuthLayer::optional(auth.clone()).layer(AuthLayer::lenient(auth).layer(handler));

        let captured = Captured::default();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(captured.clone())
            .with_ansi(false)
            .with_max_level(tracing::Level::WARN)
            .finish();
        let _guard = tracing::subscriber::set_default(subscriber);

        let request = Request::builder()
            .uri("/auth/refresh")
            .header(header::AUTHORIZATION, format!("Bearer {token}"))
            .body(Body::empty())
            .unwrap();
        let response = service.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        let logs = captured.text();
        assert!(logs.contains("WARN"), "{logs}");
        assert!(logs.contains("keeping the outer decision"), "{logs}");
    }

    #[test]
    fn preflight_detection() {
        let mut headers = HeaderMap::new();
        assert!(!is_preflight_request(&Method::OPTIONS, &headers));

        headers.insert(header::ORIGIN, HeaderValue::from_static("https://app.example"));
        assert!(!is_preflight_request(&Method::OPTIONS, &headers));

        headers.insert(
            header::ACCESS_CONTROL_REQUEST_METHOD,
            HeaderValue::from_static("GET"),
        );
        assert!(is_preflight_request(&Method::OPTIONS, &headers));
        assert!(!is_preflight_request(&Method::GET, &headers));
    }
}
