//! Integration tests for the axum layer.
//!
//! These tests demonstrate the complete flow from an HTTP request through
//! `AuthLayer` to a handler, or to the 401 envelope when the policy rejects.

use std::sync::Arc;
use std::time::Duration;

use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::DateTime;
use serde_json::{json, Value};
use tower::ServiceExt;
use tower_http::request_id::{MakeRequestUuid, SetRequestIdLayer};
use venue_authn::{
    AuthConfig, AuthLayer, Authenticator, CookieClearSpec, CurrentIdentity, ErrorCode,
    ErrorEnvelope, HmacSigner, IdentityVerifier, InMemoryUserStore, ManualClock, MaybeIdentity,
    Signer, User, REQUEST_ID_HEADER,
};

const TTL: Duration = Duration::from_secs(900);
const GRACE: Duration = Duration::from_secs(120);

struct App {
    clock: Arc<ManualClock>,
    signer: Arc<HmacSigner>,
    store: Arc<InMemoryUserStore>,
    router: Router,
}

fn app(clear_cookie: Option<CookieClearSpec>) -> App {
    let clock = Arc::new(ManualClock::new(
        DateTime::from_timestamp(1_760_000_000, 0).unwrap(),
    ));
    let signer = Arc::new(HmacSigner::with_clock(b"web-secret", TTL, clock.clone()));
    let store = Arc::new(InMemoryUserStore::new());
    store.insert(User::new(10, "host@venue.example").admin());
    store.insert(User::new(11, "fan@venue.example"));

    let config = AuthConfig {
        grace_period_secs: GRACE.as_secs(),
        clear_cookie,
        ..AuthConfig::default()
    };
    let verifier = IdentityVerifier::new(signer.clone(), store.clone()).with_clock(clock.clone());
    let auth = Arc::new(Authenticator::new(verifier, config));

    let refresh_signer = signer.clone();
    let router = Router::new()
        .route(
            "/me",
            get(me)
                .options(|| async { StatusCode::NO_CONTENT })
                .layer(AuthLayer::strict(auth.clone())),
        )
        .route(
            "/shows",
            get(list_shows).layer(AuthLayer::optional(auth.clone())),
        )
        .route(
            "/auth/refresh",
            post(move |CurrentIdentity(identity): CurrentIdentity| {
                let signer = refresh_signer.clone();
                async move {
                    match signer.issue(identity.user_id()) {
                        Ok(token) => Json(json!({ "token": token })).into_response(),
                        Err(_) => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
                    }
                }
            })
            .layer(AuthLayer::lenient(auth)),
        )
        .route("/unguarded", get(me));

    App {
        clock,
        signer,
        store,
        router,
    }
}

async fn me(CurrentIdentity(identity): CurrentIdentity) -> Json<Value> {
    Json(json!({
        "user_id": identity.user_id(),
        "email": identity.email(),
        "is_admin": identity.is_admin(),
    }))
}

async fn list_shows(MaybeIdentity(identity): MaybeIdentity) -> Json<Value> {
    let saved = identity.is_some();
    Json(json!({
        "shows": ["Night Market", "Harbor Jazz"],
        "personalized": saved,
    }))
}

fn get_with(uri: &str, headers: &[(&str, String)]) -> Request<Body> {
    let mut builder = Request::builder().method(Method::GET).uri(uri);
    for (name, value) in headers {
        builder = builder.header(*name, value.as_str());
    }
    builder.body(Body::empty()).unwrap()
}

fn bearer(token: &str) -> (&'static str, String) {
    ("authorization", format!("Bearer {token}"))
}

async fn json_body(response: Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

async fn envelope(response: Response) -> ErrorEnvelope {
    serde_json::from_value(json_body(response).await).unwrap()
}

#[tokio::test]
async fn strict_route_with_valid_token() {
    let app = app(None);
    let token = app.signer.issue(10).unwrap();

    let response = app
        .router
        .oneshot(get_with("/me", &[bearer(&token)]))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["user_id"], 10);
    assert_eq!(body["email"], "host@venue.example");
    assert_eq!(body["is_admin"], true);
}

#[tokio::test]
async fn strict_route_without_token_is_401_envelope() {
    let app = app(None);

    let response = app
        .router
        .oneshot(get_with(
            "/me",
            &[(REQUEST_ID_HEADER, "req-abc".to_string())],
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(response.headers().get(header::SET_COOKIE).is_none());
    assert_eq!(
        json_body(response).await,
        json!({
            "success": false,
            "message": "Authentication required",
            "error_code": "TOKEN_MISSING",
            "request_id": "req-abc",
        })
    );
}

#[tokio::test]
async fn envelope_omits_request_id_when_absent() {
    let app = app(None);

    let response = app
        .router
        .oneshot(get_with("/me", &[bearer("not.a.jwt")]))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = json_body(response).await;
    assert_eq!(body["error_code"], "TOKEN_INVALID");
    assert_eq!(body["message"], "Invalid token");
    assert!(body.get("request_id").is_none());
}

#[tokio::test]
async fn expired_token_reports_expiry_and_clears_cookie() {
    let app = app(Some(CookieClearSpec::new("auth_token")));
    let token = app.signer.issue(11).unwrap();
    app.clock.advance(TTL + Duration::from_secs(1));

    let response = app
        .router
        .oneshot(get_with(
            "/me",
            &[("cookie", format!("auth_token={token}"))],
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let set_cookie = response.headers()[header::SET_COOKIE]
        .to_str()
        .unwrap()
        .to_string();
    assert!(set_cookie.starts_with("auth_token=;"));
    assert!(set_cookie.contains("Max-Age=0"));
    assert!(set_cookie.contains("HttpOnly"));
    assert!(set_cookie.contains("Secure"));

    let envelope = envelope(response).await;
    assert_eq!(envelope.error_code, ErrorCode::TokenExpired);
    assert_eq!(
        envelope.message,
        "Your session has expired. Please log in again."
    );
    assert!(!envelope.success);
}

#[tokio::test]
async fn inactive_user_is_indistinguishable_from_bad_token() {
    let app = app(None);
    let token = app.signer.issue(11).unwrap();
    app.store.deactivate(11);

    let inactive = app
        .router
        .clone()
        .oneshot(get_with("/me", &[bearer(&token)]))
        .await
        .unwrap();
    let forged = app
        .router
        .oneshot(get_with("/me", &[bearer(&format!("{token}x"))]))
        .await
        .unwrap();

    assert_eq!(inactive.status(), forged.status());
    assert_eq!(envelope(inactive).await, envelope(forged).await);
}

#[tokio::test]
async fn optional_route_serves_anonymous_and_bad_tokens() {
    let app = app(Some(CookieClearSpec::new("auth_token")));

    for headers in [vec![], vec![bearer("garbage")]] {
        let response = app
            .router
            .clone()
            .oneshot(get_with("/shows", &headers))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().get(header::SET_COOKIE).is_none());
        assert_eq!(json_body(response).await["personalized"], false);
    }
}

#[tokio::test]
async fn optional_route_personalizes_for_identified_caller() {
    let app = app(None);
    let token = app.signer.issue(11).unwrap();

    let response = app
        .router
        .oneshot(get_with("/shows", &[bearer(&token)]))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["personalized"], true);
}

#[tokio::test]
async fn refresh_accepts_recently_expired_token() {
    let app = app(None);
    let token = app.signer.issue(11).unwrap();
    app.clock.advance(TTL + GRACE);

    let request = Request::builder()
        .method(Method::POST)
        .uri("/auth/refresh")
        .header("authorization", format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap();
    let response = app.router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let fresh = json_body(response).await["token"]
        .as_str()
        .unwrap()
        .to_string();
    let me = app
        .router
        .clone()
        .oneshot(get_with("/me", &[bearer(&fresh)]))
        .await
        .unwrap();
    assert_eq!(me.status(), StatusCode::OK);

    // The stale token stays unusable on strict routes.
    let stale = app
        .router
        .oneshot(get_with("/me", &[bearer(&token)]))
        .await
        .unwrap();
    assert_eq!(envelope(stale).await.error_code, ErrorCode::TokenExpired);
}

#[tokio::test]
async fn refresh_rejects_token_beyond_grace() {
    let app = app(None);
    let token = app.signer.issue(11).unwrap();
    app.clock.advance(TTL + GRACE + Duration::from_secs(1));

    let request = Request::builder()
        .method(Method::POST)
        .uri("/auth/refresh")
        .header("authorization", format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap();
    let response = app.router.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(envelope(response).await.error_code, ErrorCode::TokenExpired);
}

#[tokio::test]
async fn cors_preflight_skips_authentication() {
    let app = app(None);

    let request = Request::builder()
        .method(Method::OPTIONS)
        .uri("/me")
        .header(header::ORIGIN, "https://app.venue.example")
        .header(header::ACCESS_CONTROL_REQUEST_METHOD, "GET")
        .body(Body::empty())
        .unwrap();
    let response = app.router.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn plain_options_is_still_authenticated() {
    let app = app(None);

    let request = Request::builder()
        .method(Method::OPTIONS)
        .uri("/me")
        .body(Body::empty())
        .unwrap();
    let response = app.router.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn handler_without_layer_fails_closed() {
    let app = app(None);
    let token = app.signer.issue(10).unwrap();

    let response = app
        .router
        .oneshot(get_with("/unguarded", &[bearer(&token)]))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn generated_request_id_reaches_the_envelope() {
    let app = app(None);
    let router = app
        .router
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid));

    let response = router.oneshot(get_with("/me", &[])).await.unwrap();

    let envelope = envelope(response).await;
    let request_id = envelope.request_id.expect("generated id");
    assert!(!request_id.is_empty());
}
