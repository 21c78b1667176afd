//! Minimal venue API wired through the authentication pipeline.
//!
//! Run with `RUST_LOG=venue_authn=debug cargo run --example venue_api`, then:
//!
//! ```text
//! curl -s localhost:3000/auth/login -d '{"user_id": 1}' -H 'content-type: application/json'
//! curl -s localhost:3000/me -H "authorization: Bearer <token>"
//! curl -s localhost:3000/shows
//! ```

use std::sync::Arc;
use std::time::Duration;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::EnvFilter;
use venue_authn::{
    AuthConfig, AuthLayer, Authenticator, CurrentIdentity, HmacSigner, IdentityVerifier,
    InMemoryUserStore, MaybeIdentity, Signer, User, UserId,
};

#[derive(Clone)]
struct AppState {
    signer: Arc<HmacSigner>,
}

#[derive(Deserialize)]
struct Login {
    user_id: UserId,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let secret = std::env::var("AUTH_SECRET").unwrap_or_else(|_| "dev-only-secret".to_string());
    let signer = Arc::new(HmacSigner::new(secret.as_bytes(), Duration::from_secs(900)));

    let store = Arc::new(InMemoryUserStore::new());
    store.insert(User::new(1, "host@venue.example").admin());
    store.insert(User::new(2, "fan@venue.example"));
    store.insert(User::new(3, "former@venue.example").inactive());

    let config = AuthConfig::from_env()?;
    let auth = Arc::new(Authenticator::new(
        IdentityVerifier::new(signer.clone(), store),
        config,
    ));

    let app = Router::new()
        .route("/auth/login", post(login))
        .route(
            "/auth/refresh",
            post(refresh).layer(AuthLayer::lenient(auth.clone())),
        )
        .route("/me", get(me).layer(AuthLayer::strict(auth.clone())))
        .route("/shows", get(shows).layer(AuthLayer::optional(auth)))
        .with_state(AppState { signer })
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:3000").await?;
    info!(addr = %listener.local_addr()?, "venue api listening");
    axum::serve(listener, app).await?;
    Ok(())
}

// Stand-in for the real credential check.
async fn login(State(state): State<AppState>, Json(login): Json<Login>) -> Response {
    issue(&state, login.user_id)
}

async fn refresh(
    State(state): State<AppState>,
    CurrentIdentity(identity): CurrentIdentity,
) -> Response {
    issue(&state, identity.user_id())
}

async fn me(CurrentIdentity(identity): CurrentIdentity) -> Json<venue_authn::Identity> {
    Json(identity)
}

async fn shows(MaybeIdentity(identity): MaybeIdentity) -> Json<serde_json::Value> {
    let shows = [
        ("Night Market Sessions", "Dockside Hall"),
        ("Harbor Jazz", "The Lantern"),
    ];
    let saved_for = identity.as_ref().map(|id| id.user_id());

    Json(json!({
        "shows": shows
            .iter()
            .map(|(title, venue)| json!({ "title": title, "venue": venue }))
            .collect::<Vec<_>>(),
        "saved_for": saved_for,
    }))
}

fn issue(state: &AppState, user_id: UserId) -> Response {
    match state.signer.issue(user_id) {
        Ok(token) => Json(json!({ "token": token })).into_response(),
        Err(err) => {
            tracing::error!(error = %err, "token issue failed");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}
