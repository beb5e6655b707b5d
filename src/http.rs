//! HTTP routes exercising the session workflow.
//!
//! Credentials are not checked here: deciding who may sign in is the
//! application's concern. These routes only show how handlers drive the
//! session layer.

use axum::{
    Json, Router,
    extract::State,
    http::{HeaderMap, StatusCode},
    routing::{get, post, put},
};
use serde::Deserialize;
use serde_json::{Value, json};

use crate::error::Result;
use crate::model::{Account, Authority};
use crate::session::{RequestContext, SessionManager};

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub id: u32,
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct LanguageRequest {
    pub lang: String,
}

/// Router with the session routes, sharing one manager across requests
pub fn routes(sessions: SessionManager) -> Router {
    Router::new()
        .route("/api/auth/login", post(login))
        .route("/api/auth/logout", post(logout))
        .route("/api/account/me", get(current_account))
        .route("/api/lang", put(set_language).get(get_language))
        .route("/health", get(health))
        .with_state(sessions)
}

async fn login(
    State(sessions): State<SessionManager>,
    mut ctx: RequestContext,
    Json(req): Json<LoginRequest>,
) -> Result<(HeaderMap, Json<Value>)> {
    let authority = Authority {
        id: 2,
        name: "User".to_string(),
    };
    let account = Account::new(req.id, req.name, authority);

    sessions.set_identity(&mut ctx, &account).await?;
    sessions.save(&mut ctx).await?;
    tracing::info!(account_id = account.id, "Signed in");

    Ok((ctx.into_response_headers(), Json(json!({ "account": account }))))
}

async fn logout(
    State(sessions): State<SessionManager>,
    mut ctx: RequestContext,
) -> Result<(HeaderMap, Json<Value>)> {
    sessions.delete(&mut ctx).await?;
    Ok((ctx.into_response_headers(), Json(json!({ "signed_out": true }))))
}

async fn current_account(
    State(sessions): State<SessionManager>,
    mut ctx: RequestContext,
) -> Json<Value> {
    let account: Option<Account> = sessions.get_identity(&mut ctx).await;
    Json(json!({ "account": account }))
}

async fn set_language(
    State(sessions): State<SessionManager>,
    mut ctx: RequestContext,
    Json(req): Json<LanguageRequest>,
) -> Result<(HeaderMap, Json<Value>)> {
    sessions.set_value(&mut ctx, "lang", &req.lang).await?;
    sessions.save(&mut ctx).await?;
    Ok((ctx.into_response_headers(), Json(json!({ "lang": req.lang }))))
}

async fn get_language(
    State(sessions): State<SessionManager>,
    mut ctx: RequestContext,
) -> Json<Value> {
    let lang = sessions.get_value(&mut ctx, "lang").await;
    Json(json!({ "lang": lang }))
}

/// Session backend health; 503 when the backend cannot serve sessions
async fn health(State(sessions): State<SessionManager>) -> (StatusCode, Json<Value>) {
    let store = sessions.store();
    let healthy = store.is_healthy();
    let status = if healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        status,
        Json(json!({
            "status": if healthy { "healthy" } else { "unhealthy" },
            "session_backend": store.name(),
        })),
    )
}
