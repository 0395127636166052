use crate::channels::whatsapp::parse_webhook_payload;
use crate::config::GatewayConfig;
use crate::error::DigestError;
use crate::router::{Action, RequestRouter, Trigger, error_json};
use axum::extract::rejection::JsonRejection;
use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use std::future::Future;
use std::sync::Arc;

/// Shared state for the HTTP gateway.
#[derive(Clone)]
pub struct GatewayState {
    router: RequestRouter,
    trigger_token: Arc<str>,
    verify_token: Arc<str>,
}

impl GatewayState {
    pub fn new(router: RequestRouter, trigger_token: &str, verify_token: &str) -> Self {
        Self {
            router,
            trigger_token: Arc::from(trigger_token),
            verify_token: Arc::from(verify_token),
        }
    }
}

#[derive(serde::Deserialize)]
struct TriggerBody {
    action: String,
    user_id: String,
}

#[derive(serde::Deserialize)]
struct WhatsAppVerifyQuery {
    #[serde(rename = "hub.mode")]
    mode: Option<String>,
    #[serde(rename = "hub.verify_token")]
    verify_token: Option<String>,
    #[serde(rename = "hub.challenge")]
    challenge: Option<String>,
}

/// Build the gateway routes.
pub fn app(state: GatewayState) -> Router {
    Router::new()
        .route("/health", get(gateway_health))
        .route("/trigger", post(direct_trigger))
        .route("/whatsapp", get(whatsapp_verify).post(whatsapp_inbound))
        .with_state(state)
}

/// Bind and serve until `shutdown` resolves.
pub async fn run_gateway(
    config: &GatewayConfig,
    state: GatewayState,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> anyhow::Result<()> {
    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    let local_addr = listener.local_addr()?;

    tracing::info!("gateway listening on http://{local_addr}");
    axum::serve(listener, app(state))
        .with_graceful_shutdown(shutdown)
        .await?;
    Ok(())
}

async fn gateway_health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok"
    }))
}

fn bearer_is_valid(headers: &HeaderMap, expected: &str) -> bool {
    let header_value = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    let candidate = header_value
        .strip_prefix("Bearer ")
        .unwrap_or_default()
        .trim();
    !expected.is_empty() && candidate == expected
}

/// HTTP status reported for each error category.
pub fn status_for(err: &DigestError) -> StatusCode {
    match err {
        DigestError::ProfileNotFound(_) => StatusCode::NOT_FOUND,
        DigestError::DestinationNotSet(_) | DigestError::CredentialMissing(_) => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        DigestError::AuthExpired(_) => StatusCode::FAILED_DEPENDENCY,
        DigestError::DispatchRejected(_) | DigestError::Agenda(_) => StatusCode::BAD_GATEWAY,
        DigestError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

async fn direct_trigger(
    State(state): State<GatewayState>,
    headers: HeaderMap,
    payload: Result<Json<TriggerBody>, JsonRejection>,
) -> Response {
    if !bearer_is_valid(&headers, &state.trigger_token) {
        return (
            StatusCode::UNAUTHORIZED,
            Json(serde_json::json!({"ok": false, "error": "unauthorized"})),
        )
            .into_response();
    }
    let body = match payload {
        Ok(Json(body)) => body,
        Err(rejection) => {
            tracing::debug!(error = %rejection, "trigger body rejected");
            return (
                StatusCode::BAD_REQUEST,
                Json(serde_json::json!({
                    "ok": false,
                    "error": "invalid_body",
                    "message": rejection.body_text()
                })),
            )
                .into_response();
        }
    };

    let user_id = body.user_id.trim();
    if user_id.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({"ok": false, "error": "user_id is required"})),
        )
            .into_response();
    }
    let action = match body.action.parse::<Action>() {
        Ok(action) => action,
        Err(message) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(serde_json::json!({"ok": false, "error": "unknown_action", "message": message})),
            )
                .into_response();
        }
    };

    let trigger = Trigger::Direct {
        action,
        user_id: user_id.to_owned(),
    };
    match state.router.handle(trigger, Utc::now()).await {
        Ok(outcome) => (StatusCode::OK, Json(outcome.to_json())).into_response(),
        Err(err) => (status_for(&err), Json(error_json(&err))).into_response(),
    }
}

async fn whatsapp_verify(
    State(state): State<GatewayState>,
    Query(query): Query<WhatsAppVerifyQuery>,
) -> Response {
    let mode = query.mode.unwrap_or_default();
    let token = query.verify_token.unwrap_or_default();
    if mode == "subscribe" && !state.verify_token.is_empty() && token == *state.verify_token {
        let challenge = query.challenge.unwrap_or_default();
        return (StatusCode::OK, challenge).into_response();
    }

    tracing::warn!("whatsapp webhook verification rejected");
    (StatusCode::FORBIDDEN, "verification failed").into_response()
}

/// Provider webhook. Always acknowledged with 200 so the provider does not
/// retry; the body reports what happened to each message.
async fn whatsapp_inbound(
    State(state): State<GatewayState>,
    Json(payload): Json<serde_json::Value>,
) -> impl IntoResponse {
    let mut results = Vec::new();
    for message in parse_webhook_payload(&payload) {
        let report = match state.router.handle(Trigger::Inbound(message), Utc::now()).await {
            Ok(outcome) => outcome.to_json(),
            Err(err) => error_json(&err),
        };
        results.push(report);
    }

    (
        StatusCode::OK,
        Json(serde_json::json!({
            "received": true,
            "results": results
        })),
    )
}
