use std::future::Future;
use std::sync::Arc;

use axum::{
    extract::{Json, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::watch;
use tracing::{error, info, warn};

use crate::config::Config;
use crate::config_store::SqliteConfigStore;
use crate::domains::message::{GroupId, InboundMessage, UserId};
use crate::error::{ForwardBotError, Result};
use crate::interfaces::delivery::MessageSender;
use crate::plugins::forward::ForwardPlugin;
use crate::plugins::manager::PluginHost;
use crate::relay::RelayState;
use crate::services::delivery::{HttpMessageSender, LogMessageSender};

#[derive(Clone)]
pub struct AppState {
    pub host: Arc<PluginHost>,
    pub relay: Arc<RelayState>,
    pub token: String,
    pub fatal: Arc<watch::Sender<Option<String>>>,
}

impl AppState {
    pub fn new(host: PluginHost, relay: Arc<RelayState>, token: &str) -> Self {
        let (fatal, _) = watch::channel(None);
        Self {
            host: Arc::new(host),
            relay,
            token: token.to_string(),
            fatal: Arc::new(fatal),
        }
    }

    /// Message of the fatal error that stopped the daemon, if any.
    pub fn fatal_error(&self) -> Option<String> {
        self.fatal.borrow().clone()
    }
}

#[derive(Serialize)]
struct HealthResponse {
    status: String,
}

#[derive(Deserialize)]
struct InboundEventRequest {
    sender_id: String,
    sender_name: Option<String>,
    text: String,
    group_id: Option<String>,
}

impl InboundEventRequest {
    fn into_message(self) -> Option<InboundMessage> {
        let sender_id = UserId::parse(&self.sender_id)?;
        let sender_name = self
            .sender_name
            .filter(|name| !name.trim().is_empty())
            .unwrap_or_else(|| sender_id.to_string());
        Some(InboundMessage {
            sender_id,
            sender_name,
            text: self.text,
            group_id: self.group_id.map(GroupId::new),
        })
    }
}

#[derive(Serialize)]
struct InboundEventResponse {
    replies: Vec<String>,
}

#[derive(Serialize)]
struct StatusResponse {
    forward_target: Option<UserId>,
    plugins: Vec<Value>,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/events", post(events))
        .route("/status", get(status))
        .with_state(state)
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

async fn events(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<InboundEventRequest>,
) -> impl IntoResponse {
    if let Err(err) = authorize(&headers, &state.token) {
        return err.into_response();
    }

    let Some(message) = payload.into_message() else {
        return (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: "sender_id is required".to_string(),
            }),
        )
            .into_response();
    };

    match state.host.dispatch(&message).await {
        Ok(replies) => (StatusCode::OK, Json(InboundEventResponse { replies })).into_response(),
        Err(err) => {
            if err.is_fatal() {
                error!(error = %err, "configuration write failed, shutting down");
                state.fatal.send_replace(Some(err.to_string()));
            } else {
                warn!(error = %err, sender_id = %message.sender_id, "event handling failed");
            }
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: err.to_string(),
                }),
            )
                .into_response()
        }
    }
}

async fn status(State(state): State<AppState>, headers: HeaderMap) -> impl IntoResponse {
    if let Err(err) = authorize(&headers, &state.token) {
        return err.into_response();
    }

    (
        StatusCode::OK,
        Json(StatusResponse {
            forward_target: state.relay.get().await,
            plugins: state.host.list_plugins(),
        }),
    )
        .into_response()
}

fn authorize(
    headers: &HeaderMap,
    token: &str,
) -> std::result::Result<(), (StatusCode, Json<ErrorResponse>)> {
    if token.is_empty() {
        return Ok(());
    }
    let header = headers
        .get("authorization")
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default();
    let api_key = headers
        .get("x-api-key")
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default();
    let bearer = header.strip_prefix("Bearer ").unwrap_or("");

    if bearer == token || api_key == token {
        Ok(())
    } else {
        Err((
            StatusCode::UNAUTHORIZED,
            Json(ErrorResponse {
                error: "Unauthorized".to_string(),
            }),
        ))
    }
}

pub fn build_sender(config: &Config) -> Result<Arc<dyn MessageSender>> {
    match config.delivery_url() {
        Some(_) => Ok(Arc::new(HttpMessageSender::from_config(&config.delivery)?)),
        None => {
            warn!("no delivery url configured, relayed messages will only be logged");
            Ok(Arc::new(LogMessageSender))
        }
    }
}

pub fn build_state(config: &Config) -> Result<AppState> {
    let store = Arc::new(SqliteConfigStore::open(config.db_path())?);
    let relay = Arc::new(RelayState::load(store)?);
    let plugin = Arc::new(ForwardPlugin::new(relay.clone(), build_sender(config)?));

    let mut host = PluginHost::new(config.command_prefix());
    if !host.register_plugin(plugin) {
        return Err(ForwardBotError::Runtime(
            "failed to register forward plugin".to_string(),
        ));
    }
    Ok(AppState::new(host, relay, config.daemon_token()))
}

pub async fn run(config: Config) -> Result<()> {
    run_with_shutdown(config, futures::future::pending::<()>()).await
}

pub async fn run_with_shutdown<F>(config: Config, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let state = build_state(&config)?;
    let mut fatal_rx = state.fatal.subscribe();
    let app = build_router(state.clone());

    let addr = format!("{}:{}", config.host(), config.port());
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| ForwardBotError::Runtime(e.to_string()))?;
    info!(%addr, "forward-bot daemon listening");

    let shutdown = async move {
        tokio::select! {
            _ = shutdown => {}
            _ = async {
                let _ = fatal_rx.wait_for(|fatal| fatal.is_some()).await;
            } => {}
        }
    };

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|e| ForwardBotError::Runtime(e.to_string()))?;

    match state.fatal_error() {
        Some(message) => Err(ForwardBotError::Persistence(message)),
        None => Ok(()),
    }
}
