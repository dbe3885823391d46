use crate::config::ApiConfig;
use crate::db::models::{
    Alert, CreateAlertRequest, Device, LoginCredentials, PublicUser, UpdateAlertRequest,
    UpdateDeviceRequest,
};
use crate::db::repositories::alerts::AlertsRepository;
use crate::db::repositories::devices::DevicesRepository;
use crate::error::Error;
use crate::messaging::{EventBus, EventType};
use crate::notifier::{self, EscalationNotifier};
use crate::security::auth::AuthService;
use anyhow::Result;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use log::{error, info};
use serde::Serialize;
use serde_json::json;
use sqlx::SqlitePool;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;

// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub db_pool: Arc<SqlitePool>,
    pub bus: Arc<EventBus>,
    pub auth_service: Arc<AuthService>,
    pub notifier: Option<Arc<dyn EscalationNotifier>>,
}

pub type ApiResult<T> = std::result::Result<T, ApiError>;

#[derive(Debug)]
pub struct ApiError {
    pub message: String,
    pub status: StatusCode,
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        match err {
            Error::Authentication(_) => ApiError {
                message: err.to_string(),
                status: StatusCode::UNAUTHORIZED,
            },
            Error::NotFound(_) => ApiError {
                message: err.to_string(),
                status: StatusCode::NOT_FOUND,
            },
            Error::Validation(_) | Error::Config(_) => ApiError {
                message: err.to_string(),
                status: StatusCode::BAD_REQUEST,
            },
            Error::Database(_) => {
                // Store failures keep their detail in the server log only.
                error!("{}", err);
                ApiError {
                    message: "Internal server error".to_string(),
                    status: StatusCode::INTERNAL_SERVER_ERROR,
                }
            }
            _ => ApiError {
                message: err.to_string(),
                status: StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        if let Some(err) = err.downcast_ref::<Error>() {
            return err.clone().into();
        }

        error!("{:#}", err);
        ApiError {
            message: "Internal server error".to_string(),
            status: StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Implement IntoResponse for ApiError
impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(json!({ "status": "error", "message": self.message }));
        (self.status, body).into_response()
    }
}

#[derive(Debug, Serialize)]
pub struct AlertResponse {
    pub status: &'static str,
    pub message: &'static str,
    pub alert: Alert,
}

#[derive(Debug, Serialize)]
pub struct DeviceResponse {
    pub status: &'static str,
    pub message: &'static str,
    pub device: Device,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub status: &'static str,
    pub user: PublicUser,
    pub token: String,
}

pub struct RestApi {
    config: ApiConfig,
    state: AppState,
}

impl RestApi {
    pub fn new(config: &ApiConfig, state: AppState) -> Result<Self> {
        Ok(Self {
            config: config.clone(),
            state,
        })
    }

    /// Build the application router. Separate from [`run`](Self::run) so
    /// tests can drive it without a listening socket.
    pub fn router(state: AppState, static_dir: &std::path::Path) -> Router {
        // Allow all origins and preflight requests; the dashboard is served
        // from a different origin in development.
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
            .max_age(Duration::from_secs(3600));

        Router::new()
            .route("/api/login", post(login))
            .route("/api/alerts", get(list_alerts).post(create_alert))
            .route("/api/alerts/:id", put(update_alert).patch(update_alert))
            .route("/api/devices", get(list_devices))
            .route("/api/devices/:id", put(update_device))
            .route("/api/health", get(health))
            .route("/ws", get(super::websocket::handle_ws_upgrade))
            .with_state(state)
            // Serve the dashboard build and stored snapshots
            .fallback_service(ServeDir::new(static_dir))
            .layer(cors)
    }

    pub async fn run(&self) -> Result<()> {
        let app = Self::router(self.state.clone(), &self.config.static_dir);

        let addr: SocketAddr = format!("{}:{}", self.config.address, self.config.port).parse()?;
        info!("API server listening on {}", addr);

        let listener = TcpListener::bind(addr).await?;

        axum::Server::from_tcp(listener.into_std()?)?
            .serve(app.into_make_service())
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        Ok(())
    }
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    info!("Shutdown signal received");
}

async fn login(
    State(state): State<AppState>,
    Json(credentials): Json<LoginCredentials>,
) -> ApiResult<Json<LoginResponse>> {
    let (user, token) = state.auth_service.login(&credentials).await?;

    Ok(Json(LoginResponse {
        status: "success",
        user: PublicUser::from(&user),
        token: token.access_token,
    }))
}

async fn list_alerts(State(state): State<AppState>) -> ApiResult<Json<Vec<Alert>>> {
    let repo = AlertsRepository::new(Arc::clone(&state.db_pool));
    let alerts = repo.get_all().await?;
    Ok(Json(alerts))
}

async fn create_alert(
    State(state): State<AppState>,
    Json(req): Json<CreateAlertRequest>,
) -> ApiResult<(StatusCode, Json<AlertResponse>)> {
    let repo = AlertsRepository::new(Arc::clone(&state.db_pool));
    let alert = repo.create(&req).await?;

    // Broadcast is unconditional on success; nothing is emitted on failure.
    state.bus.publish_record(EventType::NewAlert, &alert);

    Ok((
        StatusCode::CREATED,
        Json(AlertResponse {
            status: "success",
            message: "Alert created",
            alert,
        }),
    ))
}

async fn update_alert(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(changes): Json<UpdateAlertRequest>,
) -> ApiResult<Json<AlertResponse>> {
    let repo = AlertsRepository::new(Arc::clone(&state.db_pool));
    let (alert, prior_status) = repo.update(&id, &changes).await?;

    state.bus.publish_record(EventType::UpdateAlert, &alert);

    if notifier::is_escalation_transition(prior_status, alert.status) {
        if let Some(sink) = state.notifier.clone() {
            // Best effort, off the request path.
            let escalated = alert.clone();
            tokio::spawn(async move {
                if let Err(e) = sink.notify_escalation(&escalated).await {
                    error!(
                        "Escalation notification failed for {}: {}",
                        escalated.id, e
                    );
                }
            });
        }
    }

    Ok(Json(AlertResponse {
        status: "success",
        message: "Alert updated",
        alert,
    }))
}

async fn list_devices(State(state): State<AppState>) -> ApiResult<Json<Vec<Device>>> {
    let repo = DevicesRepository::new(Arc::clone(&state.db_pool));
    let devices = repo.get_all().await?;
    Ok(Json(devices))
}

async fn update_device(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(changes): Json<UpdateDeviceRequest>,
) -> ApiResult<Json<DeviceResponse>> {
    let repo = DevicesRepository::new(Arc::clone(&state.db_pool));
    let device = repo.update(&id, &changes).await?;

    state.bus.publish_record(EventType::DeviceUpdate, &device);

    Ok(Json(DeviceResponse {
        status: "success",
        message: "Device updated",
        device,
    }))
}

async fn health(State(state): State<AppState>) -> ApiResult<Json<serde_json::Value>> {
    let database = sqlx::query("SELECT 1")
        .execute(&*state.db_pool)
        .await
        .is_ok();

    Ok(Json(json!({
        "status": if database { "ok" } else { "degraded" },
        "database": database,
    })))
}
