//! API request handlers

use axum::{
    extract::{rejection::JsonRejection, rejection::QueryRejection, Query, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;

use super::types::*;
use crate::engine::EngineConnector;
use crate::manager::WorkerManager;
use crate::models::{CreationRequest, EngineConnectionSpec, Worker};

/// Shared, read-only handler context. Engine connections are opened per
/// request through `connector` and dropped when the handler returns.
pub struct AppContext {
    pub connector: Arc<dyn EngineConnector>,
    pub default_connection: EngineConnectionSpec,
    pub image_prefix: String,
}

impl AppContext {
    fn manager(&self, spec: &EngineConnectionSpec) -> crate::Result<WorkerManager> {
        let engine = self.connector.connect(spec)?;
        Ok(WorkerManager::with_prefix(engine, self.image_prefix.clone()))
    }
}

pub type AppState = Arc<AppContext>;

type HandlerError = (StatusCode, Json<ApiError>);

// === Health ===

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

// === Workers ===

pub async fn create_slave(
    State(ctx): State<AppState>,
    payload: Result<Json<CreationRequest>, JsonRejection>,
) -> Result<Json<Worker>, HandlerError> {
    let Json(req) = payload.map_err(|e| validation_error(e.body_text()))?;
    let manager = ctx.manager(&req.container_config).map_err(to_api_error)?;
    let worker = manager
        .create_worker(&req.image, &req.request, &req.boomer_cmd)
        .await
        .map_err(to_api_error)?;
    Ok(Json(worker))
}

pub async fn list_slave(
    State(ctx): State<AppState>,
    engine: Result<Query<EngineQuery>, QueryRejection>,
) -> Result<Json<Vec<Worker>>, HandlerError> {
    let manager = manager_for(&ctx, engine)?;
    let workers = manager.list_workers().await.map_err(to_api_error)?;
    Ok(Json(workers))
}

pub async fn stop_slave_by_id(
    State(ctx): State<AppState>,
    query: Result<Query<StopByIdQuery>, QueryRejection>,
    engine: Result<Query<EngineQuery>, QueryRejection>,
) -> Result<Json<bool>, HandlerError> {
    let Query(query) = query.map_err(|e| validation_error(e.body_text()))?;
    let manager = manager_for(&ctx, engine)?;
    let stopped = manager
        .stop_by_id(&query.container_id)
        .await
        .map_err(to_api_error)?;
    Ok(Json(stopped))
}

pub async fn remove_slave_by_id(
    State(ctx): State<AppState>,
    query: Result<Query<RemoveByIdQuery>, QueryRejection>,
    engine: Result<Query<EngineQuery>, QueryRejection>,
) -> Result<Json<bool>, HandlerError> {
    let Query(query) = query.map_err(|e| validation_error(e.body_text()))?;
    let manager = manager_for(&ctx, engine)?;
    let removed = manager
        .remove_by_id(&query.container_id, query.force)
        .await
        .map_err(to_api_error)?;
    Ok(Json(removed))
}

pub async fn stop_slave_by_name(
    State(ctx): State<AppState>,
    query: Result<Query<ByNameQuery>, QueryRejection>,
    engine: Result<Query<EngineQuery>, QueryRejection>,
) -> Result<Json<bool>, HandlerError> {
    let Query(query) = query.map_err(|e| validation_error(e.body_text()))?;
    let manager = manager_for(&ctx, engine)?;
    let stopped = manager.stop_by_name(&query.name).await.map_err(to_api_error)?;
    Ok(Json(stopped))
}

pub async fn remove_slave_by_name(
    State(ctx): State<AppState>,
    query: Result<Query<ByNameQuery>, QueryRejection>,
    engine: Result<Query<EngineQuery>, QueryRejection>,
) -> Result<Json<bool>, HandlerError> {
    let Query(query) = query.map_err(|e| validation_error(e.body_text()))?;
    let manager = manager_for(&ctx, engine)?;
    let removed = manager.remove_by_name(&query.name).await.map_err(to_api_error)?;
    Ok(Json(removed))
}

pub async fn stop_all_slave(
    State(ctx): State<AppState>,
    engine: Result<Query<EngineQuery>, QueryRejection>,
) -> Result<Json<()>, HandlerError> {
    let manager = manager_for(&ctx, engine)?;
    manager.stop_all_workers().await.map_err(to_api_error)?;
    Ok(Json(()))
}

/// Always answers `true` once the sweep ran; per-container failures are
/// only logged.
pub async fn remove_all_slave(
    State(ctx): State<AppState>,
    query: Result<Query<ForceQuery>, QueryRejection>,
    engine: Result<Query<EngineQuery>, QueryRejection>,
) -> Result<Json<bool>, HandlerError> {
    let Query(query) = query.map_err(|e| validation_error(e.body_text()))?;
    let manager = manager_for(&ctx, engine)?;
    manager
        .remove_all_workers(query.force)
        .await
        .map_err(to_api_error)?;
    Ok(Json(true))
}

// === Helpers ===

fn manager_for(
    ctx: &AppContext,
    engine: Result<Query<EngineQuery>, QueryRejection>,
) -> Result<WorkerManager, HandlerError> {
    let Query(engine) = engine.map_err(|e| validation_error(e.body_text()))?;
    let spec = engine.resolve(&ctx.default_connection);
    ctx.manager(&spec).map_err(to_api_error)
}

fn to_api_error(e: crate::Error) -> HandlerError {
    let status = match &e {
        crate::Error::EngineUnavailable(_) => StatusCode::BAD_GATEWAY,
        crate::Error::NotFound(_) => StatusCode::NOT_FOUND,
        crate::Error::Conflict(_) => StatusCode::CONFLICT,
        crate::Error::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };

    if status.is_server_error() {
        tracing::error!(error = %e, "Request failed");
    }

    (status, Json(ApiError {
        error: e.kind().to_string(),
        message: e.to_string(),
    }))
}

fn validation_error(message: String) -> HandlerError {
    (StatusCode::UNPROCESSABLE_ENTITY, Json(ApiError {
        error: "ValidationError".to_string(),
        message,
    }))
}
