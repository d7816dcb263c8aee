//! Rutas de optimización
//!
//! Expone la corrida de optimización y la consulta de corridas cacheadas.

use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use tracing::info;
use uuid::Uuid;

use crate::dto::optimize_dto::{OptimizeRequest, OptimizeResponse};
use crate::state::AppState;
use crate::utils::errors::AppError;

pub fn create_optimization_router() -> Router<AppState> {
    Router::new()
        .route("/", post(optimize))
        .route("/:id", get(get_planning_run))
}

/// Optimizar la selección de pedidos y cachear el resultado
async fn optimize(
    State(state): State<AppState>,
    Json(request): Json<OptimizeRequest>,
) -> Result<Json<OptimizeResponse>, AppError> {
    info!(
        "Solicitud de optimización con {} pedidos",
        request.pedidos.len()
    );

    let response = state.optimizer.optimize(request).await?;
    state.store_planning_run(response.clone()).await;

    Ok(Json(response))
}

/// Recuperar una corrida de planificación cacheada por su id
async fn get_planning_run(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<OptimizeResponse>, AppError> {
    state
        .get_planning_run(id)
        .await
        .map(Json)
        .ok_or(AppError::NotFound(
            "Corrida de planificación no encontrada o expirada".to_string(),
        ))
}
