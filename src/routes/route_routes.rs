//! Rutas de rutas persistidas
//!
//! Aceptación de un resultado de optimización, listado, detalle y
//! transiciones de estado.

use axum::{
    extract::{Path, Query, State},
    routing::{get, patch, post},
    Json, Router,
};
use uuid::Uuid;

use crate::controllers::route_controller::RouteController;
use crate::dto::route_dto::{
    CreateRutaRequest, CreateRutaResponse, RutaFilters, RutaResponse, UpdateEstadoRequest,
};
use crate::state::AppState;
use crate::utils::errors::AppError;

pub fn create_route_router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_ruta))
        .route("/", get(list_rutas))
        .route("/:id", get(get_ruta))
        .route("/:id/estado", patch(update_estado))
}

async fn create_ruta(
    State(state): State<AppState>,
    Json(request): Json<CreateRutaRequest>,
) -> Result<Json<CreateRutaResponse>, AppError> {
    let controller = RouteController::new(state.pool.clone());
    let response = controller.create(request).await?;
    Ok(Json(response))
}

async fn get_ruta(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<RutaResponse>, AppError> {
    let controller = RouteController::new(state.pool.clone());
    let response = controller.get_by_id(id).await?;
    Ok(Json(response))
}

async fn list_rutas(
    State(state): State<AppState>,
    Query(filters): Query<RutaFilters>,
) -> Result<Json<Vec<RutaResponse>>, AppError> {
    let controller = RouteController::new(state.pool.clone());
    let response = controller.list(filters).await?;
    Ok(Json(response))
}

async fn update_estado(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateEstadoRequest>,
) -> Result<Json<RutaResponse>, AppError> {
    let controller = RouteController::new(state.pool.clone());
    let response = controller.update_estado(id, request).await?;
    Ok(Json(response))
}
