//! Rutas de pedidos
//!
//! Solo lectura: el backend de pedidos es la fuente; aquí se exponen los
//! pendientes para armar la selección a optimizar.

use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};

use crate::controllers::order_controller::OrderController;
use crate::dto::order_dto::{PedidoFilters, PedidoResponse};
use crate::state::AppState;
use crate::utils::errors::AppError;

pub fn create_order_router() -> Router<AppState> {
    Router::new().route("/pendientes", get(list_pendientes))
}

async fn list_pendientes(
    State(state): State<AppState>,
    Query(filters): Query<PedidoFilters>,
) -> Result<Json<Vec<PedidoResponse>>, AppError> {
    let controller = OrderController::new(state.pool.clone());
    let response = controller.list_pendientes(filters).await?;
    Ok(Json(response))
}
