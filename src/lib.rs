//! Backend de planificación de rutas de reparto farmacéutico
//!
//! Arquitectura MVC: routes → controllers → repositories, con el motor de
//! optimización en services y los contratos JSON en dto.

pub mod config;
pub mod controllers;
pub mod database;
pub mod dto;
pub mod middleware;
pub mod models;
pub mod repositories;
pub mod routes;
pub mod services;
pub mod state;
pub mod utils;

use axum::Router;

use middleware::cors::cors_middleware;
use state::AppState;

/// Armar el router completo de la API
pub fn create_app(app_state: AppState) -> Router {
    Router::new()
        .nest("/pedidos", routes::order_routes::create_order_router())
        .nest(
            "/rutas/optimizar",
            routes::optimization_routes::create_optimization_router(),
        )
        .nest("/rutas", routes::route_routes::create_route_router())
        .layer(cors_middleware())
        .with_state(app_state)
}
