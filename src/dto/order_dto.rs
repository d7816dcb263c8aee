//! DTOs de pedidos pendientes

use serde::{Deserialize, Serialize};

use crate::models::order::Pedido;

/// Filtros de GET /pedidos/pendientes
#[derive(Debug, Deserialize)]
pub struct PedidoFilters {
    pub zona: Option<String>,
    pub urgencia: Option<String>,
}

/// Pedido pendiente expuesto al front-office
#[derive(Debug, Serialize)]
pub struct PedidoResponse {
    pub id_pedido: String,
    pub cliente: String,
    pub direccion: String,
    pub fecha: String,
    pub cajas: i32,
    pub urgencia: String,
    pub ventana: Option<String>,
    pub zona: String,
}

impl From<Pedido> for PedidoResponse {
    fn from(pedido: Pedido) -> Self {
        Self {
            id_pedido: pedido.id,
            cliente: pedido.cliente,
            direccion: pedido.direccion,
            fecha: pedido.fecha.format("%Y-%m-%d").to_string(),
            cajas: pedido.cajas,
            urgencia: pedido.urgencia,
            ventana: pedido.ventana,
            zona: pedido.zona,
        }
    }
}
