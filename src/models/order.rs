//! Modelo de Pedido
//!
//! Este módulo contiene el struct Pedido que mapea a la tabla `pedidos`
//! del schema PostgreSQL. Los pedidos pendientes son la fuente de órdenes
//! para el planificador de rutas.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Pedido pendiente de entrega - mapea a la tabla pedidos
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Pedido {
    /// Identificador estable con formato `#ORD-NNN`
    pub id: String,
    pub cliente: String,
    pub direccion: String,
    pub fecha: NaiveDate,
    pub cajas: i32,
    pub urgencia: String,
    /// Ventana de entrega como rango "08:00-12:00", si el cliente la exigió
    pub ventana: Option<String>,
    pub zona: String,
    pub estado: String,
    pub created_at: DateTime<Utc>,
}

impl Pedido {
    /// Validar el formato de identificador `#ORD-NNN`
    pub fn id_valido(id: &str) -> bool {
        let Some(resto) = id.strip_prefix("#ORD-") else {
            return false;
        };
        !resto.is_empty() && resto.chars().all(|c| c.is_ascii_digit())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formato_de_id() {
        assert!(Pedido::id_valido("#ORD-001"));
        assert!(Pedido::id_valido("#ORD-12345"));
        assert!(!Pedido::id_valido("ORD-001"));
        assert!(!Pedido::id_valido("#ORD-"));
        assert!(!Pedido::id_valido("#ORD-12a"));
    }
}
