//! Repositorio de pedidos pendientes
//!
//! Fuente de órdenes del planificador. Cada listado es un snapshot: no hay
//! actualizaciones incrementales y un re-listado puede excluir pedidos ya
//! cumplidos por otra vía.

use sqlx::PgPool;

use crate::models::order::Pedido;
use crate::utils::errors::AppResult;

pub struct OrderRepository {
    pool: PgPool,
}

impl OrderRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_pendientes(
        &self,
        zona: Option<String>,
        urgencia: Option<String>,
    ) -> AppResult<Vec<Pedido>> {
        let pedidos = sqlx::query_as::<_, Pedido>(
            r#"
            SELECT * FROM pedidos
            WHERE estado = 'pendiente'
              AND ($1::text IS NULL OR zona = $1)
              AND ($2::text IS NULL OR urgencia = $2)
            ORDER BY fecha ASC, id ASC
            "#,
        )
        .bind(zona)
        .bind(urgencia)
        .fetch_all(&self.pool)
        .await?;

        Ok(pedidos)
    }
}
