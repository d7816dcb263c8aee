//! Controller de pedidos pendientes

use sqlx::PgPool;

use crate::dto::order_dto::{PedidoFilters, PedidoResponse};
use crate::models::planning::Urgency;
use crate::repositories::order_repository::OrderRepository;
use crate::utils::errors::{AppError, AppResult};

pub struct OrderController {
    repository: OrderRepository,
}

impl OrderController {
    pub fn new(pool: PgPool) -> Self {
        Self {
            repository: OrderRepository::new(pool),
        }
    }

    pub async fn list_pendientes(&self, filters: PedidoFilters) -> AppResult<Vec<PedidoResponse>> {
        if let Some(urgencia) = &filters.urgencia {
            if Urgency::parse(urgencia).is_none() {
                return Err(AppError::BadRequest(format!(
                    "urgencia inválida: '{}'",
                    urgencia
                )));
            }
        }

        let pedidos = self
            .repository
            .find_pendientes(filters.zona, filters.urgencia)
            .await?;

        Ok(pedidos.into_iter().map(Into::into).collect())
    }
}
