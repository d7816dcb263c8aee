//! Shared application state
//!
//! Este módulo define el estado compartido que se pasa a través del router
//! de Axum: pool de base de datos, configuración, el servicio optimizador y
//! el cache de corridas de planificación.
//!
//! El cache reemplaza el session storage del front original: cada resultado
//! de optimización queda disponible por su `id_planificacion` durante un TTL
//! corto, para que la vista de resultados pueda recargarlo sin estado global
//! en el cliente.

use sqlx::PgPool;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::config::environment::EnvironmentConfig;
use crate::dto::optimize_dto::OptimizeResponse;
use crate::services::optimizer_service::OptimizerService;

/// Corrida de planificación cacheada
#[derive(Clone, Debug)]
pub struct PlanningRun {
    pub response: OptimizeResponse,
    pub expires_at: chrono::DateTime<chrono::Utc>,
}

impl PlanningRun {
    pub fn new(response: OptimizeResponse, ttl_minutes: i64) -> Self {
        Self {
            response,
            expires_at: chrono::Utc::now() + chrono::Duration::minutes(ttl_minutes),
        }
    }

    pub fn is_expired(&self) -> bool {
        chrono::Utc::now() > self.expires_at
    }
}

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: EnvironmentConfig,
    pub optimizer: Arc<OptimizerService>,
    planning_runs: Arc<RwLock<HashMap<Uuid, PlanningRun>>>,
}

impl AppState {
    pub fn new(pool: PgPool, config: EnvironmentConfig, optimizer: OptimizerService) -> Self {
        Self {
            pool,
            config,
            optimizer: Arc::new(optimizer),
            planning_runs: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Guardar una corrida; de paso se limpian las expiradas
    pub async fn store_planning_run(&self, response: OptimizeResponse) {
        let id = response.id_planificacion;
        let run = PlanningRun::new(response, self.config.planning_cache_ttl_minutes);

        let mut runs = self.planning_runs.write().await;
        runs.retain(|_, r| !r.is_expired());
        runs.insert(id, run);

        log::info!("Corrida {} cacheada ({} vivas)", id, runs.len());
    }

    pub async fn get_planning_run(&self, id: Uuid) -> Option<OptimizeResponse> {
        let runs = self.planning_runs.read().await;
        runs.get(&id)
            .filter(|run| !run.is_expired())
            .map(|run| run.response.clone())
    }
}
