//! Controller de rutas persistidas
//!
//! Orquesta la aceptación de un Route Result, el listado, el detalle y las
//! transiciones del ciclo de vida (solo hacia adelante).

use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

use crate::dto::route_dto::{
    CreateRutaRequest, CreateRutaResponse, RutaFilters, RutaResponse, UpdateEstadoRequest,
};
use crate::models::route::RouteStatus;
use crate::repositories::route_repository::RouteRepository;
use crate::utils::errors::{AppError, AppResult};

const DEFAULT_LIMIT: i64 = 50;
const MAX_LIMIT: i64 = 200;

pub struct RouteController {
    repository: RouteRepository,
}

impl RouteController {
    pub fn new(pool: PgPool) -> Self {
        Self {
            repository: RouteRepository::new(pool),
        }
    }

    /// Aceptar un resultado de optimización y volverlo durable (estado
    /// inicial pending). Sin clave de idempotencia cada aceptación crea un
    /// registro nuevo; el contrato no deduplica.
    pub async fn create(&self, request: CreateRutaRequest) -> AppResult<CreateRutaResponse> {
        request.validate()?;

        if request.secuencia_entregas.as_array().map_or(true, |s| s.is_empty()) {
            return Err(AppError::BadRequest(
                "la ruta aceptada no tiene secuencia de entregas".to_string(),
            ));
        }

        let ruta = self
            .repository
            .create(
                request.alertas,
                request.geometria,
                request.resumen,
                request.secuencia_entregas,
                request.optimized_by,
                request.notes,
                request.clave_idempotencia,
            )
            .await?;

        log::info!("Ruta {} creada en estado {}", ruta.id, ruta.estado.as_str());
        Ok(CreateRutaResponse { id: ruta.id })
    }

    pub async fn get_by_id(&self, id: Uuid) -> AppResult<RutaResponse> {
        let ruta = self
            .repository
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Ruta '{}' no encontrada", id)))?;

        Ok(ruta.into())
    }

    pub async fn list(&self, filters: RutaFilters) -> AppResult<Vec<RutaResponse>> {
        let estado = match filters.estado.as_deref() {
            Some(valor) => Some(RouteStatus::parse(valor).ok_or_else(|| {
                AppError::BadRequest(format!("estado de ruta inválido: '{}'", valor))
            })?),
            None => None,
        };

        let limit = filters.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
        let offset = filters.offset.unwrap_or(0).max(0);

        let rutas = self.repository.list(estado, limit, offset).await?;
        Ok(rutas.into_iter().map(Into::into).collect())
    }

    /// Transición del ciclo de vida. Los estados terminales no admiten
    /// salidas; una transición inválida es un conflicto, no un update.
    /// El UPDATE en el repositorio exige el estado leído acá: si una request
    /// concurrente cambió el estado entre la lectura y el UPDATE, no se
    /// aplica nada y también es un conflicto.
    pub async fn update_estado(
        &self,
        id: Uuid,
        request: UpdateEstadoRequest,
    ) -> AppResult<RutaResponse> {
        let destino = RouteStatus::parse(&request.estado).ok_or_else(|| {
            AppError::BadRequest(format!("estado de ruta inválido: '{}'", request.estado))
        })?;

        let actual = self
            .repository
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Ruta '{}' no encontrada", id)))?;

        if !actual.estado.can_transition_to(destino) {
            return Err(AppError::Conflict(format!(
                "transición inválida de {} a {}",
                actual.estado.as_str(),
                destino.as_str()
            )));
        }

        let ruta = self
            .repository
            .update_estado(
                id,
                actual.estado,
                destino,
                request.driver_id,
                request.driver_name,
                request.notes,
            )
            .await?
            .ok_or_else(|| {
                AppError::Conflict(format!(
                    "la ruta {} cambió de estado durante la actualización",
                    id
                ))
            })?;

        log::info!("Ruta {} pasó a estado {}", ruta.id, ruta.estado.as_str());
        Ok(ruta.into())
    }
}
