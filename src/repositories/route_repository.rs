//! Repositorio de rutas persistidas
//!
//! Los documentos JSONB (resumen, secuencia, geometría, alertas) se insertan
//! y se leen sin reinterpretar: el detalle de una ruta devuelve exactamente
//! lo que se aceptó.

use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::route::{Ruta, RouteStatus};
use crate::utils::errors::{AppError, AppResult};

pub struct RouteRepository {
    pool: PgPool,
}

impl RouteRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Crear una ruta aceptada. Si viene clave de idempotencia y ya existe
    /// una ruta con esa clave, se devuelve la existente en vez de duplicar.
    /// El índice UNIQUE sobre `idempotency_key` respalda la verificación:
    /// si dos accepts con la misma clave corren en paralelo, el segundo
    /// INSERT viola el índice y se resuelve releyendo la ruta ganadora.
    #[allow(clippy::too_many_arguments)]
    pub async fn create(
        &self,
        alertas: serde_json::Value,
        geometria: serde_json::Value,
        resumen: serde_json::Value,
        secuencia_entregas: serde_json::Value,
        optimized_by: Option<String>,
        notes: Option<String>,
        idempotency_key: Option<String>,
    ) -> AppResult<Ruta> {
        if let Some(key) = &idempotency_key {
            if let Some(existente) = self.find_by_idempotency_key(key).await? {
                log::info!(
                    "Clave de idempotencia repetida '{}': devolviendo ruta {}",
                    key,
                    existente.id
                );
                return Ok(existente);
            }
        }

        let id = Uuid::new_v4();
        let now = Utc::now();

        let inserted = sqlx::query_as::<_, Ruta>(
            r#"
            INSERT INTO rutas (id, estado, resumen, secuencia_entregas, geometria, alertas,
                               optimized_by, notes, driver_id, driver_name, idempotency_key,
                               created_at, updated_at)
            VALUES ($1, 'pending', $2, $3, $4, $5, $6, $7, NULL, NULL, $8, $9, $9)
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(resumen)
        .bind(secuencia_entregas)
        .bind(geometria)
        .bind(alertas)
        .bind(optimized_by)
        .bind(notes)
        .bind(idempotency_key.clone())
        .bind(now)
        .fetch_one(&self.pool)
        .await;

        match inserted {
            Ok(ruta) => Ok(ruta),
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
                let key = idempotency_key.as_deref().unwrap_or_default();
                log::info!(
                    "Carrera de idempotencia con clave '{}': releyendo la ruta ganadora",
                    key
                );
                self.find_by_idempotency_key(key).await?.ok_or_else(|| {
                    AppError::Conflict(format!(
                        "conflicto de idempotencia con clave '{}' sin ruta asociada",
                        key
                    ))
                })
            }
            Err(e) => Err(e.into()),
        }
    }

    pub async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Ruta>> {
        let ruta = sqlx::query_as::<_, Ruta>("SELECT * FROM rutas WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(ruta)
    }

    async fn find_by_idempotency_key(&self, key: &str) -> AppResult<Option<Ruta>> {
        let ruta = sqlx::query_as::<_, Ruta>("SELECT * FROM rutas WHERE idempotency_key = $1")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;

        Ok(ruta)
    }

    pub async fn list(
        &self,
        estado: Option<RouteStatus>,
        limit: i64,
        offset: i64,
    ) -> AppResult<Vec<Ruta>> {
        let rutas = sqlx::query_as::<_, Ruta>(
            r#"
            SELECT * FROM rutas
            WHERE ($1::route_status IS NULL OR estado = $1)
            ORDER BY created_at DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(estado)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(rutas)
    }

    /// Actualizar el estado del ciclo de vida junto con la asignación de
    /// conductor. El UPDATE es condicional al estado esperado: si otra
    /// request ganó la carrera y el estado ya cambió, no se aplica nada y
    /// se devuelve `None` (el controller lo traduce a conflicto). Sin esta
    /// condición dos PATCH concurrentes podrían sacar una ruta de un estado
    /// terminal.
    pub async fn update_estado(
        &self,
        id: Uuid,
        esperado: RouteStatus,
        estado: RouteStatus,
        driver_id: Option<String>,
        driver_name: Option<String>,
        notes: Option<String>,
    ) -> AppResult<Option<Ruta>> {
        let ruta = sqlx::query_as::<_, Ruta>(
            r#"
            UPDATE rutas
            SET estado = $3,
                driver_id = COALESCE($4, driver_id),
                driver_name = COALESCE($5, driver_name),
                notes = COALESCE($6, notes),
                updated_at = $7
            WHERE id = $1 AND estado = $2
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(esperado)
        .bind(estado)
        .bind(driver_id)
        .bind(driver_name)
        .bind(notes)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await?;

        Ok(ruta)
    }
}
