//! DTOs de rutas persistidas
//!
//! Los documentos de la ruta aceptada (resumen, secuencia, geometría,
//! alertas) viajan como JSON crudo: se guardan y se devuelven sin
//! reinterpretar para que crear y luego leer una ruta sea byte a byte igual.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::route::{Ruta, RouteStatus};

/// Request de POST /rutas: el Route Result aceptado más la procedencia
#[derive(Debug, Deserialize, Validate)]
pub struct CreateRutaRequest {
    pub alertas: serde_json::Value,
    pub geometria: serde_json::Value,
    pub resumen: serde_json::Value,
    pub secuencia_entregas: serde_json::Value,

    #[validate(length(min = 1, max = 100))]
    pub optimized_by: Option<String>,

    #[validate(length(max = 2000))]
    pub notes: Option<String>,

    /// Clave de idempotencia opcional: repetirla devuelve la ruta ya creada
    /// en vez de insertar un duplicado (doble submit del front)
    #[validate(length(min = 8, max = 128))]
    pub clave_idempotencia: Option<String>,
}

/// Response de creación: identificador durable asignado por el servidor
#[derive(Debug, Serialize)]
pub struct CreateRutaResponse {
    pub id: Uuid,
}

/// Request de PATCH /rutas/:id/estado
#[derive(Debug, Deserialize)]
pub struct UpdateEstadoRequest {
    /// pending | in_progress | completed | cancelled
    pub estado: String,
    pub driver_id: Option<String>,
    pub driver_name: Option<String>,
    pub notes: Option<String>,
}

/// Filtros de listado de rutas
#[derive(Debug, Deserialize)]
pub struct RutaFilters {
    pub estado: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// Ruta persistida tal como la consume la vista de detalle
#[derive(Debug, Serialize)]
pub struct RutaResponse {
    pub id: Uuid,
    pub estado: RouteStatus,
    pub resumen: serde_json::Value,
    pub secuencia_entregas: serde_json::Value,
    pub geometria: serde_json::Value,
    pub alertas: serde_json::Value,
    pub optimized_by: Option<String>,
    pub notes: Option<String>,
    pub driver_id: Option<String>,
    pub driver_name: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Ruta> for RutaResponse {
    fn from(ruta: Ruta) -> Self {
        Self {
            id: ruta.id,
            estado: ruta.estado,
            resumen: ruta.resumen,
            secuencia_entregas: ruta.secuencia_entregas,
            geometria: ruta.geometria,
            alertas: ruta.alertas,
            optimized_by: ruta.optimized_by,
            notes: ruta.notes,
            driver_id: ruta.driver_id,
            driver_name: ruta.driver_name,
            created_at: ruta.created_at,
            updated_at: ruta.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use serde_json::json;
    use uuid::Uuid;

    #[test]
    fn documentos_pasan_a_la_respuesta_sin_reinterpretar() {
        let resumen = json!({"total_entregas": 3, "distancia_total_km": 12.34});
        let secuencia = json!([{"id_pedido": "#ORD-001", "orden": 1, "hora_estimada": "08:25"}]);
        let geometria = json!({"type": "LineString", "coordinates": [[-70.66, -33.45]]});
        let alertas = json!(["Pedido #ORD-002 quedó fuera por capacidad del camión"]);

        let ruta = Ruta {
            id: Uuid::new_v4(),
            estado: RouteStatus::Pending,
            resumen: resumen.clone(),
            secuencia_entregas: secuencia.clone(),
            geometria: geometria.clone(),
            alertas: alertas.clone(),
            optimized_by: Some("backend".to_string()),
            notes: None,
            driver_id: None,
            driver_name: None,
            idempotency_key: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let response = RutaResponse::from(ruta);
        assert_eq!(response.resumen, resumen);
        assert_eq!(response.secuencia_entregas, secuencia);
        assert_eq!(response.geometria, geometria);
        assert_eq!(response.alertas, alertas);

        // y lo mismo en el JSON serializado que ve el front
        let wire = serde_json::to_value(&response).unwrap();
        assert_eq!(wire["resumen"], resumen);
        assert_eq!(wire["secuencia_entregas"], secuencia);
        assert_eq!(wire["geometria"], geometria);
        assert_eq!(wire["alertas"], alertas);
    }
}
