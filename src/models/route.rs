//! Modelo de Ruta persistida
//!
//! Este módulo contiene el struct Ruta y el ciclo de vida de estados.
//! Los documentos de la ruta (resumen, secuencia, geometría, alertas) se
//! guardan como JSONB sin reinterpretar, de modo que crear y luego leer
//! una ruta devuelve exactamente lo que se aceptó.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use uuid::Uuid;

/// Estado de la ruta - mapea al ENUM route_status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Type, PartialEq, Eq)]
#[sqlx(type_name = "route_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum RouteStatus {
    Pending,
    InProgress,
    Completed,
    Cancelled,
}

impl RouteStatus {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "pending" => Some(RouteStatus::Pending),
            "in_progress" => Some(RouteStatus::InProgress),
            "completed" => Some(RouteStatus::Completed),
            "cancelled" => Some(RouteStatus::Cancelled),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RouteStatus::Pending => "pending",
            RouteStatus::InProgress => "in_progress",
            RouteStatus::Completed => "completed",
            RouteStatus::Cancelled => "cancelled",
        }
    }

    /// Estados terminales no admiten transiciones de salida
    pub fn is_terminal(&self) -> bool {
        matches!(self, RouteStatus::Completed | RouteStatus::Cancelled)
    }

    /// Transiciones válidas del ciclo de vida: pending → in_progress →
    /// (completed | cancelled); pending también puede cancelarse directo.
    pub fn can_transition_to(&self, next: RouteStatus) -> bool {
        match self {
            RouteStatus::Pending => {
                matches!(next, RouteStatus::InProgress | RouteStatus::Cancelled)
            }
            RouteStatus::InProgress => {
                matches!(next, RouteStatus::Completed | RouteStatus::Cancelled)
            }
            RouteStatus::Completed | RouteStatus::Cancelled => false,
        }
    }
}

/// Ruta aceptada y persistida - mapea a la tabla rutas
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Ruta {
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
    pub idempotency_key: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transiciones_hacia_adelante() {
        assert!(RouteStatus::Pending.can_transition_to(RouteStatus::InProgress));
        assert!(RouteStatus::Pending.can_transition_to(RouteStatus::Cancelled));
        assert!(RouteStatus::InProgress.can_transition_to(RouteStatus::Completed));
        assert!(RouteStatus::InProgress.can_transition_to(RouteStatus::Cancelled));
    }

    #[test]
    fn estados_terminales_no_transicionan() {
        for terminal in [RouteStatus::Completed, RouteStatus::Cancelled] {
            for destino in [
                RouteStatus::Pending,
                RouteStatus::InProgress,
                RouteStatus::Completed,
                RouteStatus::Cancelled,
            ] {
                assert!(!terminal.can_transition_to(destino));
            }
        }
    }

    #[test]
    fn pending_no_salta_a_completed() {
        assert!(!RouteStatus::Pending.can_transition_to(RouteStatus::Completed));
    }
}
