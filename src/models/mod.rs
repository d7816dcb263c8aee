//! Modelos del sistema
//!
//! Este módulo contiene los modelos de datos: las filas que mapean al
//! schema PostgreSQL y el modelo interno del motor de planificación.

pub mod order;
pub mod planning;
pub mod route;
