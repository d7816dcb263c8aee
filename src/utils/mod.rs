//! Utilidades del sistema
//!
//! Este módulo contiene utilidades para manejo de errores y
//! conversión de horas/ventanas de entrega.

pub mod errors;
pub mod tiempo;
