//! Middleware del sistema
//!
//! Este módulo contiene el middleware de CORS para el front de planificación.

pub mod cors;

pub use cors::*;
