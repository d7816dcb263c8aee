//! Services module
//!
//! Este módulo contiene la lógica de negocio: el motor de planificación de
//! rutas, el orquestador de optimización y las integraciones externas de
//! geocoding y ruteo vial.

pub mod geocoding_service;
pub mod optimizer_service;
pub mod route_planner;
pub mod routing_service;
