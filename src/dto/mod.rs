//! DTOs de la API
//!
//! Los structs de wire viven acá; los nombres de campos en español del
//! front-office no salen de este módulo.

pub mod optimize_dto;
pub mod order_dto;
pub mod route_dto;
