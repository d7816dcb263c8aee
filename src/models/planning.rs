//! Modelo interno de planificación
//!
//! Este módulo define el modelo con el que trabaja el motor de optimización.
//! A diferencia del formato de wire (campos en español, unidades implícitas),
//! el modelo interno es explícito en unidades: `weight_kg`, `volume_m3`,
//! minutos desde medianoche para horas y ventanas.

use serde::{Deserialize, Serialize};

/// Peso estimado por caja en kilogramos
pub const KG_POR_CAJA: f64 = 2.5;

/// Volumen estimado por caja en metros cúbicos
pub const M3_POR_CAJA: f64 = 0.04;

/// Nivel de urgencia de un pedido
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Urgency {
    Alta,
    Media,
    Baja,
}

impl Urgency {
    /// Prioridad numérica: mayor gana en desempates y admisión por capacidad
    pub fn priority(&self) -> u8 {
        match self {
            Urgency::Alta => 2,
            Urgency::Media => 1,
            Urgency::Baja => 0,
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "alta" => Some(Urgency::Alta),
            "media" => Some(Urgency::Media),
            "baja" => Some(Urgency::Baja),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Urgency::Alta => "alta",
            Urgency::Media => "media",
            Urgency::Baja => "baja",
        }
    }
}

/// Política de optimización: qué costo marginal minimiza la secuenciación
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OptimizationPolicy {
    #[default]
    DistanciaMinima,
    TiempoMinimo,
    CostoEstimado,
}

impl OptimizationPolicy {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "distancia_minima" => Some(OptimizationPolicy::DistanciaMinima),
            "tiempo_minimo" => Some(OptimizationPolicy::TiempoMinimo),
            "costo_estimado" => Some(OptimizationPolicy::CostoEstimado),
            _ => None,
        }
    }
}

/// Punto geográfico (grados decimales)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

/// Pedido resuelto y listo para planificar
///
/// `input_index` conserva la posición en el request original y se usa como
/// último criterio de desempate para que el motor sea determinista.
#[derive(Debug, Clone)]
pub struct PlanningOrder {
    pub id: String,
    pub client: String,
    pub address: String,
    pub formatted_address: String,
    pub location: GeoPoint,
    pub boxes: u32,
    pub weight_kg: f64,
    pub volume_m3: f64,
    pub urgency: Urgency,
    /// Ventana de entrega `[inicio, fin]` en minutos desde medianoche
    pub window: Option<(u32, u32)>,
    pub zone: String,
    pub input_index: usize,
}

impl PlanningOrder {
    /// Peso físico derivado del número de cajas
    pub fn weight_for_boxes(boxes: u32) -> f64 {
        boxes as f64 * KG_POR_CAJA
    }

    /// Volumen físico derivado del número de cajas
    pub fn volume_for_boxes(boxes: u32) -> f64 {
        boxes as f64 * M3_POR_CAJA
    }
}

/// Configuración de una corrida de planificación (un camión, una ruta)
#[derive(Debug, Clone)]
pub struct PlanningConfig {
    pub depot_address: String,
    /// Coordenadas de la bodega; `None` hasta resolverlas por geocoding.
    /// Se usa `Option` y no un valor centinela: (0, 0) es un punto válido.
    pub depot: Option<GeoPoint>,
    /// Hora de salida en minutos desde medianoche
    pub start_minutes: u32,
    pub capacity_kg: f64,
    pub capacity_m3: f64,
    pub return_to_depot: bool,
    pub max_stops: usize,
    pub cost_per_km: f64,
    pub cost_per_hour: f64,
    pub policy: OptimizationPolicy,
    pub respect_time_windows: bool,
    /// Tiempo de servicio por parada en minutos (default configurable, no constante oculta)
    pub service_time_min: u32,
}
