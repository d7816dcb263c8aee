//! DTOs del endpoint de optimización de rutas
//!
//! El formato de wire usa los nombres en español que consume el front-office
//! (configuracion/pedidos/resumen/secuencia_entregas). La traducción al
//! modelo interno con unidades explícitas ocurre en el servicio optimizador;
//! estos structs no llevan lógica.

use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Configuración del camión y la corrida
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ConfiguracionDto {
    #[validate(length(min = 3, max = 500))]
    pub bodega_origen: String,

    /// "HH:MM"
    pub hora_inicio: String,

    #[validate(range(min = 0.1))]
    pub camion_capacidad_kg: f64,

    #[validate(range(min = 0.01))]
    pub camion_capacidad_m3: f64,

    pub retornar_bodega: bool,

    #[validate(range(min = 1, max = 200))]
    pub max_paradas: u32,

    /// distancia_minima | tiempo_minimo | costo_estimado
    pub politica_optimizacion: Option<String>,

    /// Si se respetan las ventanas de entrega de los pedidos (default: sí)
    pub respetar_ventanas: Option<bool>,

    /// Minutos de servicio por parada; si falta se usa el default del entorno
    pub tiempo_servicio_min: Option<u32>,

    /// Coordenadas de la bodega si ya se conocen (evita geocodificar)
    pub bodega_lat: Option<f64>,
    pub bodega_lon: Option<f64>,

    // tarifas dentro de configuracion; los campos top-level del request
    // son autoritativos si vienen presentes
    pub costo_km: Option<f64>,
    pub costo_hora: Option<f64>,
}

/// Pedido tal como lo envía el front-office
#[derive(Debug, Clone, Deserialize)]
pub struct PedidoDto {
    pub id_pedido: String,
    pub cliente: String,
    pub direccion: String,
    pub fecha: Option<String>,
    pub cajas: u32,
    pub urgencia: String,
    /// "08:00-12:00"; el wire original lo omitía para pedidos sin ventana
    pub ventana: Option<String>,
    pub zona: Option<String>,
    // peso/volumen enviados por el cliente se ignoran: el motor los deriva
    // de `cajas` con las constantes físicas por caja
    pub peso_kg: Option<f64>,
    pub volumen_m3: Option<f64>,
    /// Coordenadas ya geocodificadas, si el pedido las trae
    pub lat: Option<f64>,
    pub lon: Option<f64>,
}

/// Request de POST /rutas/optimizar
#[derive(Debug, Clone, Deserialize)]
pub struct OptimizeRequest {
    pub configuracion: ConfiguracionDto,
    pub pedidos: Vec<PedidoDto>,
    pub costo_km: Option<f64>,
    pub costo_hora: Option<f64>,
}

/// Geometría GeoJSON de la ruta; el primer punto es la bodega
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GeometriaDto {
    #[serde(rename = "type")]
    pub tipo: String,
    pub coordinates: Vec<[f64; 2]>,
}

impl GeometriaDto {
    pub fn line_string(coordinates: Vec<[f64; 2]>) -> Self {
        Self {
            tipo: "LineString".to_string(),
            coordinates,
        }
    }
}

/// Métricas agregadas de la corrida
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ResumenDto {
    pub capacidad_peso_usada_pct: f64,
    pub capacidad_volumen_usada_pct: f64,
    pub costo_estimado: f64,
    pub distancia_total_km: f64,
    pub hora_fin_estimada: String,
    pub hora_inicio: String,
    pub tiempo_conduccion_min: u32,
    pub tiempo_entregas_min: u32,
    pub tiempo_total_min: u32,
    pub total_cajas: u32,
    pub total_entregas: u32,
}

/// Parada de la secuencia optimizada
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ParadaDto {
    pub id_pedido: String,
    pub cliente: String,
    pub direccion: String,
    pub direccion_formateada: String,
    pub lat: f64,
    pub lon: f64,
    /// 1-based; la bodega es el orden 0
    pub orden: u32,
    pub hora_estimada: String,
    pub cajas: u32,
    pub urgencia: String,
    pub zona: String,
    pub distancia_desde_anterior_km: f64,
    pub tiempo_desde_anterior_min: u32,
}

/// Response de POST /rutas/optimizar
///
/// `id_planificacion` correlaciona la corrida con el cache de resultados del
/// servidor y reemplaza el mailbox de session storage del front original.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OptimizeResponse {
    pub id_planificacion: Uuid,
    pub alertas: Vec<String>,
    pub geometria: GeometriaDto,
    pub resumen: ResumenDto,
    pub secuencia_entregas: Vec<ParadaDto>,
}
