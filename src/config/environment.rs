//! Configuración de variables de entorno
//!
//! Este módulo maneja la configuración del entorno. Los servicios externos
//! (OSRM, Mapbox) son opcionales: sin ellos el optimizador trabaja en modo
//! degradado con estimaciones en línea recta, y los pedidos deben traer
//! coordenadas.

use std::env;

/// Configuración del entorno
#[derive(Debug, Clone)]
pub struct EnvironmentConfig {
    pub environment: String,
    pub port: u16,
    pub host: String,
    /// URL base del servidor OSRM, ej. http://localhost:5000
    pub osrm_url: Option<String>,
    pub mapbox_token: Option<String>,
    /// País para el geocoding forward (código ISO, ej. "cl")
    pub geocoding_country: String,
    /// Minutos de servicio por parada cuando el request no los trae
    pub default_service_time_min: u32,
    /// Velocidad promedio del modo degradado en km/h
    pub fallback_speed_kmh: f64,
    /// Tope duro de una corrida de optimización en segundos
    pub optimization_timeout_secs: u64,
    /// TTL del cache de corridas de planificación en minutos
    pub planning_cache_ttl_minutes: i64,
}

impl Default for EnvironmentConfig {
    fn default() -> Self {
        Self {
            environment: env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .expect("PORT must be a valid number"),
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            osrm_url: env::var("OSRM_URL").ok(),
            mapbox_token: env::var("MAPBOX_TOKEN").ok(),
            geocoding_country: env::var("GEOCODING_COUNTRY").unwrap_or_else(|_| "cl".to_string()),
            default_service_time_min: env::var("SERVICE_TIME_MIN")
                .unwrap_or_else(|_| "12".to_string())
                .parse()
                .expect("SERVICE_TIME_MIN must be a valid number"),
            fallback_speed_kmh: env::var("FALLBACK_SPEED_KMH")
                .unwrap_or_else(|_| "40".to_string())
                .parse()
                .expect("FALLBACK_SPEED_KMH must be a valid number"),
            optimization_timeout_secs: env::var("OPTIMIZATION_TIMEOUT_SECS")
                .unwrap_or_else(|_| "30".to_string())
                .parse()
                .expect("OPTIMIZATION_TIMEOUT_SECS must be a valid number"),
            planning_cache_ttl_minutes: env::var("PLANNING_CACHE_TTL_MINUTES")
                .unwrap_or_else(|_| "30".to_string())
                .parse()
                .expect("PLANNING_CACHE_TTL_MINUTES must be a valid number"),
        }
    }
}

impl EnvironmentConfig {
    /// Verificar si estamos en modo desarrollo
    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }

    /// Obtener la URL del servidor
    pub fn server_url(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
