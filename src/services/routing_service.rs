//! Servicio de ruteo vial
//!
//! Este módulo obtiene distancias, tiempos y geometría de calles desde un
//! servidor OSRM. Cuando el proveedor no está disponible el motor degrada a
//! estimaciones en línea recta (haversine) con una velocidad promedio
//! configurable, en vez de fallar la optimización.

use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

use crate::models::planning::GeoPoint;
use crate::utils::errors::{AppError, AppResult};

/// Radio terrestre en kilómetros
const RADIO_TIERRA_KM: f64 = 6371.0;

/// Velocidad promedio asumida para el modo degradado
pub const VELOCIDAD_DEFAULT_KMH: f64 = 40.0;

/// Matriz de viaje entre todos los puntos de una corrida (índice 0 = bodega)
#[derive(Debug, Clone)]
pub struct TravelMatrix {
    pub distancia_km: Vec<Vec<f64>>,
    pub tiempo_min: Vec<Vec<f64>>,
}

impl TravelMatrix {
    pub fn len(&self) -> usize {
        self.distancia_km.len()
    }

    pub fn is_empty(&self) -> bool {
        self.distancia_km.is_empty()
    }
}

/// Proveedor de matrices de viaje y geometría de tramos
#[async_trait]
pub trait TravelMatrixProvider: Send + Sync {
    async fn matrix_for(&self, points: &[GeoPoint]) -> AppResult<TravelMatrix>;

    /// Geometría vial de un tramo como pares `[lon, lat]`
    async fn leg_geometry(&self, from: GeoPoint, to: GeoPoint) -> AppResult<Vec<[f64; 2]>>;
}

/// Distancia de círculo máximo entre dos puntos en kilómetros
pub fn haversine_km(from: GeoPoint, to: GeoPoint) -> f64 {
    let lat1 = from.lat.to_radians();
    let lat2 = to.lat.to_radians();
    let delta_lat = (to.lat - from.lat).to_radians();
    let delta_lon = (to.lon - from.lon).to_radians();

    let a = (delta_lat / 2.0).sin().powi(2)
        + lat1.cos() * lat2.cos() * (delta_lon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().asin();

    RADIO_TIERRA_KM * c
}

/// Proveedor de fallback en línea recta
///
/// Ignora la red vial: distancia haversine y tiempo a velocidad promedio.
/// Siempre disponible, por eso es el último recurso del orquestador.
#[derive(Debug, Clone)]
pub struct HaversineProvider {
    pub velocidad_kmh: f64,
}

impl Default for HaversineProvider {
    fn default() -> Self {
        Self {
            velocidad_kmh: VELOCIDAD_DEFAULT_KMH,
        }
    }
}

impl HaversineProvider {
    pub fn new(velocidad_kmh: f64) -> Self {
        Self { velocidad_kmh }
    }

    fn km_a_minutos(&self, km: f64) -> f64 {
        km / self.velocidad_kmh * 60.0
    }
}

#[async_trait]
impl TravelMatrixProvider for HaversineProvider {
    async fn matrix_for(&self, points: &[GeoPoint]) -> AppResult<TravelMatrix> {
        let n = points.len();
        let mut distancia_km = vec![vec![0.0; n]; n];
        let mut tiempo_min = vec![vec![0.0; n]; n];

        for i in 0..n {
            for j in 0..n {
                if i != j {
                    let km = haversine_km(points[i], points[j]);
                    distancia_km[i][j] = km;
                    tiempo_min[i][j] = self.km_a_minutos(km);
                }
            }
        }

        Ok(TravelMatrix {
            distancia_km,
            tiempo_min,
        })
    }

    async fn leg_geometry(&self, from: GeoPoint, to: GeoPoint) -> AppResult<Vec<[f64; 2]>> {
        Ok(vec![[from.lon, from.lat], [to.lon, to.lat]])
    }
}

/// Respuesta del endpoint /table de OSRM
#[derive(Debug, Deserialize)]
struct OsrmTableResponse {
    code: String,
    distances: Option<Vec<Vec<f64>>>,
    durations: Option<Vec<Vec<f64>>>,
}

/// Respuesta del endpoint /route de OSRM con geometries=geojson
#[derive(Debug, Deserialize)]
struct OsrmRouteResponse {
    code: String,
    routes: Vec<OsrmRoute>,
}

#[derive(Debug, Deserialize)]
struct OsrmRoute {
    geometry: OsrmGeometry,
}

#[derive(Debug, Deserialize)]
struct OsrmGeometry {
    coordinates: Vec<[f64; 2]>,
}

/// Proveedor OSRM (perfil driving)
pub struct OsrmProvider {
    base_url: String,
    client: reqwest::Client,
}

impl OsrmProvider {
    pub fn new(base_url: String) -> AppResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(15))
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { base_url, client })
    }

    fn coords_param(points: &[GeoPoint]) -> String {
        points
            .iter()
            .map(|p| format!("{:.6},{:.6}", p.lon, p.lat))
            .collect::<Vec<_>>()
            .join(";")
    }
}

#[async_trait]
impl TravelMatrixProvider for OsrmProvider {
    async fn matrix_for(&self, points: &[GeoPoint]) -> AppResult<TravelMatrix> {
        let url = format!(
            "{}/table/v1/driving/{}?annotations=distance,duration",
            self.base_url,
            Self::coords_param(points)
        );

        log::info!("Solicitando matriz OSRM para {} puntos", points.len());

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| AppError::ExternalApi(format!("OSRM table request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::ExternalApi(format!(
                "OSRM table returned status {}",
                status
            )));
        }

        let body: OsrmTableResponse = response
            .json()
            .await
            .map_err(|e| AppError::ExternalApi(format!("Invalid OSRM table response: {}", e)))?;

        if body.code != "Ok" {
            return Err(AppError::ExternalApi(format!(
                "OSRM table error code: {}",
                body.code
            )));
        }

        let distances = body
            .distances
            .ok_or_else(|| AppError::ExternalApi("OSRM table sin distancias".to_string()))?;
        let durations = body
            .durations
            .ok_or_else(|| AppError::ExternalApi("OSRM table sin duraciones".to_string()))?;

        // OSRM entrega metros y segundos; el motor trabaja en km y minutos
        Ok(TravelMatrix {
            distancia_km: distances
                .into_iter()
                .map(|row| row.into_iter().map(|m| m / 1000.0).collect())
                .collect(),
            tiempo_min: durations
                .into_iter()
                .map(|row| row.into_iter().map(|s| s / 60.0).collect())
                .collect(),
        })
    }

    async fn leg_geometry(&self, from: GeoPoint, to: GeoPoint) -> AppResult<Vec<[f64; 2]>> {
        let url = format!(
            "{}/route/v1/driving/{}?overview=full&geometries=geojson",
            self.base_url,
            Self::coords_param(&[from, to])
        );

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| AppError::ExternalApi(format!("OSRM route request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::ExternalApi(format!(
                "OSRM route returned status {}",
                status
            )));
        }

        let body: OsrmRouteResponse = response
            .json()
            .await
            .map_err(|e| AppError::ExternalApi(format!("Invalid OSRM route response: {}", e)))?;

        if body.code != "Ok" || body.routes.is_empty() {
            return Err(AppError::ExternalApi(format!(
                "OSRM route error code: {}",
                body.code
            )));
        }

        Ok(body.routes.into_iter().next().map(|r| r.geometry.coordinates).unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(lat: f64, lon: f64) -> GeoPoint {
        GeoPoint { lat, lon }
    }

    #[test]
    fn haversine_mismo_punto_es_cero() {
        let d = haversine_km(p(-33.45, -70.66), p(-33.45, -70.66));
        assert!(d < 0.001);
    }

    #[test]
    fn haversine_distancia_conocida() {
        // Santiago (-33.45, -70.66) a Valparaíso (-33.05, -71.62): ~100 km
        let d = haversine_km(p(-33.45, -70.66), p(-33.05, -71.62));
        assert!(d > 90.0 && d < 110.0, "esperaba ~100 km, obtuve {}", d);
    }

    #[tokio::test]
    async fn matriz_haversine_diagonal_cero_y_simetrica() {
        let provider = HaversineProvider::default();
        let points = vec![p(-33.45, -70.66), p(-33.50, -70.70), p(-33.40, -70.60)];
        let matrix = provider.matrix_for(&points).await.unwrap();

        for i in 0..points.len() {
            assert_eq!(matrix.distancia_km[i][i], 0.0);
        }
        assert!((matrix.distancia_km[0][1] - matrix.distancia_km[1][0]).abs() < 1e-9);
    }

    #[tokio::test]
    async fn tiempo_degradado_usa_velocidad_promedio() {
        let provider = HaversineProvider::new(40.0);
        // 10 km a 40 km/h son 15 minutos
        assert!((provider.km_a_minutos(10.0) - 15.0).abs() < 1e-9);
        let geom = provider
            .leg_geometry(p(-33.45, -70.66), p(-33.50, -70.70))
            .await
            .unwrap();
        assert_eq!(geom.len(), 2);
        assert_eq!(geom[0], [-70.66, -33.45]);
    }
}
