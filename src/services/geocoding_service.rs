//! Servicio de geocodificación
//!
//! Resuelve direcciones libres de pedidos y bodega a coordenadas lat/lon
//! usando la API de geocoding forward de Mapbox (v6). Los pedidos que no se
//! pueden geocodificar no frenan la corrida: el orquestador los omite con
//! alerta.

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
pub struct GeocodingResponse {
    pub success: bool,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub formatted_address: Option<String>,
    pub error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MapboxGeocodingResponse {
    features: Vec<MapboxFeature>,
}

#[derive(Debug, Deserialize)]
struct MapboxFeature {
    geometry: MapboxGeometry,
    properties: MapboxProperties,
}

#[derive(Debug, Deserialize)]
struct MapboxGeometry {
    coordinates: Vec<f64>, // [longitude, latitude]
}

#[derive(Debug, Deserialize)]
struct MapboxProperties {
    full_address: Option<String>,
    place_name: Option<String>,
    name: Option<String>,
}

pub struct GeocodingService {
    mapbox_token: String,
    country: String,
    client: reqwest::Client,
}

impl GeocodingService {
    pub fn new(mapbox_token: String, country: String) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()?;

        Ok(Self {
            mapbox_token,
            country,
            client,
        })
    }

    pub async fn geocode_address(&self, address: &str) -> Result<GeocodingResponse> {
        log::info!("Geocodificando dirección: {}", address);

        let encoded_address = urlencoding::encode(address);
        let url = format!(
            "https://api.mapbox.com/search/geocode/v6/forward?q={}&access_token={}&country={}&limit=1",
            encoded_address, self.mapbox_token, self.country
        );

        let response = self
            .client
            .get(&url)
            .header("User-Agent", "PharmaRouting/1.0")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            log::error!("Geocoding falló con status {}: {}", status, error_text);
            return Ok(GeocodingResponse {
                success: false,
                latitude: None,
                longitude: None,
                formatted_address: None,
                error: Some(format!("Geocoding failed: {}", status)),
            });
        }

        let mapbox_response: MapboxGeocodingResponse = response
            .json()
            .await
            .map_err(|e| anyhow!("Failed to parse geocoding response: {}", e))?;

        if let Some(feature) = mapbox_response.features.first() {
            if feature.geometry.coordinates.len() >= 2 {
                let longitude = feature.geometry.coordinates[0];
                let latitude = feature.geometry.coordinates[1];

                let formatted_address = feature
                    .properties
                    .full_address
                    .clone()
                    .or_else(|| feature.properties.place_name.clone())
                    .or_else(|| feature.properties.name.clone());

                log::info!(
                    "Geocoding exitoso: {} -> ({}, {})",
                    address,
                    latitude,
                    longitude
                );

                return Ok(GeocodingResponse {
                    success: true,
                    latitude: Some(latitude),
                    longitude: Some(longitude),
                    formatted_address,
                    error: None,
                });
            }
        }

        log::warn!("Sin coordenadas para la dirección: {}", address);
        Ok(GeocodingResponse {
            success: false,
            latitude: None,
            longitude: None,
            formatted_address: None,
            error: None,
        })
    }

    /// Geocodificar un lote de direcciones en paralelo, en grupos de a 10
    /// para respetar los rate limits del proveedor.
    pub async fn batch_geocode(&self, addresses: &[String]) -> Vec<GeocodingResponse> {
        log::info!("Geocodificando lote de {} direcciones", addresses.len());

        let mut results = Vec::with_capacity(addresses.len());

        for chunk in addresses.chunks(10) {
            let futures: Vec<_> = chunk
                .iter()
                .map(|address| self.geocode_address(address))
                .collect();

            let chunk_results = futures::future::join_all(futures).await;

            for result in chunk_results {
                match result {
                    Ok(response) => results.push(response),
                    Err(e) => {
                        log::error!("Error geocodificando en lote: {}", e);
                        results.push(GeocodingResponse {
                            success: false,
                            latitude: None,
                            longitude: None,
                            formatted_address: None,
                            error: Some(e.to_string()),
                        });
                    }
                }
            }

            tokio::time::sleep(std::time::Duration::from_millis(100)).await;
        }

        results
    }
}
