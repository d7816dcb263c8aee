//! Servicio orquestador de optimización
//!
//! Traduce el request de wire al modelo interno, resuelve coordenadas,
//! obtiene la matriz de viaje (OSRM con fallback haversine), corre el motor
//! de planificación bajo timeout y arma la respuesta con resumen, secuencia,
//! geometría y alertas en español.

use std::time::Duration;
use uuid::Uuid;
use validator::Validate;

use crate::dto::optimize_dto::{
    ConfiguracionDto, GeometriaDto, OptimizeRequest, OptimizeResponse, ParadaDto, PedidoDto,
    ResumenDto,
};
use crate::models::planning::{
    GeoPoint, OptimizationPolicy, PlanningConfig, PlanningOrder, Urgency,
};
use crate::models::order::Pedido;
use crate::services::geocoding_service::GeocodingService;
use crate::services::route_planner::{self, PlanAlert, RoutePlan};
use crate::services::routing_service::{
    HaversineProvider, OsrmProvider, TravelMatrix, TravelMatrixProvider,
};
use crate::utils::errors::{AppError, AppResult};
use crate::utils::tiempo;

/// Parámetros de entorno del optimizador
#[derive(Debug, Clone)]
pub struct OptimizerOptions {
    /// Default de minutos de servicio por parada cuando el request no lo trae
    pub default_service_time_min: u32,
    /// Velocidad promedio del modo degradado en km/h
    pub fallback_speed_kmh: f64,
    /// Tope duro de la corrida completa
    pub timeout_secs: u64,
}

impl Default for OptimizerOptions {
    fn default() -> Self {
        Self {
            default_service_time_min: 12,
            fallback_speed_kmh: 40.0,
            timeout_secs: 30,
        }
    }
}

pub struct OptimizerService {
    geocoding: Option<GeocodingService>,
    osrm: Option<OsrmProvider>,
    fallback: HaversineProvider,
    options: OptimizerOptions,
}

impl OptimizerService {
    pub fn new(
        geocoding: Option<GeocodingService>,
        osrm: Option<OsrmProvider>,
        options: OptimizerOptions,
    ) -> Self {
        let fallback = HaversineProvider::new(options.fallback_speed_kmh);
        Self {
            geocoding,
            osrm,
            fallback,
            options,
        }
    }

    /// Optimizar una corrida completa. Función pura de (configuración,
    /// pedidos, tarifas) salvo las consultas de solo lectura a los
    /// proveedores externos; no guarda estado entre requests.
    pub async fn optimize(&self, request: OptimizeRequest) -> AppResult<OptimizeResponse> {
        request.configuracion.validate()?;

        if request.pedidos.is_empty() {
            return Err(AppError::EmptySelection);
        }

        log::info!(
            "Iniciando optimización para {} pedidos desde '{}'",
            request.pedidos.len(),
            request.configuracion.bodega_origen
        );

        let (cost_per_km, cost_per_hour) = resolve_rates(&request)?;
        let config = parse_config(
            &request.configuracion,
            cost_per_km,
            cost_per_hour,
            self.options.default_service_time_min,
        )?;
        let pedidos = validate_pedidos(&request.pedidos)?;

        let timeout_secs = self.options.timeout_secs;
        tokio::time::timeout(
            Duration::from_secs(timeout_secs),
            self.optimize_inner(&config, pedidos),
        )
        .await
        .map_err(|_| AppError::OptimizationTimeout(timeout_secs))?
    }

    async fn optimize_inner(
        &self,
        config: &PlanningConfig,
        pedidos: Vec<PedidoDto>,
    ) -> AppResult<OptimizeResponse> {
        let mut alertas = Vec::new();

        let depot = self.resolve_depot(config).await?;
        let orders = self.resolve_orders(pedidos, &mut alertas).await;
        if orders.is_empty() {
            return Err(AppError::BadRequest(
                "ningún pedido tiene coordenadas ni dirección geocodificable".to_string(),
            ));
        }

        let mut points = vec![depot];
        points.extend(orders.iter().map(|o| o.location));

        let (matrix, degraded) = self.travel_matrix(&points).await?;
        if degraded {
            alertas.push(
                "Proveedor de ruteo no disponible: distancias y tiempos estimados en línea recta"
                    .to_string(),
            );
        }

        let plan = route_planner::plan(config, &orders, &matrix)?;

        for alert in &plan.alerts {
            alertas.push(render_alert(alert, config));
        }

        let geometria = self.build_geometry(&points, &plan, degraded, &mut alertas).await;
        let resumen = build_resumen(config, &plan);
        let secuencia = build_secuencia(&plan);

        log::info!(
            "Optimización completada: {} entregas, {:.1} km, {} alertas",
            secuencia.len(),
            resumen.distancia_total_km,
            alertas.len()
        );

        Ok(OptimizeResponse {
            id_planificacion: Uuid::new_v4(),
            alertas,
            geometria,
            resumen,
            secuencia_entregas: secuencia,
        })
    }

    /// Coordenadas de la bodega: del request si vienen, si no geocoding.
    /// Una bodega sin resolver es un error del caller, no hay degradación.
    async fn resolve_depot(&self, config: &PlanningConfig) -> AppResult<GeoPoint> {
        if let Some(depot) = config.depot {
            return Ok(depot);
        }

        let Some(geocoding) = &self.geocoding else {
            return Err(AppError::BadRequest(
                "la bodega no trae coordenadas y el geocoding no está configurado".to_string(),
            ));
        };

        let resolved = geocoding
            .geocode_address(&config.depot_address)
            .await
            .map_err(|e| AppError::ExternalApi(format!("geocoding de bodega falló: {}", e)))?;

        match (resolved.latitude, resolved.longitude) {
            (Some(lat), Some(lon)) => Ok(GeoPoint { lat, lon }),
            _ => Err(AppError::BadRequest(format!(
                "no se pudo geocodificar la bodega '{}'",
                config.depot_address
            ))),
        }
    }

    /// Resolver pedidos a coordenadas. Los que no se pueden geocodificar se
    /// omiten con alerta; no frenan la corrida.
    async fn resolve_orders(
        &self,
        pedidos: Vec<PedidoDto>,
        alertas: &mut Vec<String>,
    ) -> Vec<PlanningOrder> {
        let mut orders = Vec::with_capacity(pedidos.len());

        let pendientes: Vec<(usize, &PedidoDto)> = pedidos
            .iter()
            .enumerate()
            .filter(|(_, p)| p.lat.is_none() || p.lon.is_none())
            .collect();

        let mut geocoded = std::collections::HashMap::new();
        if !pendientes.is_empty() {
            if let Some(geocoding) = &self.geocoding {
                let direcciones: Vec<String> =
                    pendientes.iter().map(|(_, p)| p.direccion.clone()).collect();
                let resultados = geocoding.batch_geocode(&direcciones).await;
                for ((input_index, _), resultado) in pendientes.iter().zip(resultados) {
                    geocoded.insert(*input_index, resultado);
                }
            }
        }

        for (input_index, pedido) in pedidos.iter().enumerate() {
            let (location, formatted) = match (pedido.lat, pedido.lon) {
                (Some(lat), Some(lon)) => (
                    GeoPoint { lat, lon },
                    pedido.direccion.clone(),
                ),
                _ => match geocoded.get(&input_index) {
                    Some(r) if r.success => (
                        GeoPoint {
                            lat: r.latitude.unwrap_or_default(),
                            lon: r.longitude.unwrap_or_default(),
                        },
                        r.formatted_address
                            .clone()
                            .unwrap_or_else(|| pedido.direccion.clone()),
                    ),
                    _ => {
                        log::warn!(
                            "Pedido {} omitido: sin coordenadas para '{}'",
                            pedido.id_pedido,
                            pedido.direccion
                        );
                        alertas.push(format!(
                            "Pedido {} omitido: no se pudo geocodificar la dirección",
                            pedido.id_pedido
                        ));
                        continue;
                    }
                },
            };

            // la ventana ya se validó en validate_pedidos
            let window = pedido
                .ventana
                .as_deref()
                .and_then(|v| tiempo::parse_ventana(v).ok());

            orders.push(PlanningOrder {
                id: pedido.id_pedido.clone(),
                client: pedido.cliente.clone(),
                address: pedido.direccion.clone(),
                formatted_address: formatted,
                location,
                boxes: pedido.cajas,
                weight_kg: PlanningOrder::weight_for_boxes(pedido.cajas),
                volume_m3: PlanningOrder::volume_for_boxes(pedido.cajas),
                urgency: Urgency::parse(&pedido.urgencia).unwrap_or(Urgency::Media),
                window,
                zone: pedido.zona.clone().unwrap_or_default(),
                input_index,
            });
        }

        orders
    }

    /// Matriz de viaje: OSRM si está configurado, haversine como degradación
    async fn travel_matrix(&self, points: &[GeoPoint]) -> AppResult<(TravelMatrix, bool)> {
        if let Some(osrm) = &self.osrm {
            match osrm.matrix_for(points).await {
                Ok(matrix) if matrix.len() == points.len() => return Ok((matrix, false)),
                Ok(_) => log::warn!("Matriz OSRM incompleta, degradando a línea recta"),
                Err(e) => log::warn!("OSRM no disponible ({}), degradando a línea recta", e),
            }
        }

        let matrix = self.fallback.matrix_for(points).await?;
        Ok((matrix, true))
    }

    /// Concatenar la geometría vial de cada tramo consecutivo de la
    /// secuencia (bodega incluida en ambos extremos si corresponde).
    async fn build_geometry(
        &self,
        points: &[GeoPoint],
        plan: &RoutePlan,
        degraded: bool,
        alertas: &mut Vec<String>,
    ) -> GeometriaDto {
        let mut coordinates: Vec<[f64; 2]> = Vec::new();
        let mut osrm_failed = false;

        for leg in plan.matrix_sequence.windows(2) {
            let from = points[leg[0]];
            let to = points[leg[1]];

            let recta = vec![[from.lon, from.lat], [to.lon, to.lat]];
            let leg_coords = match &self.osrm {
                Some(osrm) if !degraded && !osrm_failed => {
                    match osrm.leg_geometry(from, to).await {
                        Ok(coords) => coords,
                        Err(e) => {
                            log::warn!("Geometría OSRM falló ({}), tramo en línea recta", e);
                            osrm_failed = true;
                            recta
                        }
                    }
                }
                _ => recta,
            };

            for coord in leg_coords {
                if coordinates.last() != Some(&coord) {
                    coordinates.push(coord);
                }
            }
        }

        if osrm_failed {
            alertas.push(
                "Geometría vial parcialmente no disponible: algunos tramos se dibujan en línea recta"
                    .to_string(),
            );
        }

        GeometriaDto::line_string(coordinates)
    }
}

/// Los campos top-level del request son autoritativos sobre los de
/// configuracion cuando ambos vienen presentes.
fn resolve_rates(request: &OptimizeRequest) -> AppResult<(f64, f64)> {
    let cost_per_km = request
        .costo_km
        .or(request.configuracion.costo_km)
        .ok_or_else(|| AppError::BadRequest("costo_km es requerido".to_string()))?;
    let cost_per_hour = request
        .costo_hora
        .or(request.configuracion.costo_hora)
        .ok_or_else(|| AppError::BadRequest("costo_hora es requerido".to_string()))?;

    if cost_per_km < 0.0 || cost_per_hour < 0.0 {
        return Err(AppError::BadRequest(
            "las tarifas no pueden ser negativas".to_string(),
        ));
    }

    Ok((cost_per_km, cost_per_hour))
}

fn parse_config(
    dto: &ConfiguracionDto,
    cost_per_km: f64,
    cost_per_hour: f64,
    default_service_time_min: u32,
) -> AppResult<PlanningConfig> {
    let start_minutes = tiempo::parse_hora(&dto.hora_inicio)
        .map_err(|_| AppError::BadRequest(format!("hora_inicio inválida: '{}'", dto.hora_inicio)))?;

    let policy = match &dto.politica_optimizacion {
        Some(valor) => OptimizationPolicy::parse(valor).ok_or_else(|| {
            AppError::BadRequest(format!("politica_optimizacion inválida: '{}'", valor))
        })?,
        None => OptimizationPolicy::default(),
    };

    let depot = match (dto.bodega_lat, dto.bodega_lon) {
        (Some(lat), Some(lon)) => {
            tiempo::validate_coordinates(lat, lon)
                .map_err(|_| AppError::BadRequest("coordenadas de bodega inválidas".to_string()))?;
            Some(GeoPoint { lat, lon })
        }
        _ => None, // se resuelve por geocoding
    };

    Ok(PlanningConfig {
        depot_address: dto.bodega_origen.clone(),
        depot,
        start_minutes,
        capacity_kg: dto.camion_capacidad_kg,
        capacity_m3: dto.camion_capacidad_m3,
        return_to_depot: dto.retornar_bodega,
        max_stops: dto.max_paradas as usize,
        cost_per_km,
        cost_per_hour,
        policy,
        respect_time_windows: dto.respetar_ventanas.unwrap_or(true),
        service_time_min: dto.tiempo_servicio_min.unwrap_or(default_service_time_min),
    })
}

/// Entrada estructuralmente inválida es falla dura: cajas en cero, ids
/// duplicados, urgencia o ventana malformadas.
fn validate_pedidos(pedidos: &[PedidoDto]) -> AppResult<Vec<PedidoDto>> {
    let mut vistos = std::collections::HashSet::new();

    for pedido in pedidos {
        if pedido.cajas == 0 {
            return Err(AppError::BadRequest(format!(
                "el pedido {} tiene 0 cajas",
                pedido.id_pedido
            )));
        }
        if !Pedido::id_valido(&pedido.id_pedido) {
            return Err(AppError::BadRequest(format!(
                "id de pedido inválido: '{}' (formato esperado #ORD-NNN)",
                pedido.id_pedido
            )));
        }
        if !vistos.insert(pedido.id_pedido.as_str()) {
            return Err(AppError::BadRequest(format!(
                "id de pedido duplicado en la selección: {}",
                pedido.id_pedido
            )));
        }
        if Urgency::parse(&pedido.urgencia).is_none() {
            return Err(AppError::BadRequest(format!(
                "urgencia inválida '{}' en el pedido {}",
                pedido.urgencia, pedido.id_pedido
            )));
        }
        if let Some(ventana) = &pedido.ventana {
            tiempo::parse_ventana(ventana).map_err(|_| {
                AppError::BadRequest(format!(
                    "ventana inválida '{}' en el pedido {}",
                    ventana, pedido.id_pedido
                ))
            })?;
        }
    }

    Ok(pedidos.to_vec())
}

fn render_alert(alert: &PlanAlert, config: &PlanningConfig) -> String {
    match alert {
        PlanAlert::PedidoOmitidoPorCapacidad { id, urgencia } => format!(
            "Pedido {} (urgencia {}) quedó fuera por capacidad del camión",
            id,
            urgencia.as_str()
        ),
        PlanAlert::PedidoOmitidoPorLimiteParadas { id } => format!(
            "Pedido {} quedó fuera por el límite de {} paradas",
            id, config.max_stops
        ),
        PlanAlert::VentanaNoRespetada {
            id,
            eta_min,
            fin_ventana_min,
        } => format!(
            "La ventana de entrega del pedido {} no se puede cumplir (ETA {}, cierre {})",
            id,
            tiempo::format_minutos(*eta_min),
            tiempo::format_minutos(*fin_ventana_min)
        ),
        PlanAlert::UrgenteProgramadoTarde { id, orden } => format!(
            "El pedido {} tiene urgencia alta pero está programado en la posición {}",
            id, orden
        ),
        PlanAlert::UtilizacionAlta {
            peso_pct,
            volumen_pct,
        } => format!(
            "La utilización del camión supera el 90% (peso {:.1}%, volumen {:.1}%)",
            peso_pct, volumen_pct
        ),
    }
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn build_resumen(config: &PlanningConfig, plan: &RoutePlan) -> ResumenDto {
    let total_cajas: u32 = plan.stops.iter().map(|s| s.order.boxes).sum();
    let tiempo_total = plan.hora_fin_min - config.start_minutes as f64;
    let costo = plan.distancia_total_km * config.cost_per_km
        + tiempo_total / 60.0 * config.cost_per_hour;

    ResumenDto {
        capacidad_peso_usada_pct: round1(plan.peso_total_kg / config.capacity_kg * 100.0),
        capacidad_volumen_usada_pct: round1(plan.volumen_total_m3 / config.capacity_m3 * 100.0),
        costo_estimado: round2(costo),
        distancia_total_km: round2(plan.distancia_total_km),
        hora_fin_estimada: tiempo::format_minutos(plan.hora_fin_min.round() as u32),
        hora_inicio: tiempo::format_minutos(config.start_minutes),
        tiempo_conduccion_min: plan.tiempo_conduccion_min.round() as u32,
        tiempo_entregas_min: plan.tiempo_entregas_min.round() as u32,
        tiempo_total_min: tiempo_total.round() as u32,
        total_cajas,
        total_entregas: plan.stops.len() as u32,
    }
}

fn build_secuencia(plan: &RoutePlan) -> Vec<ParadaDto> {
    plan.stops
        .iter()
        .enumerate()
        .map(|(pos, stop)| ParadaDto {
            id_pedido: stop.order.id.clone(),
            cliente: stop.order.client.clone(),
            direccion: stop.order.address.clone(),
            direccion_formateada: stop.order.formatted_address.clone(),
            lat: stop.order.location.lat,
            lon: stop.order.location.lon,
            orden: (pos + 1) as u32,
            hora_estimada: tiempo::format_minutos(stop.eta_min.round() as u32),
            cajas: stop.order.boxes,
            urgencia: stop.order.urgency.as_str().to_string(),
            zona: stop.order.zone.clone(),
            distancia_desde_anterior_km: round2(stop.distancia_desde_anterior_km),
            tiempo_desde_anterior_min: stop.tiempo_desde_anterior_min.round() as u32,
        })
        .collect()
}
