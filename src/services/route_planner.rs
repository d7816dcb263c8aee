//! Motor de planificación de rutas
//!
//! Construcción de la secuencia de entregas para un camión: admisión por
//! capacidad, secuenciación por vecino más cercano según la política de
//! costo, agenda de ETAs con ventanas de entrega y generación de alertas.
//!
//! El motor es una función pura de (configuración, pedidos, matriz de viaje)
//! y es determinista: ante costos marginales iguales gana la urgencia más
//! alta y luego el pedido que apareció antes en el request.

use crate::models::planning::{OptimizationPolicy, PlanningConfig, PlanningOrder, Urgency};
use crate::services::routing_service::TravelMatrix;
use crate::utils::errors::{AppError, AppResult};

/// Tolerancia para considerar iguales dos costos marginales
const EPSILON_COSTO: f64 = 1e-9;

/// Umbral de utilización que dispara la alerta de capacidad
const UMBRAL_UTILIZACION_PCT: f64 = 90.0;

/// Por qué un pedido quedó fuera de la ruta
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OmitReason {
    Capacidad,
    LimiteParadas,
}

/// Alertas tipadas del plan; se traducen a texto en el borde HTTP
#[derive(Debug, Clone, PartialEq)]
pub enum PlanAlert {
    PedidoOmitidoPorCapacidad { id: String, urgencia: Urgency },
    PedidoOmitidoPorLimiteParadas { id: String },
    VentanaNoRespetada { id: String, eta_min: u32, fin_ventana_min: u32 },
    UrgenteProgramadoTarde { id: String, orden: usize },
    UtilizacionAlta { peso_pct: f64, volumen_pct: f64 },
}

/// Parada planificada con sus métricas de tramo
#[derive(Debug, Clone)]
pub struct PlannedStop {
    pub order: PlanningOrder,
    pub eta_min: f64,
    pub distancia_desde_anterior_km: f64,
    pub tiempo_desde_anterior_min: f64,
}

/// Resultado del motor para una corrida
#[derive(Debug, Clone)]
pub struct RoutePlan {
    pub stops: Vec<PlannedStop>,
    pub omitted: Vec<(PlanningOrder, OmitReason)>,
    pub distancia_total_km: f64,
    pub tiempo_conduccion_min: f64,
    pub tiempo_entregas_min: f64,
    pub hora_fin_min: f64,
    pub peso_total_kg: f64,
    pub volumen_total_m3: f64,
    pub alerts: Vec<PlanAlert>,
    /// Índices de matriz de la secuencia final (0 = bodega), para geometría
    pub matrix_sequence: Vec<usize>,
}

/// Planificar una ruta. La matriz usa índice 0 para la bodega y `i + 1`
/// para `orders[i]`.
pub fn plan(
    config: &PlanningConfig,
    orders: &[PlanningOrder],
    matrix: &TravelMatrix,
) -> AppResult<RoutePlan> {
    if orders.is_empty() {
        return Err(AppError::EmptySelection);
    }

    debug_assert_eq!(matrix.len(), orders.len() + 1);

    let mut alerts = Vec::new();
    let (admitted, omitted) = admit_orders(config, orders)?;

    for (order, reason) in &omitted {
        match reason {
            OmitReason::Capacidad => alerts.push(PlanAlert::PedidoOmitidoPorCapacidad {
                id: order.id.clone(),
                urgencia: order.urgency,
            }),
            OmitReason::LimiteParadas => alerts.push(PlanAlert::PedidoOmitidoPorLimiteParadas {
                id: order.id.clone(),
            }),
        }
    }

    let sequence = build_sequence(config, orders, &admitted, matrix);
    let (stops, totals) = schedule(config, orders, &sequence, matrix, &mut alerts);

    let peso_total_kg: f64 = stops.iter().map(|s| s.order.weight_kg).sum();
    let volumen_total_m3: f64 = stops.iter().map(|s| s.order.volume_m3).sum();

    let peso_pct = peso_total_kg / config.capacity_kg * 100.0;
    let volumen_pct = volumen_total_m3 / config.capacity_m3 * 100.0;
    if peso_pct > UMBRAL_UTILIZACION_PCT || volumen_pct > UMBRAL_UTILIZACION_PCT {
        alerts.push(PlanAlert::UtilizacionAlta {
            peso_pct,
            volumen_pct,
        });
    }

    // Pedido urgente programado en la mitad final de la secuencia
    let total = stops.len();
    for (pos, stop) in stops.iter().enumerate() {
        let orden = pos + 1;
        if stop.order.urgency == Urgency::Alta && total >= 2 && orden * 2 > total + 1 {
            alerts.push(PlanAlert::UrgenteProgramadoTarde {
                id: stop.order.id.clone(),
                orden,
            });
        }
    }

    let mut matrix_sequence = vec![0];
    matrix_sequence.extend(sequence.iter().map(|&i| i + 1));
    if config.return_to_depot {
        matrix_sequence.push(0);
    }

    Ok(RoutePlan {
        stops,
        omitted,
        distancia_total_km: totals.distancia_km,
        tiempo_conduccion_min: totals.conduccion_min,
        tiempo_entregas_min: totals.entregas_min,
        hora_fin_min: totals.fin_min,
        peso_total_kg,
        volumen_total_m3,
        alerts,
        matrix_sequence,
    })
}

/// Admisión por capacidad y techo de paradas.
///
/// Política de sobrecupo: se admite greedy en orden de prioridad
/// (urgencia, luego apertura de ventana, luego orden de llegada) mientras
/// quepan peso Y volumen; el resto queda fuera con alerta. Si ni el primer
/// pedido cabe, la corrida es infactible.
fn admit_orders(
    config: &PlanningConfig,
    orders: &[PlanningOrder],
) -> AppResult<(Vec<usize>, Vec<(PlanningOrder, OmitReason)>)> {
    let mut by_priority: Vec<usize> = (0..orders.len()).collect();
    by_priority.sort_by(|&a, &b| {
        let oa = &orders[a];
        let ob = &orders[b];
        ob.urgency
            .priority()
            .cmp(&oa.urgency.priority())
            .then_with(|| window_start(oa).cmp(&window_start(ob)))
            .then_with(|| oa.input_index.cmp(&ob.input_index))
    });

    let mut admitted = Vec::new();
    let mut omitted = Vec::new();
    let mut peso = 0.0;
    let mut volumen = 0.0;

    for idx in by_priority {
        let order = &orders[idx];
        if peso + order.weight_kg <= config.capacity_kg
            && volumen + order.volume_m3 <= config.capacity_m3
        {
            peso += order.weight_kg;
            volumen += order.volume_m3;
            admitted.push(idx);
        } else {
            omitted.push((order.clone(), OmitReason::Capacidad));
        }
    }

    if admitted.is_empty() {
        let primero = &orders[0];
        return Err(AppError::InfeasibleCapacity(format!(
            "ningún pedido cabe en el camión: {} requiere {:.1} kg / {:.2} m³ y el camión admite {:.1} kg / {:.2} m³",
            primero.id, primero.weight_kg, primero.volume_m3, config.capacity_kg, config.capacity_m3
        )));
    }

    // max_paradas es un techo duro, se respeta el mismo orden de prioridad
    if admitted.len() > config.max_stops {
        for idx in admitted.split_off(config.max_stops) {
            omitted.push((orders[idx].clone(), OmitReason::LimiteParadas));
        }
    }

    Ok((admitted, omitted))
}

fn window_start(order: &PlanningOrder) -> u32 {
    order.window.map(|(inicio, _)| inicio).unwrap_or(u32::MAX)
}

/// Secuenciación por vecino más cercano según la política de costo
fn build_sequence(
    config: &PlanningConfig,
    orders: &[PlanningOrder],
    admitted: &[usize],
    matrix: &TravelMatrix,
) -> Vec<usize> {
    let mut remaining: Vec<usize> = admitted.to_vec();
    let mut sequence = Vec::with_capacity(remaining.len());
    let mut current = 0; // bodega

    while !remaining.is_empty() {
        let mut best_pos = 0;
        let mut best_cost = f64::INFINITY;

        for (pos, &idx) in remaining.iter().enumerate() {
            let cost = marginal_cost(config, matrix, current, idx + 1);
            let order = &orders[idx];
            let best_order = &orders[remaining[best_pos]];

            let mejora = cost < best_cost - EPSILON_COSTO;
            let empata = (cost - best_cost).abs() <= EPSILON_COSTO;
            let gana_desempate = empata
                && (order.urgency.priority() > best_order.urgency.priority()
                    || (order.urgency.priority() == best_order.urgency.priority()
                        && order.input_index < best_order.input_index));

            if mejora || gana_desempate {
                best_cost = cost;
                best_pos = pos;
            }
        }

        let idx = remaining.remove(best_pos);
        current = idx + 1;
        sequence.push(idx);
    }

    sequence
}

fn marginal_cost(config: &PlanningConfig, matrix: &TravelMatrix, from: usize, to: usize) -> f64 {
    let km = matrix.distancia_km[from][to];
    let min = matrix.tiempo_min[from][to];
    match config.policy {
        OptimizationPolicy::DistanciaMinima => km,
        OptimizationPolicy::TiempoMinimo => min,
        OptimizationPolicy::CostoEstimado => {
            km * config.cost_per_km + min / 60.0 * config.cost_per_hour
        }
    }
}

struct Totals {
    distancia_km: f64,
    conduccion_min: f64,
    entregas_min: f64,
    fin_min: f64,
}

/// Agenda de la secuencia: acumula viaje + servicio, espera aperturas de
/// ventana y alerta ventanas imposibles sin romper la ruta.
fn schedule(
    config: &PlanningConfig,
    orders: &[PlanningOrder],
    sequence: &[usize],
    matrix: &TravelMatrix,
    alerts: &mut Vec<PlanAlert>,
) -> (Vec<PlannedStop>, Totals) {
    let mut stops = Vec::with_capacity(sequence.len());
    let mut reloj = config.start_minutes as f64;
    let mut conduccion = 0.0;
    let mut distancia = 0.0;
    let mut current = 0;

    for &idx in sequence {
        let destino = idx + 1;
        let travel_min = matrix.tiempo_min[current][destino];
        let travel_km = matrix.distancia_km[current][destino];

        reloj += travel_min;
        conduccion += travel_min;
        distancia += travel_km;

        let order = &orders[idx];
        if config.respect_time_windows {
            if let Some((inicio, fin)) = order.window {
                if reloj < inicio as f64 {
                    // llegada temprana: se espera la apertura de la ventana
                    reloj = inicio as f64;
                }
                if reloj > fin as f64 {
                    alerts.push(PlanAlert::VentanaNoRespetada {
                        id: order.id.clone(),
                        eta_min: reloj.round() as u32,
                        fin_ventana_min: fin,
                    });
                }
            }
        }

        stops.push(PlannedStop {
            order: order.clone(),
            eta_min: reloj,
            distancia_desde_anterior_km: travel_km,
            tiempo_desde_anterior_min: travel_min,
        });

        reloj += config.service_time_min as f64;
        current = destino;
    }

    if config.return_to_depot && !sequence.is_empty() {
        let travel_min = matrix.tiempo_min[current][0];
        conduccion += travel_min;
        distancia += matrix.distancia_km[current][0];
        reloj += travel_min;
    }

    let entregas = (stops.len() as u32 * config.service_time_min) as f64;
    (
        stops,
        Totals {
            distancia_km: distancia,
            conduccion_min: conduccion,
            entregas_min: entregas,
            fin_min: reloj,
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::planning::{GeoPoint, PlanningOrder};
    use crate::services::routing_service::haversine_km;

    fn config_base() -> PlanningConfig {
        PlanningConfig {
            depot_address: "Bodega Central, Santiago".to_string(),
            depot: Some(GeoPoint {
                lat: -33.4489,
                lon: -70.6693,
            }),
            start_minutes: 480, // 08:00
            capacity_kg: 500.0,
            capacity_m3: 12.0,
            return_to_depot: true,
            max_stops: 10,
            cost_per_km: 250.0,
            cost_per_hour: 8000.0,
            policy: OptimizationPolicy::DistanciaMinima,
            respect_time_windows: true,
            service_time_min: 12,
        }
    }

    fn pedido(
        id: &str,
        lat: f64,
        lon: f64,
        cajas: u32,
        urgencia: Urgency,
        ventana: Option<(u32, u32)>,
        input_index: usize,
    ) -> PlanningOrder {
        PlanningOrder {
            id: id.to_string(),
            client: format!("Cliente {}", id),
            address: format!("Dirección {}", id),
            formatted_address: format!("Dirección {}, Santiago", id),
            location: GeoPoint { lat, lon },
            boxes: cajas,
            weight_kg: PlanningOrder::weight_for_boxes(cajas),
            volume_m3: PlanningOrder::volume_for_boxes(cajas),
            urgency: urgencia,
            window: ventana,
            zone: "centro".to_string(),
            input_index,
        }
    }

    /// Matriz sintética: haversine a 40 km/h, índice 0 = bodega
    fn matriz(config: &PlanningConfig, orders: &[PlanningOrder]) -> TravelMatrix {
        let mut points = vec![config.depot.unwrap()];
        points.extend(orders.iter().map(|o| o.location));
        let n = points.len();
        let mut distancia_km = vec![vec![0.0; n]; n];
        let mut tiempo_min = vec![vec![0.0; n]; n];
        for i in 0..n {
            for j in 0..n {
                if i != j {
                    let km = haversine_km(points[i], points[j]);
                    distancia_km[i][j] = km;
                    tiempo_min[i][j] = km / 40.0 * 60.0;
                }
            }
        }
        TravelMatrix {
            distancia_km,
            tiempo_min,
        }
    }

    fn tres_pedidos() -> Vec<PlanningOrder> {
        vec![
            pedido("#ORD-001", -33.4372, -70.6506, 12, Urgency::Media, Some((480, 720)), 0),
            pedido("#ORD-002", -33.4569, -70.6483, 8, Urgency::Alta, Some((540, 780)), 1),
            pedido("#ORD-003", -33.4260, -70.6140, 5, Urgency::Baja, None, 2),
        ]
    }

    #[test]
    fn seleccion_vacia_rechazada() {
        let config = config_base();
        let matrix = matriz(&config, &[]);
        let err = plan(&config, &[], &matrix).unwrap_err();
        assert!(matches!(err, AppError::EmptySelection));
    }

    #[test]
    fn escenario_tres_pedidos_conserva_totales() {
        let config = config_base();
        let orders = tres_pedidos();
        let matrix = matriz(&config, &orders);
        let result = plan(&config, &orders, &matrix).unwrap();

        assert_eq!(result.stops.len(), 3);
        let total_cajas: u32 = result.stops.iter().map(|s| s.order.boxes).sum();
        assert_eq!(total_cajas, 25);
        assert!((result.peso_total_kg - 62.5).abs() < 1e-9);
        assert!((result.volumen_total_m3 - 1.0).abs() < 1e-9);
        assert!(result.omitted.is_empty());

        // la distancia total es la suma de tramos más el regreso a bodega
        let suma_tramos: f64 = result
            .stops
            .iter()
            .map(|s| s.distancia_desde_anterior_km)
            .sum();
        assert!(result.distancia_total_km >= suma_tramos - 1e-9);
    }

    #[test]
    fn etas_monotonas_no_decrecientes() {
        let config = config_base();
        let orders = tres_pedidos();
        let matrix = matriz(&config, &orders);
        let result = plan(&config, &orders, &matrix).unwrap();

        for ventana in result.stops.windows(2) {
            assert!(ventana[1].eta_min >= ventana[0].eta_min);
        }
        assert!(result.hora_fin_min >= result.stops.last().unwrap().eta_min);
    }

    #[test]
    fn dos_corridas_identicas_mismo_resultado() {
        let config = config_base();
        let orders = tres_pedidos();
        let matrix = matriz(&config, &orders);

        let a = plan(&config, &orders, &matrix).unwrap();
        let b = plan(&config, &orders, &matrix).unwrap();

        let ids_a: Vec<&str> = a.stops.iter().map(|s| s.order.id.as_str()).collect();
        let ids_b: Vec<&str> = b.stops.iter().map(|s| s.order.id.as_str()).collect();
        assert_eq!(ids_a, ids_b);
        assert_eq!(a.distancia_total_km, b.distancia_total_km);
        assert_eq!(a.hora_fin_min, b.hora_fin_min);
    }

    #[test]
    fn capacidad_nunca_excedida_en_ningun_prefijo() {
        let mut config = config_base();
        config.capacity_kg = 60.0; // no caben los 25 bultos (62.5 kg)
        let orders = tres_pedidos();
        let matrix = matriz(&config, &orders);
        let result = plan(&config, &orders, &matrix).unwrap();

        let mut acumulado = 0.0;
        for stop in &result.stops {
            acumulado += stop.order.weight_kg;
            assert!(acumulado <= config.capacity_kg + 1e-9);
        }
        assert!(!result.omitted.is_empty());
    }

    #[test]
    fn sobrecupo_descarta_menor_urgencia_con_alerta() {
        let mut config = config_base();
        // cabe alta (20 kg) + media (30 kg), la baja (12.5 kg) queda fuera
        config.capacity_kg = 52.0;
        let orders = tres_pedidos();
        let matrix = matriz(&config, &orders);
        let result = plan(&config, &orders, &matrix).unwrap();

        let omitidos: Vec<&str> = result.omitted.iter().map(|(o, _)| o.id.as_str()).collect();
        assert_eq!(omitidos, vec!["#ORD-003"]);
        assert!(result.alerts.iter().any(|a| matches!(
            a,
            PlanAlert::PedidoOmitidoPorCapacidad { id, .. } if id == "#ORD-003"
        )));
    }

    #[test]
    fn ni_un_pedido_cabe_es_infactible() {
        let mut config = config_base();
        config.capacity_kg = 10.0;
        let orders = vec![pedido("#ORD-010", -33.44, -70.65, 12, Urgency::Alta, None, 0)];
        let matrix = matriz(&config, &orders);
        let err = plan(&config, &orders, &matrix).unwrap_err();
        assert!(matches!(err, AppError::InfeasibleCapacity(_)));
    }

    #[test]
    fn techo_de_paradas_es_duro() {
        let mut config = config_base();
        config.max_stops = 2;
        let orders = tres_pedidos();
        let matrix = matriz(&config, &orders);
        let result = plan(&config, &orders, &matrix).unwrap();

        assert!(result.stops.len() <= 2);
        assert!(result
            .alerts
            .iter()
            .any(|a| matches!(a, PlanAlert::PedidoOmitidoPorLimiteParadas { .. })));
    }

    #[test]
    fn desempate_prefiere_urgencia_mas_alta() {
        let config = config_base();
        // dos pedidos en el mismo punto: costo marginal idéntico desde la bodega
        let orders = vec![
            pedido("#ORD-020", -33.4400, -70.6500, 4, Urgency::Baja, None, 0),
            pedido("#ORD-021", -33.4400, -70.6500, 4, Urgency::Alta, None, 1),
        ];
        let matrix = matriz(&config, &orders);
        let result = plan(&config, &orders, &matrix).unwrap();
        assert_eq!(result.stops[0].order.id, "#ORD-021");
    }

    #[test]
    fn desempate_con_igual_urgencia_prefiere_orden_de_llegada() {
        let config = config_base();
        let orders = vec![
            pedido("#ORD-030", -33.4400, -70.6500, 4, Urgency::Media, None, 0),
            pedido("#ORD-031", -33.4400, -70.6500, 4, Urgency::Media, None, 1),
        ];
        let matrix = matriz(&config, &orders);
        let result = plan(&config, &orders, &matrix).unwrap();
        assert_eq!(result.stops[0].order.id, "#ORD-030");
    }

    #[test]
    fn llegada_temprana_espera_apertura_de_ventana() {
        let config = config_base();
        // ventana que abre una hora después de lo que tomaría llegar
        let orders = vec![pedido(
            "#ORD-040",
            -33.4400,
            -70.6500,
            4,
            Urgency::Media,
            Some((600, 700)),
            0,
        )];
        let matrix = matriz(&config, &orders);
        let result = plan(&config, &orders, &matrix).unwrap();
        assert_eq!(result.stops[0].eta_min, 600.0);
        assert!(result
            .alerts
            .iter()
            .all(|a| !matches!(a, PlanAlert::VentanaNoRespetada { .. })));
    }

    #[test]
    fn ventana_imposible_alerta_sin_bloquear() {
        let config = config_base();
        // la ventana cerró antes de la hora de salida
        let orders = vec![pedido(
            "#ORD-041",
            -33.4400,
            -70.6500,
            4,
            Urgency::Media,
            Some((300, 360)),
            0,
        )];
        let matrix = matriz(&config, &orders);
        let result = plan(&config, &orders, &matrix).unwrap();
        assert_eq!(result.stops.len(), 1);
        assert!(result.alerts.iter().any(|a| matches!(
            a,
            PlanAlert::VentanaNoRespetada { id, .. } if id == "#ORD-041"
        )));
    }

    #[test]
    fn utilizacion_sobre_umbral_alerta() {
        let mut config = config_base();
        config.capacity_kg = 65.0; // 62.5 kg usados ≈ 96 %
        let orders = tres_pedidos();
        let matrix = matriz(&config, &orders);
        let result = plan(&config, &orders, &matrix).unwrap();
        assert!(result
            .alerts
            .iter()
            .any(|a| matches!(a, PlanAlert::UtilizacionAlta { .. })));
    }

    #[test]
    fn sin_retorno_no_suma_tramo_final() {
        let mut config = config_base();
        let orders = tres_pedidos();
        let matrix = matriz(&config, &orders);
        let con_retorno = plan(&config, &orders, &matrix).unwrap();

        config.return_to_depot = false;
        let sin_retorno = plan(&config, &orders, &matrix).unwrap();

        assert!(con_retorno.distancia_total_km > sin_retorno.distancia_total_km);
        assert_eq!(*con_retorno.matrix_sequence.last().unwrap(), 0);
        assert_ne!(*sin_retorno.matrix_sequence.last().unwrap(), 0);
    }
}
