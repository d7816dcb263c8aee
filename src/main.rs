use anyhow::Result;
use dotenvy::dotenv;
use std::net::SocketAddr;
use tokio::signal;
use tracing::{error, info, warn};

use pharma_routing::config::environment::EnvironmentConfig;
use pharma_routing::database::create_pool;
use pharma_routing::services::geocoding_service::GeocodingService;
use pharma_routing::services::optimizer_service::{OptimizerOptions, OptimizerService};
use pharma_routing::services::routing_service::OsrmProvider;
use pharma_routing::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Cargar variables de entorno
    dotenv().ok();

    // Configurar logging
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    info!("🚚 Planificador de Rutas de Reparto Farmacéutico");
    info!("================================================");

    let config = EnvironmentConfig::default();

    // Inicializar base de datos
    let pool = match create_pool(None).await {
        Ok(pool) => pool,
        Err(e) => {
            error!("❌ Error conectando a la base de datos: {}", e);
            return Err(anyhow::anyhow!("Error de base de datos: {}", e));
        }
    };

    // Servicios externos opcionales: sin ellos se trabaja en modo degradado
    let geocoding = match &config.mapbox_token {
        Some(token) => Some(GeocodingService::new(
            token.clone(),
            config.geocoding_country.clone(),
        )?),
        None => {
            warn!("⚠️ MAPBOX_TOKEN no configurado: los pedidos deben traer coordenadas");
            None
        }
    };

    let osrm = match &config.osrm_url {
        Some(url) => Some(OsrmProvider::new(url.clone())?),
        None => {
            warn!("⚠️ OSRM_URL no configurado: distancias estimadas en línea recta");
            None
        }
    };

    let optimizer = OptimizerService::new(
        geocoding,
        osrm,
        OptimizerOptions {
            default_service_time_min: config.default_service_time_min,
            fallback_speed_kmh: config.fallback_speed_kmh,
            timeout_secs: config.optimization_timeout_secs,
        },
    );

    let addr: SocketAddr = config.server_url().parse()?;
    let app_state = AppState::new(pool, config, optimizer);
    let app = pharma_routing::create_app(app_state);

    info!("🌐 Servidor iniciando en http://{}", addr);
    info!("🔍 Endpoints disponibles:");
    info!("   GET   /pedidos/pendientes - Pedidos pendientes de planificar");
    info!("   POST  /rutas/optimizar - Optimizar selección de pedidos");
    info!("   GET   /rutas/optimizar/:id - Corrida de planificación cacheada");
    info!("   POST  /rutas - Aceptar una ruta optimizada");
    info!("   GET   /rutas - Listar rutas");
    info!("   GET   /rutas/:id - Detalle de ruta");
    info!("   PATCH /rutas/:id/estado - Transición de estado");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| {
            error!("❌ Error del servidor: {}", e);
            anyhow::anyhow!(e)
        })?;

    info!("👋 Servidor terminado");
    Ok(())
}

/// Señal de apagado graceful
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("🛑 Señal Ctrl+C recibida, apagando servidor...");
        },
        _ = terminate => {
            info!("🛑 Señal de terminación recibida, apagando servidor...");
        },
    }
}
