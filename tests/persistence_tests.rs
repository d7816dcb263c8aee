//! Tests de persistencia contra PostgreSQL
//!
//! Requieren una base real (`DATABASE_URL`); están marcados `#[ignore]`
//! para que la suite por defecto no dependa de infraestructura. El setup
//! crea el schema que el servicio espera, incluido el índice UNIQUE sobre
//! `idempotency_key` que respalda la creación idempotente.
//!
//! Correr con: `cargo test --test persistence_tests -- --ignored`

use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

use pharma_routing::config::environment::EnvironmentConfig;
use pharma_routing::models::route::RouteStatus;
use pharma_routing::repositories::route_repository::RouteRepository;
use pharma_routing::services::optimizer_service::{OptimizerOptions, OptimizerService};
use pharma_routing::state::AppState;

async fn setup_pool() -> sqlx::PgPool {
    let url = std::env::var("DATABASE_URL").expect("DATABASE_URL debe apuntar a un Postgres de test");
    let pool = sqlx::PgPool::connect(&url).await.expect("conexión a Postgres");

    sqlx::query(
        r#"
        DO $$ BEGIN
            CREATE TYPE route_status AS ENUM ('pending', 'in_progress', 'completed', 'cancelled');
        EXCEPTION WHEN duplicate_object THEN NULL;
        END $$
        "#,
    )
    .execute(&pool)
    .await
    .expect("enum route_status");

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS rutas (
            id UUID PRIMARY KEY,
            estado route_status NOT NULL,
            resumen JSONB NOT NULL,
            secuencia_entregas JSONB NOT NULL,
            geometria JSONB NOT NULL,
            alertas JSONB NOT NULL,
            optimized_by TEXT,
            notes TEXT,
            driver_id TEXT,
            driver_name TEXT,
            idempotency_key TEXT,
            created_at TIMESTAMPTZ NOT NULL,
            updated_at TIMESTAMPTZ NOT NULL
        )
        "#,
    )
    .execute(&pool)
    .await
    .expect("tabla rutas");

    sqlx::query(
        "CREATE UNIQUE INDEX IF NOT EXISTS rutas_idempotency_key_idx ON rutas (idempotency_key)",
    )
    .execute(&pool)
    .await
    .expect("índice de idempotencia");

    pool
}

fn app_with_pool(pool: sqlx::PgPool) -> axum::Router {
    let config = EnvironmentConfig {
        environment: "test".to_string(),
        port: 0,
        host: "127.0.0.1".to_string(),
        osrm_url: None,
        mapbox_token: None,
        geocoding_country: "cl".to_string(),
        default_service_time_min: 12,
        fallback_speed_kmh: 40.0,
        optimization_timeout_secs: 30,
        planning_cache_ttl_minutes: 30,
    };
    let optimizer = OptimizerService::new(None, None, OptimizerOptions::default());
    pharma_routing::create_app(AppState::new(pool, config, optimizer))
}

fn documentos() -> (Value, Value, Value, Value) {
    (
        json!(["Pedido #ORD-002 quedó fuera por capacidad del camión"]),
        json!({"type": "LineString", "coordinates": [[-70.6693, -33.4489], [-70.65, -33.44]]}),
        json!({"total_entregas": 1, "total_cajas": 8, "distancia_total_km": 4.21}),
        json!([{"id_pedido": "#ORD-001", "orden": 1, "hora_estimada": "08:25", "cajas": 8}]),
    )
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.expect("body").to_bytes();
    serde_json::from_slice(&bytes).expect("json body")
}

#[tokio::test]
#[ignore]
async fn crear_y_leer_devuelve_los_documentos_identicos() {
    let pool = setup_pool().await;
    let app = app_with_pool(pool);
    let (alertas, geometria, resumen, secuencia) = documentos();

    let create = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/rutas")
                .header("content-type", "application/json")
                .body(Body::from(
                    json!({
                        "alertas": alertas,
                        "geometria": geometria,
                        "resumen": resumen,
                        "secuencia_entregas": secuencia,
                        "optimized_by": "backend"
                    })
                    .to_string(),
                ))
                .expect("request"),
        )
        .await
        .expect("response");
    assert_eq!(create.status(), StatusCode::OK);
    let id = body_json(create).await["id"].as_str().expect("id").to_string();

    let detail = app
        .oneshot(
            Request::builder()
                .uri(format!("/rutas/{}", id))
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("response");
    assert_eq!(detail.status(), StatusCode::OK);

    let body = body_json(detail).await;
    assert_eq!(body["alertas"], alertas);
    assert_eq!(body["geometria"], geometria);
    assert_eq!(body["resumen"], resumen);
    assert_eq!(body["secuencia_entregas"], secuencia);
    assert_eq!(body["estado"], "pending");
}

#[tokio::test]
#[ignore]
async fn clave_idempotencia_repetida_no_duplica() {
    let pool = setup_pool().await;
    let repository = RouteRepository::new(pool);
    let (alertas, geometria, resumen, secuencia) = documentos();
    let clave = format!("accept-{}", Uuid::new_v4());

    let primera = repository
        .create(
            alertas.clone(),
            geometria.clone(),
            resumen.clone(),
            secuencia.clone(),
            None,
            None,
            Some(clave.clone()),
        )
        .await
        .expect("primera creación");

    // mismo accept repetido (doble submit): debe volver la misma ruta
    let (r2, r3) = tokio::join!(
        repository.create(
            alertas.clone(),
            geometria.clone(),
            resumen.clone(),
            secuencia.clone(),
            None,
            None,
            Some(clave.clone()),
        ),
        repository.create(alertas, geometria, resumen, secuencia, None, None, Some(clave)),
    );

    assert_eq!(r2.expect("segunda creación").id, primera.id);
    assert_eq!(r3.expect("tercera creación").id, primera.id);
}

#[tokio::test]
#[ignore]
async fn update_con_estado_desactualizado_no_aplica() {
    let pool = setup_pool().await;
    let repository = RouteRepository::new(pool);
    let (alertas, geometria, resumen, secuencia) = documentos();

    let ruta = repository
        .create(alertas, geometria, resumen, secuencia, None, None, None)
        .await
        .expect("creación");
    assert_eq!(ruta.estado, RouteStatus::Pending);

    let avanzada = repository
        .update_estado(ruta.id, RouteStatus::Pending, RouteStatus::InProgress, None, None, None)
        .await
        .expect("update")
        .expect("transición aplicada");
    assert_eq!(avanzada.estado, RouteStatus::InProgress);

    // una request que leyó 'pending' antes de la carrera no debe aplicar nada
    let perdedora = repository
        .update_estado(ruta.id, RouteStatus::Pending, RouteStatus::Cancelled, None, None, None)
        .await
        .expect("update");
    assert!(perdedora.is_none());

    let actual = repository.find_by_id(ruta.id).await.expect("find").expect("ruta");
    assert_eq!(actual.estado, RouteStatus::InProgress);
}
