use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use fingerprint::{ContentItem, EntityFingerprint, EntityType, Severity};
use gate::{GateError, LiveDataGate};
use pipeline::{Orchestrator, PipelineError, PipelineRequest, PipelineResponse};
use scanner::{PrecisionMode, PrecisionScanner, ScanError, ScanFilters};
use store::{AuditSink, ContentStore, FingerprintStore, MemoryStore, SqliteStore, StoreError};

mod config;
mod metrics;

use config::{AppConfig, StoreConfig};
use metrics::{Metrics, MetricsSnapshot, TimedOperation};

#[derive(Clone)]
struct AppState {
    fingerprints: Arc<dyn FingerprintStore>,
    content: Arc<dyn ContentStore>,
    orchestrator: Arc<Orchestrator>,
    scanner: Arc<PrecisionScanner>,
    gate: LiveDataGate,
    metrics: Arc<Metrics>,
    default_mode: PrecisionMode,
}

struct Ports {
    fingerprints: Arc<dyn FingerprintStore>,
    content: Arc<dyn ContentStore>,
    audit: Arc<dyn AuditSink>,
}

fn ports_from<S>(store: Arc<S>) -> Ports
where
    S: FingerprintStore + ContentStore + AuditSink + 'static,
{
    Ports {
        fingerprints: store.clone(),
        content: store.clone(),
        audit: store,
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let config = AppConfig::from_env();

    let ports = match &config.store {
        StoreConfig::Memory => ports_from(Arc::new(MemoryStore::new())),
        StoreConfig::Sqlite { url } => {
            let store = SqliteStore::connect(url).await?;
            store.init_schema().await?;
            ports_from(Arc::new(store))
        }
    };

    let gate = LiveDataGate::new();
    let orchestrator = Orchestrator::new(
        ports.fingerprints.clone(),
        ports.content.clone(),
        ports.audit.clone(),
        gate.clone(),
    )
    .with_io_timeout(Duration::from_secs(config.pipeline.io_timeout_secs));
    let scanner = PrecisionScanner::new(ports.content.clone(), gate.clone());

    let state = Arc::new(AppState {
        fingerprints: ports.fingerprints,
        content: ports.content,
        orchestrator: Arc::new(orchestrator),
        scanner: Arc::new(scanner),
        gate,
        metrics: Metrics::new(),
        default_mode: config.pipeline.default_precision_mode,
    });

    let app = Router::new()
        .route("/health", get(health))
        .route("/metrics", get(metrics_snapshot))
        .route("/pipeline/run", post(run_pipeline))
        .route("/scan", post(scan))
        .route("/content", post(submit_content))
        .route(
            "/fingerprints/:name",
            get(get_fingerprint).put(put_fingerprint),
        )
        .route("/fingerprints/:name/aliases", post(append_aliases))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!(addr = %config.bind_addr, "api listening");
    axum::serve(listener, app).await?;
    Ok(())
}

#[derive(Serialize)]
struct HealthResponse {
    store: String,
    gate: String,
}

async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let store = match state.fingerprints.get("health-probe").await {
        Ok(_) => "ok".to_string(),
        Err(e) => format!("error: {}", e),
    };
    let gate = if state.gate.simulation_detected() {
        "latched"
    } else {
        "clear"
    };
    Json(HealthResponse {
        store,
        gate: gate.to_string(),
    })
}

async fn metrics_snapshot(State(state): State<Arc<AppState>>) -> Json<MetricsSnapshot> {
    Json(state.metrics.snapshot())
}

async fn run_pipeline(
    State(state): State<Arc<AppState>>,
    Json(req): Json<PipelineRequest>,
) -> Result<Json<PipelineResponse>, StatusCode> {
    let timer = TimedOperation::start();
    match state.orchestrator.execute(&req).await {
        Ok(response) => {
            state.metrics.record_run(
                timer.elapsed(),
                response.run.precision.verified.len(),
                response.run.precision.false_positives_blocked,
            );
            state.metrics.record_request(true);
            Ok(Json(response))
        }
        Err(err) => {
            state.metrics.record_request(false);
            tracing::error!(entity = %req.entity_name, error = %err, "pipeline run failed");
            Err(pipeline_status(&err))
        }
    }
}

fn pipeline_status(err: &PipelineError) -> StatusCode {
    match err {
        PipelineError::Gate(gate_err) => gate_status(gate_err),
        PipelineError::Store(store_err) => store_status(store_err),
        PipelineError::StageTimeout { .. } => StatusCode::GATEWAY_TIMEOUT,
    }
}

fn gate_status(err: &GateError) -> StatusCode {
    match err {
        GateError::SimulationBlocked { .. } => StatusCode::CONFLICT,
        GateError::Validation { .. } => StatusCode::UNPROCESSABLE_ENTITY,
    }
}

fn store_status(err: &StoreError) -> StatusCode {
    match err {
        StoreError::NotFound(_) => StatusCode::NOT_FOUND,
        StoreError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

#[derive(Deserialize)]
struct ScanRequest {
    entity_name: String,
    precision_mode: Option<PrecisionMode>,
    #[serde(default)]
    filters: Option<ScanFilters>,
}

#[derive(Serialize)]
struct ScanResponse {
    count: usize,
    items: Vec<ContentItem>,
}

async fn scan(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ScanRequest>,
) -> Result<Json<ScanResponse>, StatusCode> {
    let timer = TimedOperation::start();
    let mode = req.precision_mode.unwrap_or(state.default_mode);
    let filters = req.filters.unwrap_or_default();

    match state.scanner.scan(&req.entity_name, mode, &filters).await {
        Ok(items) => {
            state.metrics.record_scan(timer.elapsed());
            state.metrics.record_request(true);
            Ok(Json(ScanResponse {
                count: items.len(),
                items,
            }))
        }
        Err(err) => {
            state.metrics.record_request(false);
            tracing::error!(entity = %req.entity_name, error = %err, "scan failed");
            Err(match err {
                ScanError::Gate(e) => gate_status(&e),
                ScanError::Store(e) => store_status(&e),
            })
        }
    }
}

#[derive(Deserialize)]
struct ContentSubmission {
    id: Option<String>,
    content: String,
    title: Option<String>,
    platform: String,
    url: Option<String>,
    source_type: String,
    severity: Severity,
    threat_type: String,
    confidence_score: f64,
    created_at: Option<DateTime<Utc>>,
}

#[derive(Serialize)]
struct ContentAccepted {
    id: String,
}

async fn submit_content(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ContentSubmission>,
) -> Result<(StatusCode, Json<ContentAccepted>), StatusCode> {
    state
        .gate
        .check_clear("content_intake")
        .map_err(|e| gate_status(&e))?;

    let item = ContentItem {
        id: req.id.unwrap_or_else(|| Uuid::new_v4().to_string()),
        content: req.content,
        title: req.title,
        platform: req.platform,
        url: req.url,
        source_type: req.source_type,
        severity: req.severity,
        threat_type: req.threat_type,
        confidence_score: req.confidence_score,
        created_at: req.created_at.unwrap_or_else(Utc::now),
    };
    let id = item.id.clone();

    state.content.insert(item).await.map_err(|e| {
        tracing::error!(error = %e, "content insert failed");
        store_status(&e)
    })?;

    Ok((StatusCode::CREATED, Json(ContentAccepted { id })))
}

async fn get_fingerprint(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> Result<Json<EntityFingerprint>, StatusCode> {
    match state.fingerprints.get(&name).await {
        Ok(Some(fp)) => Ok(Json(fp)),
        Ok(None) => Err(StatusCode::NOT_FOUND),
        Err(e) => {
            tracing::error!(entity = %name, error = %e, "fingerprint lookup failed");
            Err(store_status(&e))
        }
    }
}

#[derive(Deserialize)]
struct FingerprintUpsert {
    entity_type: EntityType,
    #[serde(default)]
    alternate_names: Vec<String>,
    #[serde(default)]
    industries: Vec<String>,
    #[serde(default)]
    known_associates: Vec<String>,
    #[serde(default)]
    controversial_topics: Vec<String>,
    #[serde(default)]
    false_positive_blocklist: Vec<String>,
    #[serde(default = "default_live_only")]
    live_data_only: bool,
}

fn default_live_only() -> bool {
    true
}

async fn put_fingerprint(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
    Json(req): Json<FingerprintUpsert>,
) -> Result<Json<EntityFingerprint>, StatusCode> {
    let mut fp = EntityFingerprint::new(&name, req.entity_type, "api")
        .map_err(|_| StatusCode::UNPROCESSABLE_ENTITY)?;
    fp.alternate_names = req.alternate_names;
    fp.industries = req.industries;
    fp.known_associates = req.known_associates;
    fp.controversial_topics = req.controversial_topics;
    fp.false_positive_blocklist = req.false_positive_blocklist;
    fp.live_data_only = req.live_data_only;

    match state.fingerprints.upsert(fp).await {
        Ok(stored) => Ok(Json(stored)),
        Err(e) => {
            tracing::error!(entity = %name, error = %e, "fingerprint upsert failed");
            Err(store_status(&e))
        }
    }
}

#[derive(Deserialize)]
struct AliasAppend {
    aliases: Vec<String>,
}

async fn append_aliases(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
    Json(req): Json<AliasAppend>,
) -> Result<Json<EntityFingerprint>, StatusCode> {
    match state.fingerprints.append_aliases(&name, &req.aliases).await {
        Ok(fp) => Ok(Json(fp)),
        Err(e) => {
            tracing::error!(entity = %name, error = %e, "alias append failed");
            Err(store_status(&e))
        }
    }
}
