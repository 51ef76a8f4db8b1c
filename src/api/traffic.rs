use axum::{
    extract::{rejection::QueryRejection, Query, State},
    http::header::CONTENT_TYPE,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use chrono::Utc;
use serde_json::Value;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{error, info, warn};

use crate::{
    client::{HttpVendorClient, VendorClient},
    config::ProxyConfig,
    credentials::Credentials,
    metrics::{self, RequestTimer},
    models::{HealthResponse, TrafficQuery},
    normalize::normalize,
    request::{build_signed_request, new_nonce, MetricSelection, ResolutionMode},
    ProxyError, Result,
};

#[derive(Clone)]
pub struct ProxyState {
    pub credentials: Option<Arc<Credentials>>,
    pub client: Arc<dyn VendorClient>,
    pub default_site_id: String,
}

impl ProxyState {
    pub fn new(
        credentials: Option<Credentials>,
        client: Arc<dyn VendorClient>,
        default_site_id: impl Into<String>,
    ) -> Self {
        Self {
            credentials: credentials.map(Arc::new),
            client,
            default_site_id: default_site_id.into(),
        }
    }

    fn mapped_mode(&self) -> ResolutionMode {
        ResolutionMode::Mapped {
            default_site_id: self.default_site_id.clone(),
        }
    }
}

pub fn router(state: ProxyState) -> Router {
    Router::new()
        .route("/traffic", get(mapped_traffic))
        .route("/traffic/raw", get(raw_traffic))
        .route("/health", get(health))
        .route("/metrics", get(prometheus_metrics))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Sign, send and normalize one analytics query.
///
/// Exactly one vendor call is made, and only after signing succeeded.
pub async fn run_query(
    state: &ProxyState,
    query: &TrafficQuery,
    mode: &ResolutionMode,
) -> Result<Value> {
    let credentials = state
        .credentials
        .as_deref()
        .ok_or(ProxyError::CredentialsMissing)?;

    let selection = mode.select(
        query.metric.as_deref(),
        query.action.as_deref(),
        query.name.as_deref(),
        query.dimension.as_deref(),
    );
    if let (ResolutionMode::Mapped { .. }, MetricSelection::RawOverride { .. }, Some(metric)) =
        (mode, &selection, query.metric.as_deref())
    {
        warn!("Metric {} is not in the catalog, using raw query fields", metric);
        metrics::record_unresolved_metric();
    }

    let request = build_signed_request(
        &selection,
        credentials,
        &query.window(),
        mode.default_site_id(),
        Utc::now(),
        &new_nonce(),
    )?;

    let body = state.client.fetch(&request).await?;
    Ok(normalize(query.metric.as_deref(), body))
}

async fn handle(state: ProxyState, query: TrafficQuery, mode: ResolutionMode) -> Result<Json<Value>> {
    let _timer = RequestTimer::new(mode.label());
    info!(
        "Analytics query: mode={} metric={:?}",
        mode.label(),
        query.metric
    );

    match run_query(&state, &query, &mode).await {
        Ok(body) => Ok(Json(body)),
        Err(e) => {
            error!("Analytics query failed: {}", e);
            Err(e)
        }
    }
}

type QueryPairs = std::result::Result<Query<Vec<(String, String)>>, QueryRejection>;

fn traffic_query(pairs: QueryPairs) -> Result<TrafficQuery> {
    let Query(pairs) = pairs.map_err(|rejection| {
        warn!("Rejected query string: {}", rejection.body_text());
        ProxyError::from(rejection)
    })?;
    Ok(TrafficQuery::from_pairs(pairs))
}

async fn mapped_traffic(
    State(state): State<ProxyState>,
    pairs: QueryPairs,
) -> Result<Json<Value>> {
    let query = traffic_query(pairs)?;
    let mode = state.mapped_mode();
    handle(state, query, mode).await
}

async fn raw_traffic(State(state): State<ProxyState>, pairs: QueryPairs) -> Result<Json<Value>> {
    let query = traffic_query(pairs)?;
    handle(state, query, ResolutionMode::Passthrough).await
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

async fn prometheus_metrics() -> Result<impl IntoResponse> {
    let body = metrics::render()?;
    Ok(([(CONTENT_TYPE, "text/plain; version=0.0.4")], body))
}

pub async fn serve(config: ProxyConfig, credentials: Option<Credentials>) -> Result<()> {
    let client = HttpVendorClient::new(config.vendor_endpoint.clone())?;
    info!("Forwarding analytics queries to {}", client.endpoint());

    let state = ProxyState::new(credentials, Arc::new(client), config.default_site_id.clone());
    let app = router(state);

    let addr = config.bind_address();
    info!("Starting analytics proxy on {}", addr);

    let listener = TcpListener::bind(&addr).await.map_err(|e| {
        ProxyError::Internal(format!("Failed to bind to address {}: {}", addr, e))
    })?;

    axum::serve(listener, app)
        .await
        .map_err(|e| ProxyError::Internal(format!("Server error: {}", e)))?;

    Ok(())
}
