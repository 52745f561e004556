//! Cache admin endpoints.
//!
//! # Endpoints
//!
//! - `GET /cache/stats` - Per-namespace hit/miss counters and entry counts
//! - `GET /cache/health` - Backend mode, Redis reachability, listener liveness
//! - `POST /cache/clear` - Scoped clear (`namespace`, `tenant_code`,
//!   `organization_code` query filters, all optional)
//! - `POST /cache/warmup` - Warm the working set (`tenant_code`,
//!   `organization_code` filters, optional)
//!
//! Mutating endpoints route through the same invalidate-and-publish path as
//! organic writers; there is no operator shortcut that bypasses distributed
//! invalidation, so an admin clear cannot leave instances divergent.

use axum::Router;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::json;

use mentorhub_cache::{InvalidationEvent, Namespace};

use crate::state::AppState;
use crate::warmup::run_warmup;

// =============================================================================
// Routes
// =============================================================================

/// Creates the cache admin routes.
pub fn cache_routes() -> Router<AppState> {
    Router::new()
        .route("/cache/stats", get(cache_stats))
        .route("/cache/health", get(cache_health))
        .route("/cache/clear", post(clear_cache))
        .route("/cache/warmup", post(warmup_cache))
}

// =============================================================================
// Error Type
// =============================================================================

/// Admin request error rendered as `{"error": ...}`.
#[derive(Debug)]
pub struct AdminError {
    status: StatusCode,
    message: String,
}

impl AdminError {
    fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    fn internal(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: message.into(),
        }
    }
}

impl IntoResponse for AdminError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}

// =============================================================================
// Handlers
// =============================================================================

async fn cache_stats(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.cache.stats())
}

#[derive(Debug, Serialize)]
struct CacheHealth {
    status: &'static str,
    mode: String,
    redis_available: bool,
    listener_alive: bool,
}

async fn cache_health(State(state): State<AppState>) -> impl IntoResponse {
    let mode = state.cache.backend().mode().to_string();
    let redis_available = state.cache.backend().is_redis_available().await;
    let listener_alive = state
        .listener_alive
        .load(std::sync::atomic::Ordering::Relaxed);

    // Local mode has no remote tier to lose; Redis mode is degraded when
    // either the L2 tier or the invalidation subscription is down.
    let healthy = match mode.as_str() {
        "redis" => redis_available && listener_alive,
        _ => listener_alive,
    };

    Json(CacheHealth {
        status: if healthy { "ok" } else { "degraded" },
        mode,
        redis_available,
        listener_alive,
    })
}

#[derive(Debug, Deserialize)]
struct ClearParams {
    namespace: Option<String>,
    tenant_code: Option<String>,
    #[serde(alias = "org_id")]
    organization_code: Option<String>,
}

#[derive(Debug, Serialize)]
struct ClearResponse {
    events: usize,
    publish_degraded: bool,
}

/// Scoped cache clear.
///
/// Builds the same invalidation events an organic writer would, applies them
/// locally, and publishes them so every other instance converges.
async fn clear_cache(
    State(state): State<AppState>,
    Query(params): Query<ClearParams>,
) -> Result<Json<ClearResponse>, AdminError> {
    // Recognized namespace values are exactly the registered names; anything
    // else is a client input error, not forwarded to the cache.
    let namespace = params
        .namespace
        .as_deref()
        .map(|name| name.parse::<Namespace>())
        .transpose()
        .map_err(|e| AdminError::bad_request(e.to_string()))?;

    let tenant = params.tenant_code.as_deref();
    let organization = params.organization_code.as_deref();
    if organization.is_some() && tenant.is_none() {
        return Err(AdminError::bad_request(
            "organization_code requires tenant_code",
        ));
    }

    let events = match (namespace, tenant) {
        // One namespace, at whatever tenant/org granularity was given.
        (Some(ns), _) => vec![InvalidationEvent::namespace(ns, tenant, organization)],
        // Whole tenant across all namespaces.
        (None, Some(tenant_code)) if organization.is_none() => {
            vec![InvalidationEvent::tenant(tenant_code)]
        }
        // One (tenant, organization) scope across all namespaces.
        (None, Some(tenant_code)) => Namespace::ALL
            .iter()
            .map(|ns| InvalidationEvent::namespace(*ns, Some(tenant_code), organization))
            .collect(),
        // No filters: full clear, one event per namespace.
        (None, None) => Namespace::ALL
            .iter()
            .map(|ns| InvalidationEvent::namespace(*ns, None, None))
            .collect(),
    };

    let mut publish_degraded = false;
    for event in &events {
        // Evict locally first; the publish only has to reach the others.
        state.cache.apply_event(event).await;

        let outcome = state.bus.publish(event).await;
        if outcome.is_degraded() {
            publish_degraded = true;
            tracing::warn!(
                scope = event.scope_label(),
                outcome = %outcome.describe(),
                "admin cache clear publish degraded"
            );
        }
    }

    tracing::info!(
        events = events.len(),
        namespace = ?params.namespace,
        tenant_code = ?params.tenant_code,
        "admin cache clear"
    );

    Ok(Json(ClearResponse {
        events: events.len(),
        publish_degraded,
    }))
}

#[derive(Debug, Deserialize)]
struct WarmupParams {
    tenant_code: Option<String>,
    #[serde(alias = "org_id")]
    organization_code: Option<String>,
}

async fn warmup_cache(
    State(state): State<AppState>,
    Query(params): Query<WarmupParams>,
) -> Result<Response, AdminError> {
    if params.organization_code.is_some() && params.tenant_code.is_none() {
        return Err(AdminError::bad_request(
            "organization_code requires tenant_code",
        ));
    }

    let report = run_warmup(
        &state.cache,
        state.warmup.as_ref(),
        params.tenant_code.as_deref(),
        params.organization_code.as_deref(),
    )
    .await
    .map_err(|e| AdminError::internal(format!("warm-up failed: {e}")))?;

    Ok(Json(report).into_response())
}
