//! HTTP surface for free-text search.
//!
//! Exposes `GET {api_prefix}/search/?query=...`. Each request opens its own
//! store handle on the blocking pool; no connection outlives a request.
//!
//! Usage: `roster-search serve --addr 0.0.0.0:8080`

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;

use crate::config::RosterSearchConfig;
use crate::error::{Result, SearchError};
use crate::graph::store::GraphStore;
use crate::search::{validate_query, SearchEngine, SearchOutcome, QUERY_REQUIRED};

/// Shared, read-only request context.
#[derive(Debug, Clone)]
pub struct AppState {
    db_path: Arc<str>,
    api_prefix: Arc<str>,
}

impl AppState {
    pub fn new(db_path: &str, api_prefix: &str) -> Self {
        Self {
            db_path: Arc::from(db_path),
            api_prefix: Arc::from(api_prefix.trim_end_matches('/')),
        }
    }

    pub fn from_config(config: &RosterSearchConfig) -> Self {
        Self::new(&config.database.path, &config.server.api_prefix)
    }
}

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    query: Option<String>,
}

/// Build the router. The search route answers with and without a trailing
/// slash.
pub fn router(state: AppState) -> Router {
    let route = format!("{}/search", state.api_prefix);
    Router::new()
        .route(&route, get(text_search))
        .route(&format!("{route}/"), get(text_search))
        .with_state(state)
}

fn message(status: StatusCode, text: &str) -> Response {
    (status, Json(json!({ "message": text }))).into_response()
}

async fn text_search(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Response {
    let query = match validate_query(params.query.as_deref()) {
        Ok(q) => q.to_string(),
        Err(_) => return message(StatusCode::BAD_REQUEST, QUERY_REQUIRED),
    };

    let task_state = state.clone();
    let joined = tokio::task::spawn_blocking(move || -> Result<SearchOutcome> {
        let store = GraphStore::connect(&task_state.db_path)?;
        SearchEngine::new(&store)
            .with_href_prefix(task_state.api_prefix.to_string())
            .search(&query)
    })
    .await;

    match joined {
        Ok(Ok(SearchOutcome::NoResults)) => StatusCode::NO_CONTENT.into_response(),
        Ok(Ok(SearchOutcome::Results(results))) => (StatusCode::OK, Json(results)).into_response(),
        Ok(Err(SearchError::Validation(text))) => message(StatusCode::BAD_REQUEST, &text),
        Ok(Err(e)) => {
            tracing::error!(error = %e, "search failed");
            message(StatusCode::INTERNAL_SERVER_ERROR, &e.to_string())
        }
        Err(e) => {
            tracing::error!(error = %e, "search task panicked");
            message(StatusCode::INTERNAL_SERVER_ERROR, "search task failed")
        }
    }
}

/// Bind `config.server.addr` and serve until Ctrl-C.
pub async fn run_http_server(config: &RosterSearchConfig) -> Result<()> {
    config.server.validate()?;
    let app = router(AppState::from_config(config));
    let listener = tokio::net::TcpListener::bind(&config.server.addr).await?;

    tracing::info!(
        addr = %config.server.addr,
        prefix = %config.server.api_prefix,
        db = %config.database.path,
        "roster-search listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("Shutting down HTTP server");
        })
        .await?;

    Ok(())
}
