use axum::Router;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, patch};
use common::config::BackendConfig;
use http::header;
use scoring::RiskScorer;
use std::{error::Error, sync::Arc};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::auth::SessionStore;
use crate::handlers::{
    create_item, create_rule, delete_item, delete_rule, get_item, list_audits, list_items,
    list_rules, read_score, recalculate_score, update_item, update_rule,
};
use crate::storage::{AuditStorage, ItemStorage, RuleStorage, StoredRules};

#[derive(Clone)]
pub struct AppState {
    pub items: Arc<dyn ItemStorage>,
    pub rules: Arc<dyn RuleStorage>,
    pub audits: Arc<dyn AuditStorage>,
    pub sessions: Arc<dyn SessionStore>,
    pub scorer: RiskScorer,
}

impl AppState {
    pub fn new(
        items: Arc<dyn ItemStorage>,
        rules: Arc<dyn RuleStorage>,
        audits: Arc<dyn AuditStorage>,
        sessions: Arc<dyn SessionStore>,
    ) -> Self {
        let scorer = RiskScorer::new(Arc::new(StoredRules::new(rules.clone())));
        Self {
            items,
            rules,
            audits,
            sessions,
            scorer,
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/api/items", get(list_items).post(create_item))
        .route(
            "/api/items/{id}",
            get(get_item).patch(update_item).delete(delete_item),
        )
        .route(
            "/api/items/{id}/score",
            get(read_score).post(recalculate_score),
        )
        .route("/api/rules", get(list_rules).post(create_rule))
        .route("/api/rules/{id}", patch(update_rule).delete(delete_rule))
        .route("/api/audits", get(list_audits))
        .route("/health", get(health_check))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(
                    "http://localhost:3000"
                        .parse::<header::HeaderValue>()
                        .unwrap(),
                )
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

pub async fn run_backend(
    config: BackendConfig,
    state: AppState,
) -> Result<(), Box<dyn Error + Send + Sync>> {
    let app = build_router(state);

    tracing::info!("Starting backend service at {}", config.server_address);
    let listener = tokio::net::TcpListener::bind(&config.server_address).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK").into_response()
}
