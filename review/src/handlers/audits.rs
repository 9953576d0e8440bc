use axum::Json;
use axum::extract::{Query, State};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use crate::auth::CurrentUser;
use crate::error::ApiError;
use crate::server::AppState;
use crate::storage::AuditFilter;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditQuery {
    #[serde(default = "default_page")]
    pub page: i64,
    #[serde(default = "default_limit")]
    pub limit: i64,
    pub action: Option<String>,
    pub item_id: Option<Uuid>,
}

fn default_page() -> i64 {
    1
}

fn default_limit() -> i64 {
    50
}

/// Paginated audit trail over the caller's items, newest first.
pub async fn list_audits(
    State(state): State<AppState>,
    CurrentUser(session): CurrentUser,
    Query(query): Query<AuditQuery>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let page = query.page.max(1);
    let limit = query.limit.clamp(1, 200);

    let filter = AuditFilter {
        action: query.action,
        item_id: query.item_id,
        page,
        limit,
    };
    let result = state.audits.list_for_user(session.user_id, &filter).await?;

    let pages = (result.total + limit - 1) / limit;
    Ok(Json(json!({
        "audits": result.audits,
        "pagination": {
            "page": page,
            "limit": limit,
            "total": result.total,
            "pages": pages,
        },
    })))
}
