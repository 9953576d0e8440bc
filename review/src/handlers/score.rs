use axum::Json;
use axum::extract::{Path, State};
use scoring::RiskLevel;
use serde_json::json;
use tracing::info;
use uuid::Uuid;

use crate::auth::CurrentUser;
use crate::error::ApiError;
use crate::model::{AuditAction, NewAuditEntry};
use crate::server::AppState;

/// Recompute and persist the risk score for one item.
pub async fn recalculate_score(
    State(state): State<AppState>,
    CurrentUser(session): CurrentUser,
    Path(item_id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let item = state
        .items
        .get_item(item_id)
        .await?
        .ok_or(ApiError::NotFound("Item"))?;
    if item.user_id != session.user_id {
        return Err(ApiError::Forbidden);
    }

    let risk_score = state.scorer.calculate_risk(&item).await;
    state.items.set_risk_score(item_id, risk_score).await?;
    state
        .audits
        .record(NewAuditEntry {
            action: AuditAction::RiskScoreCalculated,
            field: Some("riskScore".to_string()),
            old_value: Some(item.risk_score.to_string()),
            new_value: Some(risk_score.to_string()),
            item_id: Some(item_id),
            user_id: session.user_id,
        })
        .await?;

    let mut updated = item;
    updated.risk_score = risk_score;

    info!(item_id = %item_id, risk_score, "recalculated risk score");
    Ok(Json(json!({
        "success": true,
        "item": updated,
        "riskScore": risk_score,
    })))
}

/// Return the stored risk score together with its display bucket.
pub async fn read_score(
    State(state): State<AppState>,
    CurrentUser(session): CurrentUser,
    Path(item_id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let item = state
        .items
        .get_item(item_id)
        .await?
        .ok_or(ApiError::NotFound("Item"))?;
    if item.user_id != session.user_id {
        return Err(ApiError::Forbidden);
    }

    let risk_level = RiskLevel::from_score(item.risk_score);
    Ok(Json(json!({
        "item": item,
        "riskLevel": risk_level,
    })))
}
