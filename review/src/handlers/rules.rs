use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use chrono::Utc;
use scoring::validate_rule_draft;
use serde::Deserialize;
use serde_json::json;
use tracing::info;
use uuid::Uuid;

use crate::auth::CurrentUser;
use crate::error::ApiError;
use crate::model::Rule;
use crate::server::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRuleRequest {
    pub name: String,
    pub description: Option<String>,
    pub condition: String,
    pub score: i32,
    #[serde(default = "default_active")]
    pub is_active: bool,
    #[serde(default)]
    pub priority: i32,
}

fn default_active() -> bool {
    true
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateRuleRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub condition: Option<String>,
    pub score: Option<i32>,
    pub is_active: Option<bool>,
    pub priority: Option<i32>,
}

pub async fn list_rules(
    State(state): State<AppState>,
    CurrentUser(session): CurrentUser,
) -> Result<Json<serde_json::Value>, ApiError> {
    let rules = state.rules.list_visible_rules(session.user_id).await?;
    Ok(Json(json!({ "rules": rules })))
}

pub async fn create_rule(
    State(state): State<AppState>,
    CurrentUser(session): CurrentUser,
    Json(request): Json<CreateRuleRequest>,
) -> Result<(StatusCode, Json<Rule>), ApiError> {
    validate_rule_draft(&request.name, &request.condition)?;

    let rule = Rule {
        id: Uuid::new_v4(),
        name: request.name,
        description: request.description,
        condition: request.condition,
        score: request.score,
        priority: request.priority,
        is_active: request.is_active,
        user_id: Some(session.user_id),
        created_at: Utc::now(),
    };
    state.rules.create_rule(&rule).await?;

    info!(rule_id = %rule.id, score = rule.score, "created rule");
    Ok((StatusCode::CREATED, Json(rule)))
}

pub async fn update_rule(
    State(state): State<AppState>,
    CurrentUser(session): CurrentUser,
    Path(rule_id): Path<Uuid>,
    Json(request): Json<UpdateRuleRequest>,
) -> Result<Json<Rule>, ApiError> {
    let existing = state
        .rules
        .get_rule(rule_id)
        .await?
        .ok_or(ApiError::NotFound("Rule"))?;
    // Global rules carry no owner and stay editable by any session.
    if let Some(owner) = existing.user_id {
        if owner != session.user_id {
            return Err(ApiError::Forbidden);
        }
    }

    let mut updated = existing;
    if let Some(name) = request.name {
        updated.name = name;
    }
    if let Some(description) = request.description {
        updated.description = Some(description);
    }
    if let Some(condition) = request.condition {
        updated.condition = condition;
    }
    if let Some(score) = request.score {
        updated.score = score;
    }
    if let Some(is_active) = request.is_active {
        updated.is_active = is_active;
    }
    if let Some(priority) = request.priority {
        updated.priority = priority;
    }

    // The resulting rule has to pass the same gate as a fresh one.
    validate_rule_draft(&updated.name, &updated.condition)?;

    state.rules.update_rule(&updated).await?;
    Ok(Json(updated))
}

pub async fn delete_rule(
    State(state): State<AppState>,
    CurrentUser(session): CurrentUser,
    Path(rule_id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let existing = state
        .rules
        .get_rule(rule_id)
        .await?
        .ok_or(ApiError::NotFound("Rule"))?;
    if let Some(owner) = existing.user_id {
        if owner != session.user_id {
            return Err(ApiError::Forbidden);
        }
    }

    state.rules.delete_rule(rule_id).await?;
    info!(rule_id = %rule_id, "deleted rule");
    Ok(Json(json!({ "success": true })))
}
