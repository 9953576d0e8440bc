use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use chrono::Utc;
use scoring::ItemStatus;
use serde::Deserialize;
use serde_json::json;
use tracing::info;
use uuid::Uuid;

use crate::auth::CurrentUser;
use crate::error::ApiError;
use crate::model::{AuditAction, Item, NewAuditEntry};
use crate::server::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateItemRequest {
    pub title: String,
    pub description: Option<String>,
    pub amount: f64,
    #[serde(default)]
    pub tags: Vec<String>,
    pub status: Option<ItemStatus>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateItemRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub amount: Option<f64>,
    pub tags: Option<Vec<String>>,
    pub status: Option<ItemStatus>,
}

pub async fn list_items(
    State(state): State<AppState>,
    CurrentUser(session): CurrentUser,
) -> Result<Json<Vec<Item>>, ApiError> {
    let items = state.items.list_items(session.user_id).await?;
    Ok(Json(items))
}

pub async fn create_item(
    State(state): State<AppState>,
    CurrentUser(session): CurrentUser,
    Json(request): Json<CreateItemRequest>,
) -> Result<(StatusCode, Json<Item>), ApiError> {
    if request.title.trim().is_empty() {
        return Err(ApiError::BadRequest("title is required".to_string()));
    }
    if !request.amount.is_finite() || request.amount < 0.0 {
        return Err(ApiError::BadRequest(
            "amount must be a non-negative number".to_string(),
        ));
    }

    let now = Utc::now();
    let mut item = Item {
        id: Uuid::new_v4(),
        title: request.title,
        description: request.description,
        amount: request.amount,
        tags: request.tags,
        status: request.status.unwrap_or_default(),
        risk_score: 0,
        user_id: session.user_id,
        created_at: now,
        updated_at: now,
    };

    item.risk_score = state.scorer.calculate_risk(&item).await;
    state.items.create_item(&item).await?;

    state
        .audits
        .record(NewAuditEntry {
            action: AuditAction::ItemCreated,
            field: None,
            old_value: None,
            new_value: Some(item.title.clone()),
            item_id: Some(item.id),
            user_id: session.user_id,
        })
        .await?;
    state
        .audits
        .record(NewAuditEntry {
            action: AuditAction::RiskScoreCalculated,
            field: Some("riskScore".to_string()),
            old_value: None,
            new_value: Some(item.risk_score.to_string()),
            item_id: Some(item.id),
            user_id: session.user_id,
        })
        .await?;

    info!(item_id = %item.id, risk_score = item.risk_score, "created item");
    Ok((StatusCode::CREATED, Json(item)))
}

pub async fn get_item(
    State(state): State<AppState>,
    CurrentUser(session): CurrentUser,
    Path(item_id): Path<Uuid>,
) -> Result<Json<Item>, ApiError> {
    let item = state
        .items
        .get_item(item_id)
        .await?
        .ok_or(ApiError::NotFound("Item"))?;
    if item.user_id != session.user_id {
        return Err(ApiError::Forbidden);
    }
    Ok(Json(item))
}

pub async fn update_item(
    State(state): State<AppState>,
    CurrentUser(session): CurrentUser,
    Path(item_id): Path<Uuid>,
    Json(request): Json<UpdateItemRequest>,
) -> Result<Json<Item>, ApiError> {
    let existing = state
        .items
        .get_item(item_id)
        .await?
        .ok_or(ApiError::NotFound("Item"))?;
    if existing.user_id != session.user_id {
        return Err(ApiError::Forbidden);
    }

    if let Some(amount) = request.amount {
        if !amount.is_finite() || amount < 0.0 {
            return Err(ApiError::BadRequest(
                "amount must be a non-negative number".to_string(),
            ));
        }
    }

    let mut updated = existing.clone();
    if let Some(title) = request.title {
        updated.title = title;
    }
    if let Some(description) = request.description {
        updated.description = Some(description);
    }
    if let Some(amount) = request.amount {
        updated.amount = amount;
    }
    if let Some(tags) = request.tags {
        updated.tags = tags;
    }
    if let Some(status) = request.status {
        updated.status = status;
    }
    updated.updated_at = Utc::now();

    state.items.update_item(&updated).await?;

    // One audit row per changed field, with the stringified before/after.
    for (field, old_value, new_value) in changed_fields(&existing, &updated) {
        state
            .audits
            .record(NewAuditEntry {
                action: AuditAction::ItemUpdated,
                field: Some(field.to_string()),
                old_value,
                new_value,
                item_id: Some(item_id),
                user_id: session.user_id,
            })
            .await?;
    }

    let risk_score = state.scorer.calculate_risk(&updated).await;
    if risk_score != existing.risk_score {
        state.items.set_risk_score(item_id, risk_score).await?;
        state
            .audits
            .record(NewAuditEntry {
                action: AuditAction::RiskScoreCalculated,
                field: Some("riskScore".to_string()),
                old_value: Some(existing.risk_score.to_string()),
                new_value: Some(risk_score.to_string()),
                item_id: Some(item_id),
                user_id: session.user_id,
            })
            .await?;
        updated.risk_score = risk_score;
    }

    Ok(Json(updated))
}

pub async fn delete_item(
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

    state.items.delete_item(item_id).await?;
    state
        .audits
        .record(NewAuditEntry {
            action: AuditAction::ItemDeleted,
            field: None,
            old_value: Some(item.title.clone()),
            new_value: None,
            item_id: Some(item_id),
            user_id: session.user_id,
        })
        .await?;

    info!(item_id = %item_id, "deleted item");
    Ok(Json(json!({ "success": true })))
}

type FieldChange = (&'static str, Option<String>, Option<String>);

fn changed_fields(before: &Item, after: &Item) -> Vec<FieldChange> {
    let mut changes: Vec<FieldChange> = Vec::new();
    if before.title != after.title {
        changes.push((
            "title",
            Some(before.title.clone()),
            Some(after.title.clone()),
        ));
    }
    if before.description != after.description {
        changes.push((
            "description",
            before.description.clone(),
            after.description.clone(),
        ));
    }
    if before.amount != after.amount {
        changes.push((
            "amount",
            Some(before.amount.to_string()),
            Some(after.amount.to_string()),
        ));
    }
    if before.tags != after.tags {
        changes.push((
            "tags",
            Some(before.tags.join(",")),
            Some(after.tags.join(",")),
        ));
    }
    if before.status != after.status {
        changes.push((
            "status",
            Some(before.status.as_str().to_string()),
            Some(after.status.as_str().to_string()),
        ));
    }
    changes
}
