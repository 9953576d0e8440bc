use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use chrono::Utc;
use http_body_util::BodyExt;
use review::auth::{Session, SessionStore};
use review::model::{AuditAction, AuditEntry, Item, NewAuditEntry, Rule};
use review::server::{AppState, build_router};
use review::storage::{
    AuditFilter, AuditPage, AuditStorage, ItemStorage, RuleStorage, StorageError,
};
use scoring::ItemStatus;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tower::ServiceExt;
use uuid::Uuid;

/// In-memory stand-in for the Postgres storage, shared by all router tests.
#[derive(Default)]
pub struct MemoryStore {
    items: Mutex<Vec<Item>>,
    rules: Mutex<Vec<Rule>>,
    audits: Mutex<Vec<AuditEntry>>,
    sessions: Mutex<HashMap<String, Session>>,
}

impl MemoryStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn add_session(&self, token: &str, user_id: Uuid) {
        self.sessions
            .lock()
            .unwrap()
            .insert(token.to_string(), Session { user_id });
    }

    pub fn seed_rule(&self, rule: Rule) {
        self.rules.lock().unwrap().push(rule);
    }

    pub fn seed_item(&self, item: Item) {
        self.items.lock().unwrap().push(item);
    }

    pub fn stored_item(&self, item_id: Uuid) -> Option<Item> {
        self.items
            .lock()
            .unwrap()
            .iter()
            .find(|item| item.id == item_id)
            .cloned()
    }

    pub fn audit_count(&self, action: AuditAction) -> usize {
        self.audits
            .lock()
            .unwrap()
            .iter()
            .filter(|entry| entry.action == action)
            .count()
    }

    pub fn audits_for_field(&self, field: &str) -> Vec<AuditEntry> {
        self.audits
            .lock()
            .unwrap()
            .iter()
            .filter(|entry| entry.field.as_deref() == Some(field))
            .cloned()
            .collect()
    }
}

#[async_trait]
impl ItemStorage for MemoryStore {
    async fn create_item(&self, item: &Item) -> Result<(), StorageError> {
        self.items.lock().unwrap().push(item.clone());
        Ok(())
    }

    async fn get_item(&self, item_id: Uuid) -> Result<Option<Item>, StorageError> {
        Ok(self.stored_item(item_id))
    }

    async fn list_items(&self, user_id: Uuid) -> Result<Vec<Item>, StorageError> {
        Ok(self
            .items
            .lock()
            .unwrap()
            .iter()
            .filter(|item| item.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn update_item(&self, item: &Item) -> Result<(), StorageError> {
        let mut items = self.items.lock().unwrap();
        if let Some(stored) = items.iter_mut().find(|stored| stored.id == item.id) {
            *stored = item.clone();
        }
        Ok(())
    }

    async fn delete_item(&self, item_id: Uuid) -> Result<(), StorageError> {
        self.items.lock().unwrap().retain(|item| item.id != item_id);
        Ok(())
    }

    async fn set_risk_score(&self, item_id: Uuid, risk_score: i32) -> Result<(), StorageError> {
        let mut items = self.items.lock().unwrap();
        if let Some(stored) = items.iter_mut().find(|stored| stored.id == item_id) {
            stored.risk_score = risk_score;
        }
        Ok(())
    }
}

#[async_trait]
impl RuleStorage for MemoryStore {
    async fn create_rule(&self, rule: &Rule) -> Result<(), StorageError> {
        self.rules.lock().unwrap().push(rule.clone());
        Ok(())
    }

    async fn get_rule(&self, rule_id: Uuid) -> Result<Option<Rule>, StorageError> {
        Ok(self
            .rules
            .lock()
            .unwrap()
            .iter()
            .find(|rule| rule.id == rule_id)
            .cloned())
    }

    async fn list_visible_rules(&self, user_id: Uuid) -> Result<Vec<Rule>, StorageError> {
        let mut rules: Vec<Rule> = self
            .rules
            .lock()
            .unwrap()
            .iter()
            .filter(|rule| rule.user_id.is_none() || rule.user_id == Some(user_id))
            .cloned()
            .collect();
        rules.sort_by(|a, b| b.priority.cmp(&a.priority));
        Ok(rules)
    }

    async fn update_rule(&self, rule: &Rule) -> Result<(), StorageError> {
        let mut rules = self.rules.lock().unwrap();
        if let Some(stored) = rules.iter_mut().find(|stored| stored.id == rule.id) {
            *stored = rule.clone();
        }
        Ok(())
    }

    async fn delete_rule(&self, rule_id: Uuid) -> Result<(), StorageError> {
        self.rules.lock().unwrap().retain(|rule| rule.id != rule_id);
        Ok(())
    }

    async fn active_rules(&self) -> Result<Vec<Rule>, StorageError> {
        Ok(self
            .rules
            .lock()
            .unwrap()
            .iter()
            .filter(|rule| rule.is_active)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl AuditStorage for MemoryStore {
    async fn record(&self, entry: NewAuditEntry) -> Result<(), StorageError> {
        self.audits.lock().unwrap().push(AuditEntry {
            id: Uuid::new_v4(),
            action: entry.action,
            field: entry.field,
            old_value: entry.old_value,
            new_value: entry.new_value,
            item_id: entry.item_id,
            user_id: entry.user_id,
            created_at: Utc::now(),
        });
        Ok(())
    }

    async fn list_for_user(
        &self,
        user_id: Uuid,
        filter: &AuditFilter,
    ) -> Result<AuditPage, StorageError> {
        let owned: Vec<Uuid> = self
            .items
            .lock()
            .unwrap()
            .iter()
            .filter(|item| item.user_id == user_id)
            .map(|item| item.id)
            .collect();

        let mut matching: Vec<AuditEntry> = self
            .audits
            .lock()
            .unwrap()
            .iter()
            .filter(|entry| entry.item_id.map(|id| owned.contains(&id)).unwrap_or(false))
            .filter(|entry| {
                filter
                    .action
                    .as_deref()
                    .map(|action| entry.action.to_string() == action)
                    .unwrap_or(true)
            })
            .filter(|entry| {
                filter
                    .item_id
                    .map(|item_id| entry.item_id == Some(item_id))
                    .unwrap_or(true)
            })
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        let total = matching.len() as i64;
        let offset = ((filter.page - 1).max(0) * filter.limit) as usize;
        let audits = matching
            .into_iter()
            .skip(offset)
            .take(filter.limit as usize)
            .collect();

        Ok(AuditPage { audits, total })
    }
}

#[async_trait]
impl SessionStore for MemoryStore {
    async fn session_for_token(
        &self,
        token: &str,
    ) -> Result<Option<Session>, StorageError> {
        Ok(self.sessions.lock().unwrap().get(token).copied())
    }
}

pub fn test_app(store: Arc<MemoryStore>) -> Router {
    build_router(AppState::new(
        store.clone(),
        store.clone(),
        store.clone(),
        store,
    ))
}

pub fn stored_rule(condition: &str, score: i32, user_id: Option<Uuid>) -> Rule {
    Rule {
        id: Uuid::new_v4(),
        name: format!("rule scoring {}", score),
        description: None,
        condition: condition.to_string(),
        score,
        priority: 0,
        is_active: true,
        user_id,
        created_at: Utc::now(),
    }
}

pub fn stored_item(user_id: Uuid, amount: f64, tags: &[&str], risk_score: i32) -> Item {
    let now = Utc::now();
    Item {
        id: Uuid::new_v4(),
        title: "Stored item".to_string(),
        description: None,
        amount,
        tags: tags.iter().map(|tag| tag.to_string()).collect(),
        status: ItemStatus::New,
        risk_score,
        user_id,
        created_at: now,
        updated_at: now,
    }
}

/// Fire one request at the router and decode the JSON response.
pub async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::String(
            String::from_utf8_lossy(&bytes).to_string(),
        ))
    };
    (status, value)
}
