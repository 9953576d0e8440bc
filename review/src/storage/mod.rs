// Storage traits plus the Postgres implementation
pub mod postgres;

pub use postgres::PgStorage;

use async_trait::async_trait;
use scoring::{CompiledRule, RuleSource};
use std::{error::Error, sync::Arc};
use uuid::Uuid;

use crate::model::{AuditEntry, Item, NewAuditEntry, Rule};

pub type StorageError = Box<dyn Error + Send + Sync>;

#[async_trait]
pub trait ItemStorage: Send + Sync {
    async fn create_item(&self, item: &Item) -> Result<(), StorageError>;

    async fn get_item(&self, item_id: Uuid) -> Result<Option<Item>, StorageError>;

    async fn list_items(&self, user_id: Uuid) -> Result<Vec<Item>, StorageError>;

    async fn update_item(&self, item: &Item) -> Result<(), StorageError>;

    async fn delete_item(&self, item_id: Uuid) -> Result<(), StorageError>;

    async fn set_risk_score(&self, item_id: Uuid, risk_score: i32) -> Result<(), StorageError>;
}

#[async_trait]
pub trait RuleStorage: Send + Sync {
    async fn create_rule(&self, rule: &Rule) -> Result<(), StorageError>;

    async fn get_rule(&self, rule_id: Uuid) -> Result<Option<Rule>, StorageError>;

    /// Rules visible to a user: their own plus global (ownerless) ones,
    /// priority-descending for display.
    async fn list_visible_rules(&self, user_id: Uuid) -> Result<Vec<Rule>, StorageError>;

    async fn update_rule(&self, rule: &Rule) -> Result<(), StorageError>;

    async fn delete_rule(&self, rule_id: Uuid) -> Result<(), StorageError>;

    /// Every rule with `is_active = true`, regardless of owner. This is the
    /// snapshot evaluation runs against.
    async fn active_rules(&self) -> Result<Vec<Rule>, StorageError>;
}

#[derive(Debug, Clone, Default)]
pub struct AuditFilter {
    pub action: Option<String>,
    pub item_id: Option<Uuid>,
    pub page: i64,
    pub limit: i64,
}

#[derive(Debug, Clone)]
pub struct AuditPage {
    pub audits: Vec<AuditEntry>,
    pub total: i64,
}

#[async_trait]
pub trait AuditStorage: Send + Sync {
    async fn record(&self, entry: NewAuditEntry) -> Result<(), StorageError>;

    /// Audit rows for items owned by `user_id`, newest first.
    async fn list_for_user(
        &self,
        user_id: Uuid,
        filter: &AuditFilter,
    ) -> Result<AuditPage, StorageError>;
}

/// Adapter exposing the rule table as the engine's `RuleSource`.
pub struct StoredRules {
    rules: Arc<dyn RuleStorage>,
}

impl StoredRules {
    pub fn new(rules: Arc<dyn RuleStorage>) -> Self {
        Self { rules }
    }
}

#[async_trait]
impl RuleSource for StoredRules {
    async fn fetch_active_rules(&self) -> Result<Vec<CompiledRule>, StorageError> {
        let rules = self.rules.active_rules().await?;
        Ok(rules.iter().map(Rule::compile).collect())
    }
}
