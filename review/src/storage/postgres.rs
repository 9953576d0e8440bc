use async_trait::async_trait;
use chrono::{DateTime, Utc};
use scoring::ItemStatus;
use sqlx::postgres::PgPoolOptions;
use sqlx::{FromRow, PgPool};
use tracing::{debug, info};
use uuid::Uuid;

use crate::auth::{Session, SessionStore};
use crate::model::{AuditAction, AuditEntry, Item, NewAuditEntry, Rule};
use crate::storage::{
    AuditFilter, AuditPage, AuditStorage, ItemStorage, RuleStorage, StorageError,
};

const SCHEMA: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS items (
        id UUID PRIMARY KEY,
        title TEXT NOT NULL,
        description TEXT,
        amount DOUBLE PRECISION NOT NULL,
        tags TEXT[] NOT NULL DEFAULT '{}',
        status TEXT NOT NULL DEFAULT 'NEW',
        risk_score INTEGER NOT NULL DEFAULT 0,
        user_id UUID NOT NULL,
        created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
        updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
    )",
    "CREATE TABLE IF NOT EXISTS rules (
        id UUID PRIMARY KEY,
        name TEXT NOT NULL,
        description TEXT,
        condition TEXT NOT NULL,
        score INTEGER NOT NULL,
        priority INTEGER NOT NULL DEFAULT 0,
        is_active BOOLEAN NOT NULL DEFAULT TRUE,
        user_id UUID,
        created_at TIMESTAMPTZ NOT NULL DEFAULT now()
    )",
    "CREATE TABLE IF NOT EXISTS audits (
        id UUID PRIMARY KEY,
        action TEXT NOT NULL,
        field TEXT,
        old_value TEXT,
        new_value TEXT,
        item_id UUID,
        user_id UUID NOT NULL,
        created_at TIMESTAMPTZ NOT NULL DEFAULT now()
    )",
    "CREATE TABLE IF NOT EXISTS sessions (
        token TEXT PRIMARY KEY,
        user_id UUID NOT NULL,
        expires_at TIMESTAMPTZ
    )",
    "CREATE INDEX IF NOT EXISTS idx_items_user ON items (user_id)",
    "CREATE INDEX IF NOT EXISTS idx_rules_active ON rules (is_active)",
    "CREATE INDEX IF NOT EXISTS idx_audits_item ON audits (item_id)",
];

#[derive(Clone)]
pub struct PgStorage {
    pool: PgPool,
}

impl PgStorage {
    pub async fn new(database_url: &str) -> Result<Self, StorageError> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect(database_url)
            .await?;
        Ok(Self { pool })
    }

    pub fn with_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn initialize_schema(&self) -> Result<(), StorageError> {
        for statement in SCHEMA {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        info!("database schema initialized");
        Ok(())
    }
}

#[derive(FromRow)]
struct ItemRow {
    id: Uuid,
    title: String,
    description: Option<String>,
    amount: f64,
    tags: Vec<String>,
    status: String,
    risk_score: i32,
    user_id: Uuid,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ItemRow> for Item {
    type Error = StorageError;

    fn try_from(row: ItemRow) -> Result<Self, StorageError> {
        let status: ItemStatus = row
            .status
            .parse()
            .map_err(|_| format!("unknown item status `{}`", row.status))?;
        Ok(Item {
            id: row.id,
            title: row.title,
            description: row.description,
            amount: row.amount,
            tags: row.tags,
            status,
            risk_score: row.risk_score,
            user_id: row.user_id,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(FromRow)]
struct RuleRow {
    id: Uuid,
    name: String,
    description: Option<String>,
    condition: String,
    score: i32,
    priority: i32,
    is_active: bool,
    user_id: Option<Uuid>,
    created_at: DateTime<Utc>,
}

impl From<RuleRow> for Rule {
    fn from(row: RuleRow) -> Self {
        Rule {
            id: row.id,
            name: row.name,
            description: row.description,
            condition: row.condition,
            score: row.score,
            priority: row.priority,
            is_active: row.is_active,
            user_id: row.user_id,
            created_at: row.created_at,
        }
    }
}

#[derive(FromRow)]
struct AuditRow {
    id: Uuid,
    action: String,
    field: Option<String>,
    old_value: Option<String>,
    new_value: Option<String>,
    item_id: Option<Uuid>,
    user_id: Uuid,
    created_at: DateTime<Utc>,
}

impl TryFrom<AuditRow> for AuditEntry {
    type Error = StorageError;

    fn try_from(row: AuditRow) -> Result<Self, StorageError> {
        let action: AuditAction = row
            .action
            .parse()
            .map_err(|_| format!("unknown audit action `{}`", row.action))?;
        Ok(AuditEntry {
            id: row.id,
            action,
            field: row.field,
            old_value: row.old_value,
            new_value: row.new_value,
            item_id: row.item_id,
            user_id: row.user_id,
            created_at: row.created_at,
        })
    }
}

const ITEM_COLUMNS: &str =
    "id, title, description, amount, tags, status, risk_score, user_id, created_at, updated_at";

#[async_trait]
impl ItemStorage for PgStorage {
    async fn create_item(&self, item: &Item) -> Result<(), StorageError> {
        sqlx::query(
            "INSERT INTO items (id, title, description, amount, tags, status, risk_score, user_id, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)",
        )
        .bind(item.id)
        .bind(&item.title)
        .bind(&item.description)
        .bind(item.amount)
        .bind(&item.tags)
        .bind(item.status.as_str())
        .bind(item.risk_score)
        .bind(item.user_id)
        .bind(item.created_at)
        .bind(item.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get_item(&self, item_id: Uuid) -> Result<Option<Item>, StorageError> {
        let row = sqlx::query_as::<_, ItemRow>(&format!(
            "SELECT {ITEM_COLUMNS} FROM items WHERE id = $1"
        ))
        .bind(item_id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(Item::try_from).transpose()
    }

    async fn list_items(&self, user_id: Uuid) -> Result<Vec<Item>, StorageError> {
        let rows = sqlx::query_as::<_, ItemRow>(&format!(
            "SELECT {ITEM_COLUMNS} FROM items WHERE user_id = $1 ORDER BY created_at DESC"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(Item::try_from).collect()
    }

    async fn update_item(&self, item: &Item) -> Result<(), StorageError> {
        sqlx::query(
            "UPDATE items
             SET title = $2, description = $3, amount = $4, tags = $5, status = $6, updated_at = $7
             WHERE id = $1",
        )
        .bind(item.id)
        .bind(&item.title)
        .bind(&item.description)
        .bind(item.amount)
        .bind(&item.tags)
        .bind(item.status.as_str())
        .bind(item.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn delete_item(&self, item_id: Uuid) -> Result<(), StorageError> {
        sqlx::query("DELETE FROM items WHERE id = $1")
            .bind(item_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn set_risk_score(&self, item_id: Uuid, risk_score: i32) -> Result<(), StorageError> {
        debug!(%item_id, risk_score, "persisting risk score");
        sqlx::query("UPDATE items SET risk_score = $2, updated_at = now() WHERE id = $1")
            .bind(item_id)
            .bind(risk_score)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

const RULE_COLUMNS: &str =
    "id, name, description, condition, score, priority, is_active, user_id, created_at";

#[async_trait]
impl RuleStorage for PgStorage {
    async fn create_rule(&self, rule: &Rule) -> Result<(), StorageError> {
        sqlx::query(
            "INSERT INTO rules (id, name, description, condition, score, priority, is_active, user_id, created_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
        )
        .bind(rule.id)
        .bind(&rule.name)
        .bind(&rule.description)
        .bind(&rule.condition)
        .bind(rule.score)
        .bind(rule.priority)
        .bind(rule.is_active)
        .bind(rule.user_id)
        .bind(rule.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get_rule(&self, rule_id: Uuid) -> Result<Option<Rule>, StorageError> {
        let row = sqlx::query_as::<_, RuleRow>(&format!(
            "SELECT {RULE_COLUMNS} FROM rules WHERE id = $1"
        ))
        .bind(rule_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Rule::from))
    }

    async fn list_visible_rules(&self, user_id: Uuid) -> Result<Vec<Rule>, StorageError> {
        let rows = sqlx::query_as::<_, RuleRow>(&format!(
            "SELECT {RULE_COLUMNS} FROM rules
             WHERE user_id = $1 OR user_id IS NULL
             ORDER BY priority DESC, created_at DESC"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Rule::from).collect())
    }

    async fn update_rule(&self, rule: &Rule) -> Result<(), StorageError> {
        sqlx::query(
            "UPDATE rules
             SET name = $2, description = $3, condition = $4, score = $5, priority = $6, is_active = $7
             WHERE id = $1",
        )
        .bind(rule.id)
        .bind(&rule.name)
        .bind(&rule.description)
        .bind(&rule.condition)
        .bind(rule.score)
        .bind(rule.priority)
        .bind(rule.is_active)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn delete_rule(&self, rule_id: Uuid) -> Result<(), StorageError> {
        sqlx::query("DELETE FROM rules WHERE id = $1")
            .bind(rule_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn active_rules(&self) -> Result<Vec<Rule>, StorageError> {
        let rows = sqlx::query_as::<_, RuleRow>(&format!(
            "SELECT {RULE_COLUMNS} FROM rules WHERE is_active = TRUE"
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Rule::from).collect())
    }
}

#[async_trait]
impl AuditStorage for PgStorage {
    async fn record(&self, entry: NewAuditEntry) -> Result<(), StorageError> {
        sqlx::query(
            "INSERT INTO audits (id, action, field, old_value, new_value, item_id, user_id, created_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, now())",
        )
        .bind(Uuid::new_v4())
        .bind(entry.action.to_string())
        .bind(&entry.field)
        .bind(&entry.old_value)
        .bind(&entry.new_value)
        .bind(entry.item_id)
        .bind(entry.user_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn list_for_user(
        &self,
        user_id: Uuid,
        filter: &AuditFilter,
    ) -> Result<AuditPage, StorageError> {
        let offset = (filter.page - 1).max(0) * filter.limit;

        let rows = sqlx::query_as::<_, AuditRow>(
            "SELECT a.id, a.action, a.field, a.old_value, a.new_value, a.item_id, a.user_id, a.created_at
             FROM audits a
             JOIN items i ON a.item_id = i.id
             WHERE i.user_id = $1
               AND ($2::text IS NULL OR a.action = $2)
               AND ($3::uuid IS NULL OR a.item_id = $3)
             ORDER BY a.created_at DESC
             LIMIT $4 OFFSET $5",
        )
        .bind(user_id)
        .bind(&filter.action)
        .bind(filter.item_id)
        .bind(filter.limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*)
             FROM audits a
             JOIN items i ON a.item_id = i.id
             WHERE i.user_id = $1
               AND ($2::text IS NULL OR a.action = $2)
               AND ($3::uuid IS NULL OR a.item_id = $3)",
        )
        .bind(user_id)
        .bind(&filter.action)
        .bind(filter.item_id)
        .fetch_one(&self.pool)
        .await?;

        let audits = rows
            .into_iter()
            .map(AuditEntry::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(AuditPage { audits, total })
    }
}

#[derive(FromRow)]
struct SessionRow {
    user_id: Uuid,
}

#[async_trait]
impl SessionStore for PgStorage {
    async fn session_for_token(
        &self,
        token: &str,
    ) -> Result<Option<Session>, StorageError> {
        let row = sqlx::query_as::<_, SessionRow>(
            "SELECT user_id FROM sessions
             WHERE token = $1 AND (expires_at IS NULL OR expires_at > now())",
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(|row| Session {
            user_id: row.user_id,
        }))
    }
}
