use chrono::{DateTime, Utc};
use scoring::{CompiledRule, ItemStatus, RuleCondition, Subject};
use serde::{Deserialize, Serialize};
use strum_macros::{Display as EnumDisplay, EnumString};
use uuid::Uuid;

/// A record under review: the subject the rule engine scores.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub amount: f64,
    pub tags: Vec<String>,
    pub status: ItemStatus,
    pub risk_score: i32,
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Subject for Item {
    fn amount(&self) -> f64 {
        self.amount
    }

    fn tags(&self) -> &[String] {
        &self.tags
    }

    fn description(&self) -> &str {
        self.description.as_deref().unwrap_or("")
    }

    fn title(&self) -> &str {
        &self.title
    }

    fn status(&self) -> Option<ItemStatus> {
        Some(self.status)
    }
}

/// A stored rule. The condition is kept in its raw serialized form and only
/// decoded when the rule is compiled for evaluation; a rule without an owner
/// (`user_id = None`) is global and visible to every user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Rule {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub condition: String,
    pub score: i32,
    pub priority: i32,
    pub is_active: bool,
    pub user_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl Rule {
    pub fn compile(&self) -> CompiledRule {
        CompiledRule {
            id: self.id,
            name: self.name.clone(),
            score: self.score,
            priority: self.priority,
            is_active: self.is_active,
            condition: RuleCondition::decode_lenient(&self.condition),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumDisplay, EnumString)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditAction {
    ItemCreated,
    ItemUpdated,
    ItemDeleted,
    RiskScoreCalculated,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditEntry {
    pub id: Uuid,
    pub action: AuditAction,
    pub field: Option<String>,
    pub old_value: Option<String>,
    pub new_value: Option<String>,
    pub item_id: Option<Uuid>,
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
}

/// An audit row before it is assigned an id and timestamp by storage.
#[derive(Debug, Clone)]
pub struct NewAuditEntry {
    pub action: AuditAction,
    pub field: Option<String>,
    pub old_value: Option<String>,
    pub new_value: Option<String>,
    pub item_id: Option<Uuid>,
    pub user_id: Uuid,
}

#[cfg(test)]
mod tests {
    use super::*;
    use scoring::{ConditionField, ConditionOperator, ConditionValue};

    fn rule_with_condition(condition: &str) -> Rule {
        Rule {
            id: Uuid::new_v4(),
            name: "High amount".to_string(),
            description: None,
            condition: condition.to_string(),
            score: 30,
            priority: 0,
            is_active: true,
            user_id: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn compiles_stored_condition() {
        let rule = rule_with_condition(r#"{"field":"amount","operator":">","value":5000}"#);
        let compiled = rule.compile();
        assert_eq!(compiled.score, 30);
        assert_eq!(compiled.condition.field, ConditionField::Amount);
        assert_eq!(compiled.condition.operator, ConditionOperator::GreaterThan);
        assert_eq!(compiled.condition.value, ConditionValue::Number(5000.0));
    }

    #[test]
    fn corrupt_condition_compiles_to_permissive_default() {
        let rule = rule_with_condition("{broken");
        assert_eq!(rule.compile().condition, RuleCondition::permissive_default());
    }
}
