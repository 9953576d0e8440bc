use scoring::{
    CompiledRule, ConditionField, ConditionOperator, ConditionValue, ItemStatus, RuleCondition,
    Subject,
};
use uuid::Uuid;

/// Minimal subject for engine tests; fields default to the engine's
/// documented coercion defaults.
pub struct TestItem {
    pub amount: f64,
    pub tags: Vec<String>,
    pub description: Option<String>,
    pub title: String,
    pub status: Option<ItemStatus>,
}

impl Default for TestItem {
    fn default() -> Self {
        Self {
            amount: 0.0,
            tags: Vec::new(),
            description: None,
            title: String::new(),
            status: None,
        }
    }
}

impl TestItem {
    pub fn with_amount(amount: f64) -> Self {
        Self {
            amount,
            ..Self::default()
        }
    }

    pub fn tagged(mut self, tags: &[&str]) -> Self {
        self.tags = tags.iter().map(|tag| tag.to_string()).collect();
        self
    }

    pub fn described(mut self, description: &str) -> Self {
        self.description = Some(description.to_string());
        self
    }

    pub fn titled(mut self, title: &str) -> Self {
        self.title = title.to_string();
        self
    }

    pub fn in_status(mut self, status: ItemStatus) -> Self {
        self.status = Some(status);
        self
    }
}

impl Subject for TestItem {
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
        self.status
    }
}

pub fn number_condition(
    field: ConditionField,
    operator: ConditionOperator,
    value: f64,
) -> RuleCondition {
    RuleCondition {
        field,
        operator,
        value: ConditionValue::Number(value),
    }
}

pub fn text_condition(
    field: ConditionField,
    operator: ConditionOperator,
    value: &str,
) -> RuleCondition {
    RuleCondition {
        field,
        operator,
        value: ConditionValue::Text(value.to_string()),
    }
}

pub fn active_rule(name: &str, score: i32, condition: RuleCondition) -> CompiledRule {
    CompiledRule {
        id: Uuid::new_v4(),
        name: name.to_string(),
        score,
        priority: 0,
        is_active: true,
        condition,
    }
}
