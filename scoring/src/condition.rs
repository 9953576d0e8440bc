use metrics::counter;
use serde::{Deserialize, Serialize};
use strum_macros::Display as EnumDisplay;
use tracing::warn;

/// Item field a rule condition tests. Closed set; anything else is
/// rejected at authoring time and matches nothing at evaluation time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumDisplay)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ConditionField {
    Amount,
    Tags,
    Description,
    Status,
    Title,
}

impl ConditionField {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "amount" => Some(ConditionField::Amount),
            "tags" => Some(ConditionField::Tags),
            "description" => Some(ConditionField::Description),
            "status" => Some(ConditionField::Status),
            "title" => Some(ConditionField::Title),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConditionOperator {
    #[serde(rename = ">")]
    GreaterThan,
    #[serde(rename = ">=")]
    GreaterThanOrEqual,
    #[serde(rename = "<")]
    LessThan,
    #[serde(rename = "<=")]
    LessThanOrEqual,
    #[serde(rename = "==")]
    Equal,
    #[serde(rename = "includes")]
    Includes,
    #[serde(rename = "contains")]
    Contains,
}

impl ConditionOperator {
    pub fn token(&self) -> &'static str {
        match self {
            ConditionOperator::GreaterThan => ">",
            ConditionOperator::GreaterThanOrEqual => ">=",
            ConditionOperator::LessThan => "<",
            ConditionOperator::LessThanOrEqual => "<=",
            ConditionOperator::Equal => "==",
            ConditionOperator::Includes => "includes",
            ConditionOperator::Contains => "contains",
        }
    }

    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            ">" => Some(ConditionOperator::GreaterThan),
            ">=" => Some(ConditionOperator::GreaterThanOrEqual),
            "<" => Some(ConditionOperator::LessThan),
            "<=" => Some(ConditionOperator::LessThanOrEqual),
            "==" => Some(ConditionOperator::Equal),
            "includes" => Some(ConditionOperator::Includes),
            "contains" => Some(ConditionOperator::Contains),
            _ => None,
        }
    }
}

/// Condition value as persisted: a bare number or a string, interpreted
/// according to the condition's field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ConditionValue {
    Number(f64),
    Text(String),
}

impl ConditionValue {
    /// Numeric coercion. Text that does not parse as a number yields NaN,
    /// so every numeric comparison on it is false.
    pub fn as_number(&self) -> f64 {
        match self {
            ConditionValue::Number(n) => *n,
            ConditionValue::Text(s) => s.trim().parse().unwrap_or(f64::NAN),
        }
    }

    /// Textual coercion; numbers render in their display form.
    pub fn as_text(&self) -> String {
        match self {
            ConditionValue::Number(n) => n.to_string(),
            ConditionValue::Text(s) => s.clone(),
        }
    }
}

/// The atomic predicate a rule tests: one field, one operator, one value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleCondition {
    pub field: ConditionField,
    pub operator: ConditionOperator,
    pub value: ConditionValue,
}

impl RuleCondition {
    /// The substitute used when a persisted condition cannot be decoded:
    /// matches any item with a positive amount.
    pub fn permissive_default() -> Self {
        RuleCondition {
            field: ConditionField::Amount,
            operator: ConditionOperator::GreaterThan,
            value: ConditionValue::Number(0.0),
        }
    }

    /// Decode a persisted condition, substituting the permissive default on
    /// failure so a corrupt row never breaks scoring. The substitution
    /// silently changes the rule's semantics, so it is surfaced through a
    /// warning and the `rule_condition_decode_fallback_total` counter.
    pub fn decode_lenient(raw: &str) -> Self {
        match serde_json::from_str(raw) {
            Ok(condition) => condition,
            Err(err) => {
                warn!(
                    error = %err,
                    "stored rule condition is malformed, substituting permissive default"
                );
                counter!("rule_condition_decode_fallback_total").increment(1);
                RuleCondition::permissive_default()
            }
        }
    }
}
