use serde_json::Value;
use thiserror::Error;

use crate::condition::{ConditionField, ConditionOperator, ConditionValue, RuleCondition};
use crate::model::ItemStatus;

/// Rejection raised when a proposed rule fails the authoring-time checks.
/// This is the only user-visible error the scoring core produces; the
/// evaluation path never errors.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("condition must be a valid JSON object")]
    MalformedCondition,
    #[error("invalid field `{0}`; valid fields: amount, tags, description, status, title")]
    UnknownField(String),
    #[error("field `{field}` allows operators: {allowed}")]
    OperatorNotAllowed {
        field: ConditionField,
        allowed: &'static str,
    },
    #[error("amount conditions require a numeric value")]
    NonNumericValue,
    #[error("status value must be NEW, IN_REVIEW, APPROVED or REJECTED, got `{0}`")]
    UnknownStatus(String),
    #[error("field `{0}` requires a non-empty text value")]
    EmptyValue(ConditionField),
    #[error("rule name must not be empty")]
    EmptyName,
}

fn allowed_operators(field: ConditionField) -> &'static [ConditionOperator] {
    use crate::condition::ConditionOperator::*;
    match field {
        ConditionField::Amount => &[GreaterThan, GreaterThanOrEqual, LessThan, LessThanOrEqual, Equal],
        ConditionField::Tags => &[Includes, Contains],
        ConditionField::Description | ConditionField::Title => &[Includes, Contains, Equal],
        ConditionField::Status => &[Equal],
    }
}

fn allowed_operator_tokens(field: ConditionField) -> &'static str {
    match field {
        ConditionField::Amount => ">, >=, <, <=, ==",
        ConditionField::Tags => "includes, contains",
        ConditionField::Description | ConditionField::Title => "includes, contains, ==",
        ConditionField::Status => "==",
    }
}

/// Validate a raw (serialized) condition against the field/operator/value
/// legality table, returning the typed condition on success.
///
/// Unlike [`RuleCondition::decode_lenient`], a malformed condition is a hard
/// rejection here: nothing is defaulted at authoring time.
pub fn validate_condition(raw: &str) -> Result<RuleCondition, ValidationError> {
    let parsed: Value =
        serde_json::from_str(raw).map_err(|_| ValidationError::MalformedCondition)?;
    let object = parsed
        .as_object()
        .ok_or(ValidationError::MalformedCondition)?;

    let field_name = object
        .get("field")
        .and_then(Value::as_str)
        .unwrap_or_default();
    let field = ConditionField::from_name(field_name)
        .ok_or_else(|| ValidationError::UnknownField(field_name.to_string()))?;

    let operator_token = object
        .get("operator")
        .and_then(Value::as_str)
        .unwrap_or_default();
    let operator = ConditionOperator::from_token(operator_token)
        .filter(|operator| allowed_operators(field).contains(operator))
        .ok_or(ValidationError::OperatorNotAllowed {
            field,
            allowed: allowed_operator_tokens(field),
        })?;

    let raw_value = object.get("value").unwrap_or(&Value::Null);
    let value = match field {
        ConditionField::Amount => ConditionValue::Number(
            raw_value.as_f64().ok_or(ValidationError::NonNumericValue)?,
        ),
        ConditionField::Status => {
            let text = raw_value.as_str().unwrap_or_default();
            if text.parse::<ItemStatus>().is_err() {
                return Err(ValidationError::UnknownStatus(text.to_string()));
            }
            ConditionValue::Text(text.to_string())
        }
        ConditionField::Tags | ConditionField::Description | ConditionField::Title => {
            let text = raw_value.as_str().unwrap_or_default();
            if text.trim().is_empty() {
                return Err(ValidationError::EmptyValue(field));
            }
            ConditionValue::Text(text.to_string())
        }
    };

    Ok(RuleCondition {
        field,
        operator,
        value,
    })
}

/// Authoring-time gate for rule create and update requests: a non-empty
/// name plus a legal condition. The score is not range-checked; negative
/// scores are legitimate discounts.
pub fn validate_rule_draft(name: &str, raw_condition: &str) -> Result<RuleCondition, ValidationError> {
    if name.trim().is_empty() {
        return Err(ValidationError::EmptyName);
    }
    validate_condition(raw_condition)
}
