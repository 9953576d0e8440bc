use scoring::{
    ConditionField, ConditionOperator, ConditionValue, ValidationError, validate_condition,
    validate_rule_draft,
};

#[test]
fn test_accepts_every_numeric_operator_for_amount() {
    for operator in [">", ">=", "<", "<=", "=="] {
        let raw = format!(r#"{{"field":"amount","operator":"{}","value":5000}}"#, operator);
        let condition = validate_condition(&raw).unwrap();
        assert_eq!(condition.field, ConditionField::Amount);
        assert_eq!(condition.value, ConditionValue::Number(5000.0));
    }
}

#[test]
fn test_rejects_text_operator_for_amount() {
    let err = validate_condition(r#"{"field":"amount","operator":"includes","value":5}"#)
        .unwrap_err();
    assert_eq!(
        err,
        ValidationError::OperatorNotAllowed {
            field: ConditionField::Amount,
            allowed: ">, >=, <, <=, ==",
        }
    );
    // the rejection names the operators the field does allow
    assert!(err.to_string().contains(">, >=, <, <=, =="));
}

#[test]
fn test_rejects_non_numeric_amount_value() {
    let err =
        validate_condition(r#"{"field":"amount","operator":">","value":"high"}"#).unwrap_err();
    assert_eq!(err, ValidationError::NonNumericValue);
}

#[test]
fn test_accepts_tags_contains() {
    let condition =
        validate_condition(r#"{"field":"tags","operator":"contains","value":"urgent"}"#).unwrap();
    assert_eq!(condition.field, ConditionField::Tags);
    assert_eq!(condition.operator, ConditionOperator::Contains);
}

#[test]
fn test_rejects_equality_on_tags() {
    let err =
        validate_condition(r#"{"field":"tags","operator":"==","value":"urgent"}"#).unwrap_err();
    assert_eq!(
        err,
        ValidationError::OperatorNotAllowed {
            field: ConditionField::Tags,
            allowed: "includes, contains",
        }
    );
}

#[test]
fn test_accepts_equality_on_description_and_title() {
    for field in ["description", "title"] {
        let raw = format!(r#"{{"field":"{}","operator":"==","value":"wire"}}"#, field);
        assert!(validate_condition(&raw).is_ok());
    }
}

#[test]
fn test_rejects_numeric_operator_on_title() {
    let err = validate_condition(r#"{"field":"title","operator":">","value":"wire"}"#).unwrap_err();
    assert_eq!(
        err,
        ValidationError::OperatorNotAllowed {
            field: ConditionField::Title,
            allowed: "includes, contains, ==",
        }
    );
}

#[test]
fn test_rejects_empty_text_value() {
    let err =
        validate_condition(r#"{"field":"description","operator":"contains","value":"  "}"#)
            .unwrap_err();
    assert_eq!(err, ValidationError::EmptyValue(ConditionField::Description));
}

#[test]
fn test_accepts_known_status() {
    for status in ["NEW", "IN_REVIEW", "APPROVED", "REJECTED"] {
        let raw = format!(r#"{{"field":"status","operator":"==","value":"{}"}}"#, status);
        assert!(validate_condition(&raw).is_ok());
    }
}

#[test]
fn test_rejects_unknown_status() {
    let err =
        validate_condition(r#"{"field":"status","operator":"==","value":"CLOSED"}"#).unwrap_err();
    assert_eq!(err, ValidationError::UnknownStatus("CLOSED".to_string()));
}

#[test]
fn test_rejects_lowercase_status() {
    let err =
        validate_condition(r#"{"field":"status","operator":"==","value":"approved"}"#).unwrap_err();
    assert_eq!(err, ValidationError::UnknownStatus("approved".to_string()));
}

#[test]
fn test_rejects_non_equality_operator_for_status() {
    let err =
        validate_condition(r#"{"field":"status","operator":"contains","value":"NEW"}"#)
            .unwrap_err();
    assert_eq!(
        err,
        ValidationError::OperatorNotAllowed {
            field: ConditionField::Status,
            allowed: "==",
        }
    );
}

#[test]
fn test_rejects_unknown_field() {
    let err =
        validate_condition(r#"{"field":"country","operator":"==","value":"DE"}"#).unwrap_err();
    assert_eq!(err, ValidationError::UnknownField("country".to_string()));
}

#[test]
fn test_rejects_malformed_condition() {
    assert_eq!(
        validate_condition("{not json").unwrap_err(),
        ValidationError::MalformedCondition
    );
    assert_eq!(
        validate_condition(r#""just a string""#).unwrap_err(),
        ValidationError::MalformedCondition
    );
}

#[test]
fn test_missing_keys_are_reported_against_the_legality_table() {
    // no field key behaves like an unknown (empty) field name
    assert_eq!(
        validate_condition(r#"{"operator":">","value":1}"#).unwrap_err(),
        ValidationError::UnknownField(String::new())
    );
    // no operator key is an illegal operator for the field
    assert!(matches!(
        validate_condition(r#"{"field":"amount","value":1}"#).unwrap_err(),
        ValidationError::OperatorNotAllowed { .. }
    ));
}

#[test]
fn test_rule_draft_requires_a_name() {
    let raw = r#"{"field":"tags","operator":"contains","value":"urgent"}"#;
    assert_eq!(
        validate_rule_draft("  ", raw).unwrap_err(),
        ValidationError::EmptyName
    );
    assert!(validate_rule_draft("Urgent tag", raw).is_ok());
}
