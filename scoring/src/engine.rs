use crate::condition::{ConditionField, ConditionOperator, RuleCondition};
use crate::model::{CompiledRule, Subject};

/// Compute the risk score for `subject` from the supplied rule set.
///
/// An empty rule set is not an error: it routes to the fallback heuristic
/// for backward compatibility with installations that never authored rules.
/// Otherwise the scores of all matching active rules are summed; no
/// short-circuiting, no ordering dependency. The result is clamped to
/// [0, 100].
pub fn evaluate<S: Subject + ?Sized>(rules: &[CompiledRule], subject: &S) -> i32 {
    if rules.is_empty() {
        return fallback_risk(subject);
    }

    let mut risk: i32 = 0;
    for rule in rules {
        // The source should only hand us active rules; skip stragglers anyway.
        if !rule.is_active {
            continue;
        }
        if condition_matches(&rule.condition, subject) {
            risk = risk.saturating_add(rule.score);
        }
    }

    risk.clamp(0, 100)
}

/// Evaluate one condition against the subject.
///
/// Coercions follow the documented defaults and this never errors: an
/// operator that makes no sense for the field is simply no match, since a
/// malformed stored condition must not break scoring.
pub fn condition_matches<S: Subject + ?Sized>(condition: &RuleCondition, subject: &S) -> bool {
    match condition.field {
        ConditionField::Amount => {
            let amount = subject.amount();
            let target = condition.value.as_number();
            match condition.operator {
                ConditionOperator::GreaterThan => amount > target,
                ConditionOperator::GreaterThanOrEqual => amount >= target,
                ConditionOperator::LessThan => amount < target,
                ConditionOperator::LessThanOrEqual => amount <= target,
                ConditionOperator::Equal => amount == target,
                _ => false,
            }
        }
        ConditionField::Tags => {
            // includes and contains behave identically for tags:
            // case-insensitive exact-or-substring membership.
            let needle = condition.value.as_text().to_lowercase();
            subject
                .tags()
                .iter()
                .map(|tag| tag.to_lowercase())
                .any(|tag| tag == needle || tag.contains(&needle))
        }
        ConditionField::Description | ConditionField::Title => {
            let text = match condition.field {
                ConditionField::Description => subject.description(),
                _ => subject.title(),
            }
            .to_lowercase();
            let needle = condition.value.as_text().to_lowercase();
            match condition.operator {
                ConditionOperator::Includes | ConditionOperator::Contains => {
                    text.contains(&needle)
                }
                _ => text == needle,
            }
        }
        ConditionField::Status => {
            // Exact and case-sensitive; the operator is ignored since only
            // equality is meaningful (the validator only admits == here).
            match subject.status() {
                Some(status) => status.as_str() == condition.value.as_text(),
                None => false,
            }
        }
    }
}

/// Fixed heuristic used when no active rules exist.
///
/// The steps mutate a running total in this exact order; "fraud" is an
/// absolute override of everything before it, but later steps still apply
/// on top of the override.
pub fn fallback_risk<S: Subject + ?Sized>(subject: &S) -> i32 {
    let amount = subject.amount();
    let mut risk: i32 = if amount > 10_000.0 {
        80
    } else if amount > 5_000.0 {
        50
    } else {
        20
    };

    let tags: Vec<String> = subject.tags().iter().map(|tag| tag.to_lowercase()).collect();
    if tags.iter().any(|tag| tag == "urgent") {
        risk += 20;
    }
    if tags.iter().any(|tag| tag == "fraud") {
        risk = 100;
    }
    if tags.iter().any(|tag| tag == "trusted") {
        risk -= 20;
    }

    let description = subject.description().to_lowercase();
    if description.contains("suspicious") {
        risk += 30;
    }
    if description.contains("verified") {
        risk -= 10;
    }

    risk.clamp(0, 100)
}
