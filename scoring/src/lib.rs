pub mod condition;
pub mod engine;
pub mod model;
pub mod scorer;
pub mod validate;

pub use condition::{ConditionField, ConditionOperator, ConditionValue, RuleCondition};
pub use engine::{condition_matches, evaluate, fallback_risk};
pub use model::{CompiledRule, ItemStatus, RiskLevel, Subject};
pub use scorer::{RiskScorer, RuleSource};
pub use validate::{ValidationError, validate_condition, validate_rule_draft};
