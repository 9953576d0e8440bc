use serde::{Deserialize, Serialize};
use strum_macros::{Display as EnumDisplay, EnumString};
use uuid::Uuid;

use crate::condition::RuleCondition;

/// Workflow status of a reviewed item. The wire form is the exact
/// SCREAMING_SNAKE token; status matching is case-sensitive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumDisplay, EnumString)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum ItemStatus {
    New,
    InReview,
    Approved,
    Rejected,
}

impl ItemStatus {
    pub const ALL: [ItemStatus; 4] = [
        ItemStatus::New,
        ItemStatus::InReview,
        ItemStatus::Approved,
        ItemStatus::Rejected,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ItemStatus::New => "NEW",
            ItemStatus::InReview => "IN_REVIEW",
            ItemStatus::Approved => "APPROVED",
            ItemStatus::Rejected => "REJECTED",
        }
    }
}

impl Default for ItemStatus {
    fn default() -> Self {
        ItemStatus::New
    }
}

/// Display bucket for a computed risk score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumDisplay)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum RiskLevel {
    High,
    Medium,
    Low,
    VeryLow,
}

impl RiskLevel {
    pub fn from_score(score: i32) -> Self {
        if score >= 80 {
            RiskLevel::High
        } else if score >= 50 {
            RiskLevel::Medium
        } else if score >= 20 {
            RiskLevel::Low
        } else {
            RiskLevel::VeryLow
        }
    }
}

/// Typed accessors over the record being scored.
///
/// Every accessor has a documented default so evaluation never fails on a
/// missing or oddly-typed field: 0.0 for a missing amount, an empty slice
/// for missing tags, "" for missing text, `None` for a missing status
/// (which never equals any condition value).
pub trait Subject {
    fn amount(&self) -> f64;
    fn tags(&self) -> &[String];
    fn description(&self) -> &str;
    fn title(&self) -> &str;
    fn status(&self) -> Option<ItemStatus>;
}

/// A rule ready for evaluation: decoded condition plus scoring metadata.
///
/// `priority` only orders rules for display; it has no effect on the
/// evaluated sum. Inactive rules are skipped even if present in the input.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledRule {
    pub id: Uuid,
    pub name: String,
    pub score: i32,
    pub priority: i32,
    pub is_active: bool,
    pub condition: RuleCondition,
}
