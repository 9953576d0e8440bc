use async_trait::async_trait;
use metrics::counter;
use std::{error::Error, sync::Arc};
use tracing::{debug, warn};

use crate::engine::{evaluate, fallback_risk};
use crate::model::{CompiledRule, Subject};

/// Where active rules come from. Implementations return only rules with
/// `is_active = true`; ordering is irrelevant to the evaluated sum.
#[async_trait]
pub trait RuleSource: Send + Sync {
    async fn fetch_active_rules(&self)
    -> Result<Vec<CompiledRule>, Box<dyn Error + Send + Sync>>;
}

/// Scoring entry point for item mutation handlers: fetches the current
/// active rule snapshot and evaluates the subject against it.
#[derive(Clone)]
pub struct RiskScorer {
    source: Arc<dyn RuleSource>,
}

impl RiskScorer {
    pub fn new(source: Arc<dyn RuleSource>) -> Self {
        Self { source }
    }

    /// Compute the risk score in [0, 100] for `subject`.
    ///
    /// A failed rule fetch is treated like an empty rule set: the fallback
    /// heuristic scores the subject and the request keeps going. Scoring
    /// never fails.
    pub async fn calculate_risk<S: Subject + ?Sized>(&self, subject: &S) -> i32 {
        let rules = match self.source.fetch_active_rules().await {
            Ok(rules) => rules,
            Err(err) => {
                warn!(error = %err, "rule fetch failed, scoring with fallback heuristic");
                counter!("risk_fallback_heuristic_total").increment(1);
                return fallback_risk(subject);
            }
        };

        if rules.is_empty() {
            debug!("no active rules, scoring with fallback heuristic");
            counter!("risk_fallback_heuristic_total").increment(1);
        }

        evaluate(&rules, subject)
    }
}
