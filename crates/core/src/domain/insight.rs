use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::lenient;
use crate::domain::request::{CustomerTier, Priority, StructuredRequest};
use crate::errors::DomainError;

pub const DEFAULT_SUBMITTER: &str = "CSM";

#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct InsightId(pub String);

impl InsightId {
    pub fn generate() -> Self {
        Self(format!("insight-{}", Uuid::new_v4().simple()))
    }
}

impl fmt::Display for InsightId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A structured request a CSM has handed over to product.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Insight {
    pub insight_id: InsightId,
    #[serde(flatten)]
    pub record: StructuredRequest,
    pub submitted_at: DateTime<Utc>,
    pub submitted_by: String,
}

/// Inbound insight payload; identity fields are optional and filled on submit.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InsightSubmission {
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub insight_id: Option<String>,
    #[serde(flatten)]
    pub record: StructuredRequest,
    #[serde(default, deserialize_with = "lenient::timestamp")]
    pub submitted_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub submitted_by: Option<String>,
}

impl InsightSubmission {
    pub fn from_record(record: StructuredRequest) -> Self {
        Self { record, ..Self::default() }
    }

    /// Fills missing identity fields and recomputes completeness.
    pub fn into_insight(self, now: DateTime<Utc>) -> Insight {
        let mut record = self.record;
        record.refresh_completeness();

        let insight_id = self
            .insight_id
            .filter(|id| !id.trim().is_empty())
            .map(InsightId)
            .unwrap_or_else(InsightId::generate);
        let submitted_by = self
            .submitted_by
            .filter(|name| !name.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_SUBMITTER.to_string());

        Insight { insight_id, record, submitted_at: self.submitted_at.unwrap_or(now), submitted_by }
    }
}

/// Checks the raw JSON shape before it is coerced into a record, so that an insight
/// without customer or request data is rejected instead of silently defaulted.
pub fn require_sections(raw: &serde_json::Value) -> Result<(), DomainError> {
    for section in ["customer", "request"] {
        if !raw.get(section).is_some_and(serde_json::Value::is_object) {
            return Err(DomainError::IncompleteInsight(section));
        }
    }
    Ok(())
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InsightFilters {
    pub tier: Option<CustomerTier>,
    pub priority: Option<Priority>,
    pub category: Option<String>,
    pub min_completeness: Option<u8>,
}

impl InsightFilters {
    pub fn matches(&self, insight: &Insight) -> bool {
        let record = &insight.record;
        if let Some(tier) = self.tier {
            if record.customer.tier != Some(tier) {
                return false;
            }
        }
        if let Some(priority) = self.priority {
            if record.request.priority != Some(priority) {
                return false;
            }
        }
        if let Some(category) = &self.category {
            if &record.request.category != category {
                return false;
            }
        }
        if let Some(min) = self.min_completeness {
            if record.meta.completeness < min {
                return false;
            }
        }
        true
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InsightStats {
    pub total_insights: usize,
    #[serde(rename = "totalARR")]
    pub total_arr: f64,
    pub total_revenue_at_risk: f64,
    pub unique_customers: usize,
    pub by_tier: BTreeMap<String, usize>,
    pub by_priority: BTreeMap<String, usize>,
    pub by_category: BTreeMap<String, usize>,
    pub high_urgency_count: usize,
}

impl InsightStats {
    pub fn from_insights<'a, I>(insights: I) -> Self
    where
        I: IntoIterator<Item = &'a Insight>,
    {
        let mut stats = Self::default();
        let mut customers = BTreeSet::new();

        for insight in insights {
            let record = &insight.record;
            stats.total_insights += 1;
            stats.total_arr += record.customer.arr;
            stats.total_revenue_at_risk += record.impact.revenue_at_risk;

            if !record.customer.company_name.trim().is_empty() {
                customers.insert(record.customer.company_name.as_str());
            }

            let tier = record.customer.tier.map(|tier| tier.as_str()).unwrap_or("Unknown");
            *stats.by_tier.entry(tier.to_string()).or_default() += 1;

            let priority = record.request.priority.map(|p| p.as_str()).unwrap_or("Unknown");
            *stats.by_priority.entry(priority.to_string()).or_default() += 1;

            let category = record.request.category.trim();
            let category = if category.is_empty() { "Uncategorized" } else { category };
            *stats.by_category.entry(category.to_string()).or_default() += 1;

            if record.request.priority.is_some_and(Priority::is_urgent) {
                stats.high_urgency_count += 1;
            }
        }

        stats.unique_customers = customers.len();
        stats
    }
}
