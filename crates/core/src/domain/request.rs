use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::lenient;
use crate::format::usd;

/// Number of fields that contribute to [`StructuredRequest::completeness`].
pub const TRACKED_FIELD_COUNT: usize = 17;

macro_rules! labelled_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $label:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub enum $name {
            $(#[serde(rename = $label)] $variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(self) -> &'static str {
                match self {
                    $($name::$variant => $label),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = String;

            fn from_str(value: &str) -> Result<Self, Self::Err> {
                let wanted = value.trim();
                $name::ALL
                    .iter()
                    .copied()
                    .find(|candidate| candidate.as_str().eq_ignore_ascii_case(wanted))
                    .ok_or_else(|| format!("unknown {} `{wanted}`", stringify!($name)))
            }
        }
    };
}

labelled_enum!(CustomerTier {
    Enterprise => "Enterprise",
    Growth => "Growth",
    Startup => "Startup",
});

labelled_enum!(Priority {
    Low => "low",
    Medium => "medium",
    High => "high",
    Critical => "critical",
});

labelled_enum!(ChurnRisk {
    NoRisk => "none",
    Low => "low",
    Medium => "medium",
    High => "high",
});

labelled_enum!(RequestStatus {
    Draft => "draft",
    Pending => "pending",
    Submitted => "submitted",
});

impl Priority {
    pub fn is_urgent(self) -> bool {
        matches!(self, Self::High | Self::Critical)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CustomerDetails {
    #[serde(deserialize_with = "lenient::string")]
    pub company_name: String,
    #[serde(with = "lenient::label")]
    pub tier: Option<CustomerTier>,
    #[serde(deserialize_with = "lenient::amount")]
    pub arr: f64,
    #[serde(deserialize_with = "lenient::string")]
    pub renewal_date: String,
    #[serde(deserialize_with = "lenient::string")]
    pub contact_person: String,
    #[serde(deserialize_with = "lenient::string")]
    pub contact_email: String,
    /// healthy, at-risk or expanding; kept as text because CSMs use their own wording.
    #[serde(deserialize_with = "lenient::string")]
    pub account_health: String,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RequestDetails {
    #[serde(deserialize_with = "lenient::string")]
    pub title: String,
    #[serde(deserialize_with = "lenient::string")]
    pub description: String,
    #[serde(deserialize_with = "lenient::string")]
    pub business_problem: String,
    #[serde(deserialize_with = "lenient::string")]
    pub use_case: String,
    #[serde(with = "lenient::label")]
    pub priority: Option<Priority>,
    #[serde(deserialize_with = "lenient::string")]
    pub deadline: String,
    #[serde(deserialize_with = "lenient::string")]
    pub category: String,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ImpactAssessment {
    #[serde(deserialize_with = "lenient::count")]
    pub users_affected: u64,
    #[serde(deserialize_with = "lenient::amount")]
    pub revenue_at_risk: f64,
    #[serde(deserialize_with = "lenient::string")]
    pub competitive_threat: String,
    #[serde(with = "lenient::label")]
    pub churn_risk: Option<ChurnRisk>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AdditionalInfo {
    #[serde(deserialize_with = "lenient::string_list")]
    pub similar_requests: Vec<String>,
    #[serde(deserialize_with = "lenient::string")]
    pub current_workaround: String,
    #[serde(deserialize_with = "lenient::flag")]
    pub beta_testing: bool,
    #[serde(deserialize_with = "lenient::amount")]
    pub custom_budget: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RequestMeta {
    #[serde(deserialize_with = "lenient::timestamp")]
    pub request_date: Option<DateTime<Utc>>,
    #[serde(deserialize_with = "lenient::string")]
    pub csm_name: String,
    /// Derived by [`StructuredRequest::refresh_completeness`]; inbound values are ignored.
    #[serde(skip_deserializing)]
    pub completeness: u8,
    #[serde(deserialize_with = "status_or_draft")]
    pub status: RequestStatus,
}

impl Default for RequestMeta {
    fn default() -> Self {
        Self { request_date: None, csm_name: String::new(), completeness: 0, status: RequestStatus::Draft }
    }
}

fn status_or_draft<'de, D>(deserializer: D) -> Result<RequestStatus, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let status: Option<RequestStatus> = lenient::label::deserialize(deserializer)?;
    Ok(status.unwrap_or(RequestStatus::Draft))
}

/// The feature request a CSM builds up over an intake conversation.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StructuredRequest {
    pub customer: CustomerDetails,
    pub request: RequestDetails,
    pub impact: ImpactAssessment,
    pub additional: AdditionalInfo,
    pub meta: RequestMeta,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationReport {
    pub is_valid: bool,
    pub missing_fields: Vec<String>,
}

fn text_filled(value: &str) -> bool {
    !value.trim().is_empty()
}

fn amount_filled(value: f64) -> bool {
    value != 0.0
}

impl StructuredRequest {
    /// Empty draft stamped with `now`.
    pub fn template(now: DateTime<Utc>) -> Self {
        let mut request = Self::default();
        request.meta.request_date = Some(now);
        request
    }

    /// The fields that count toward completeness, in schema order.
    pub fn tracked_fields(&self) -> [(&'static str, bool); TRACKED_FIELD_COUNT] {
        let customer = &self.customer;
        let request = &self.request;
        let impact = &self.impact;
        [
            ("customer.companyName", text_filled(&customer.company_name)),
            ("customer.tier", customer.tier.is_some()),
            ("customer.arr", amount_filled(customer.arr)),
            ("customer.renewalDate", text_filled(&customer.renewal_date)),
            ("customer.contactPerson", text_filled(&customer.contact_person)),
            ("customer.accountHealth", text_filled(&customer.account_health)),
            ("request.title", text_filled(&request.title)),
            ("request.description", text_filled(&request.description)),
            ("request.businessProblem", text_filled(&request.business_problem)),
            ("request.useCase", text_filled(&request.use_case)),
            ("request.priority", request.priority.is_some()),
            ("request.deadline", text_filled(&request.deadline)),
            ("request.category", text_filled(&request.category)),
            ("impact.usersAffected", impact.users_affected != 0),
            ("impact.revenueAtRisk", amount_filled(impact.revenue_at_risk)),
            ("impact.competitiveThreat", text_filled(&impact.competitive_threat)),
            ("impact.churnRisk", impact.churn_risk.is_some()),
        ]
    }

    pub fn completeness(&self) -> u8 {
        let filled = self.tracked_fields().iter().filter(|(_, filled)| *filled).count();
        ((filled as f64 * 100.0) / TRACKED_FIELD_COUNT as f64).round() as u8
    }

    pub fn refresh_completeness(&mut self) -> u8 {
        self.meta.completeness = self.completeness();
        self.meta.completeness
    }

    /// Checks the fields product needs before an insight is actionable.
    ///
    /// `impact.revenueAtRisk` is required to be present, and a typed amount always is, so it
    /// never shows up in the missing list.
    pub fn validate(&self) -> ValidationReport {
        let required = [
            ("customer.companyName", text_filled(&self.customer.company_name)),
            ("customer.tier", self.customer.tier.is_some()),
            ("request.description", text_filled(&self.request.description)),
            ("request.businessProblem", text_filled(&self.request.business_problem)),
            ("request.priority", self.request.priority.is_some()),
            ("impact.churnRisk", self.impact.churn_risk.is_some()),
        ];
        let missing_fields: Vec<String> = required
            .iter()
            .filter(|(_, present)| !present)
            .map(|(path, _)| (*path).to_string())
            .collect();

        ValidationReport { is_valid: missing_fields.is_empty(), missing_fields }
    }

    /// Markdown recap shown to the CSM next to the agent reply.
    pub fn summary(&self) -> String {
        let customer = &self.customer;
        let request = &self.request;
        let impact = &self.impact;
        let validation = self.validate();

        let mut out = String::from("**Feature Request Summary**\n\n");

        let company = if text_filled(&customer.company_name) {
            customer.company_name.as_str()
        } else {
            "Unknown customer"
        };
        out.push_str(&format!("**Customer:** {company}"));
        if let Some(tier) = customer.tier {
            out.push_str(&format!(" ({tier})"));
        }
        if amount_filled(customer.arr) {
            out.push_str(&format!(" - ${} ARR", usd(customer.arr)));
        }
        out.push('\n');
        if text_filled(&customer.renewal_date) {
            out.push_str(&format!("**Renewal:** {}\n", customer.renewal_date));
        }
        if text_filled(&customer.account_health) {
            out.push_str(&format!("**Account Health:** {}\n", customer.account_health));
        }

        let headline = [&request.title, &request.description]
            .into_iter()
            .find(|value| text_filled(value))
            .map(String::as_str)
            .unwrap_or("Not yet captured");
        out.push_str(&format!("**Request:** {headline}\n"));
        if text_filled(&request.business_problem) {
            out.push_str(&format!("**Business Problem:** {}\n", request.business_problem));
        }
        if let Some(priority) = request.priority {
            out.push_str(&format!("**Priority:** {priority}\n"));
        }
        if text_filled(&request.category) {
            out.push_str(&format!("**Category:** {}\n", request.category));
        }
        if text_filled(&request.deadline) {
            out.push_str(&format!("**Deadline:** {}\n", request.deadline));
        }

        if impact.users_affected > 0 {
            out.push_str(&format!("**Users Affected:** {}\n", impact.users_affected));
        }
        if amount_filled(impact.revenue_at_risk) {
            out.push_str(&format!("**Revenue at Risk:** ${}\n", usd(impact.revenue_at_risk)));
        }
        if let Some(churn) = impact.churn_risk {
            out.push_str(&format!("**Churn Risk:** {churn}\n"));
        }
        if text_filled(&impact.competitive_threat) {
            out.push_str(&format!("**Competitive Threat:** {}\n", impact.competitive_threat));
        }
        if !self.additional.similar_requests.is_empty() {
            out.push_str(&format!(
                "**Similar Requests:** {}\n",
                self.additional.similar_requests.join(", ")
            ));
        }

        out.push_str(&format!("\n**Completeness:** {}%\n", self.completeness()));
        if !validation.is_valid {
            out.push_str(&format!("**Still needed:** {}\n", validation.missing_fields.join(", ")));
        }

        out
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::{ChurnRisk, CustomerTier, Priority, RequestStatus, StructuredRequest};

    fn named_enterprise() -> StructuredRequest {
        let mut record = StructuredRequest::template(Utc::now());
        record.customer.company_name = "Acme Corp".to_string();
        record.customer.tier = Some(CustomerTier::Enterprise);
        record
    }

    #[test]
    fn empty_template_scores_zero() {
        let record = StructuredRequest::template(Utc::now());
        assert_eq!(record.completeness(), 0);
        assert_eq!(record.meta.status, RequestStatus::Draft);
    }

    #[test]
    fn company_name_and_tier_score_twelve() {
        let mut record = named_enterprise();
        assert_eq!(record.refresh_completeness(), 12);
        assert_eq!(record.meta.completeness, 12);
    }

    #[test]
    fn fully_filled_record_scores_one_hundred() {
        let mut record = named_enterprise();
        record.customer.arr = 150_000.0;
        record.customer.renewal_date = "2025-03-15".to_string();
        record.customer.contact_person = "Sarah Johnson".to_string();
        record.customer.account_health = "at-risk".to_string();
        record.request.title = "Bulk export".to_string();
        record.request.description = "Export 200 reports at once".to_string();
        record.request.business_problem = "Manual exports take hours".to_string();
        record.request.use_case = "Month-end reporting".to_string();
        record.request.priority = Some(Priority::High);
        record.request.deadline = "Q1".to_string();
        record.request.category = "Export".to_string();
        record.impact.users_affected = 40;
        record.impact.revenue_at_risk = 150_000.0;
        record.impact.competitive_threat = "Competitor X".to_string();
        record.impact.churn_risk = Some(ChurnRisk::High);

        assert_eq!(record.completeness(), 100);
        assert!(record.validate().is_valid);
    }

    #[test]
    fn contact_email_and_additional_fields_do_not_count() {
        let mut record = StructuredRequest::template(Utc::now());
        record.customer.contact_email = "ops@acme.test".to_string();
        record.additional.beta_testing = true;
        record.additional.custom_budget = 5_000.0;
        record.additional.similar_requests = vec!["req-001".to_string()];

        assert_eq!(record.completeness(), 0);
    }

    #[test]
    fn validation_lists_exactly_the_missing_required_paths() {
        let mut record = StructuredRequest::template(Utc::now());
        record.customer.company_name = "Acme Corp".to_string();
        record.request.description = "Bulk export".to_string();
        record.request.business_problem = "Manual exports".to_string();
        record.request.priority = Some(Priority::Critical);

        let report = record.validate();
        assert!(!report.is_valid);
        assert_eq!(report.missing_fields, vec!["customer.tier", "impact.churnRisk"]);
    }

    #[test]
    fn enums_parse_case_insensitively_and_unknown_labels_become_unset() {
        let record: StructuredRequest = serde_json::from_str(
            r#"{
                "customer": {"companyName": "Acme Corp", "tier": "enterprise", "arr": "$150,000"},
                "request": {"priority": "URGENT"},
                "impact": {"churnRisk": "High"},
                "meta": {"completeness": 99, "status": "bogus"}
            }"#,
        )
        .expect("record should parse");

        assert_eq!(record.customer.tier, Some(CustomerTier::Enterprise));
        assert_eq!(record.customer.arr, 150_000.0);
        assert_eq!(record.request.priority, None);
        assert_eq!(record.impact.churn_risk, Some(ChurnRisk::High));
        assert_eq!(record.meta.completeness, 0, "inbound completeness is ignored");
        assert_eq!(record.meta.status, RequestStatus::Draft);
    }

    #[test]
    fn unset_enums_serialize_as_empty_labels() {
        let json = serde_json::to_value(StructuredRequest::default()).expect("serialize");
        assert_eq!(json["customer"]["tier"], "");
        assert_eq!(json["request"]["priority"], "");
        assert_eq!(json["impact"]["churnRisk"], "");
        assert_eq!(json["meta"]["status"], "draft");
    }

    #[test]
    fn summary_reports_completeness_and_missing_fields() {
        let mut record = named_enterprise();
        record.customer.arr = 150_000.0;
        let summary = record.summary();

        assert!(summary.contains("**Customer:** Acme Corp (Enterprise) - $150,000 ARR"));
        assert!(summary.contains("**Request:** Not yet captured"));
        assert!(summary.contains("**Completeness:** 18%"));
        assert!(summary.contains("request.description"));
    }
}
