use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::lenient;

pub const UNTITLED_FEATURE: &str = "Untitled Feature";
const TEXT_TITLE_LIMIT: usize = 80;

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CustomerImpact {
    #[serde(deserialize_with = "lenient::count")]
    pub count: u64,
    #[serde(rename = "totalARR", deserialize_with = "lenient::amount")]
    pub total_arr: f64,
    #[serde(deserialize_with = "lenient::string")]
    pub urgency: String,
}

/// Object form of a hand-off payload, as emitted by the insights agent.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FeatureRequirementsFields {
    #[serde(deserialize_with = "lenient::string")]
    pub title: String,
    #[serde(deserialize_with = "lenient::string")]
    pub description: String,
    #[serde(deserialize_with = "lenient::string")]
    pub business_context: String,
    #[serde(deserialize_with = "lenient::string")]
    pub technical_requirements: String,
    #[serde(deserialize_with = "lenient::object")]
    pub customer_data: Option<CustomerImpact>,
}

/// A hand-off payload as received: either prose or a structured object.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum FeatureRequirementsInput {
    Text(String),
    Structured(FeatureRequirementsFields),
}

/// Canonical hand-off payload. Built once at the boundary so that downstream code
/// never has to care which shape arrived.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeatureRequirements {
    #[serde(flatten)]
    pub fields: FeatureRequirementsFields,
    /// Original prose when the payload arrived as text.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_text: Option<String>,
}

impl From<FeatureRequirementsInput> for FeatureRequirements {
    fn from(input: FeatureRequirementsInput) -> Self {
        match input {
            FeatureRequirementsInput::Structured(fields) => Self { fields, source_text: None },
            FeatureRequirementsInput::Text(text) => {
                let title = text
                    .lines()
                    .map(|line| line.trim().trim_start_matches('#').trim())
                    .find(|line| !line.is_empty())
                    .map(|line| line.chars().take(TEXT_TITLE_LIMIT).collect())
                    .unwrap_or_default();
                Self {
                    fields: FeatureRequirementsFields {
                        title,
                        description: text.trim().to_string(),
                        ..FeatureRequirementsFields::default()
                    },
                    source_text: Some(text),
                }
            }
        }
    }
}

impl From<FeatureRequirementsFields> for FeatureRequirements {
    fn from(fields: FeatureRequirementsFields) -> Self {
        Self { fields, source_text: None }
    }
}

impl FeatureRequirements {
    pub fn feature_title(&self) -> &str {
        let title = self.fields.title.trim();
        if title.is_empty() {
            UNTITLED_FEATURE
        } else {
            title
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisMode {
    Conversational,
    Autonomous,
}

/// A technical specification produced by an autonomous analysis, kept per session.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TechSpec {
    pub feature_title: String,
    pub requirements: FeatureRequirements,
    pub content: String,
    pub mode: AnalysisMode,
    pub created_at: DateTime<Utc>,
}
