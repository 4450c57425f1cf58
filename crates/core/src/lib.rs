pub mod catalog;
pub mod config;
pub mod domain;
pub mod errors;
pub mod format;

pub use domain::conversation::{filter_history, ConversationTurn, HistoryEntry, Role};
pub use domain::feature::{
    AnalysisMode, CustomerImpact, FeatureRequirements, FeatureRequirementsFields,
    FeatureRequirementsInput, TechSpec,
};
pub use domain::insight::{Insight, InsightFilters, InsightId, InsightStats, InsightSubmission};
pub use domain::request::{
    AdditionalInfo, ChurnRisk, CustomerDetails, CustomerTier, ImpactAssessment, Priority,
    RequestDetails, RequestMeta, RequestStatus, StructuredRequest, ValidationReport,
};
pub use domain::session::SessionKey;
pub use errors::{ApplicationError, DomainError, InterfaceError};
