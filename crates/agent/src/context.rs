//! Renders session state and catalog data into the text blocks folded into system prompts.

use std::collections::BTreeMap;
use std::fmt::Write as _;

use triad_core::catalog::codebase::{ARCHITECTURE_PATTERNS, COMPONENTS, PAST_IMPLEMENTATIONS};
use triad_core::domain::feature::FeatureRequirements;
use triad_core::domain::insight::{Insight, InsightStats};
use triad_core::format::usd;

pub const EMPTY_REPOSITORY: &str = "**Current Insights Repository:** Empty\n\n\
No customer insights have been submitted yet. Once CSMs submit feature requests, you'll be \
able to analyze patterns and provide strategic recommendations.";

pub fn format_insights_context(insights: &[Insight], stats: &InsightStats) -> String {
    if insights.is_empty() {
        return EMPTY_REPOSITORY.to_string();
    }

    let mut out = format!("**Current Insights Repository:** {} insight(s)\n\n", insights.len());

    out.push_str("**Summary Statistics:**\n");
    let _ = writeln!(out, "- Total Insights: {}", stats.total_insights);
    let _ = writeln!(out, "- Unique Customers: {}", stats.unique_customers);
    let _ = writeln!(out, "- Total ARR Represented: ${}", usd(stats.total_arr));
    let _ = writeln!(out, "- Total Revenue at Risk: ${}", usd(stats.total_revenue_at_risk));
    let _ = writeln!(out, "- High-Urgency Insights: {}\n", stats.high_urgency_count);

    push_breakdown(&mut out, "By Customer Tier", &stats.by_tier);
    push_breakdown(&mut out, "By Category", &stats.by_category);
    push_breakdown(&mut out, "By Priority", &stats.by_priority);

    out.push_str("**Individual Insights:**\n\n");
    for (index, insight) in insights.iter().enumerate() {
        push_insight(&mut out, index + 1, insight);
    }

    out
}

fn push_breakdown(out: &mut String, heading: &str, counts: &BTreeMap<String, usize>) {
    if counts.is_empty() {
        return;
    }
    let _ = writeln!(out, "**{heading}:**");
    for (label, count) in counts {
        let _ = writeln!(out, "- {label}: {count} insight(s)");
    }
    out.push('\n');
}

fn non_empty(value: &str) -> Option<&str> {
    let value = value.trim();
    (!value.is_empty()).then_some(value)
}

fn push_insight(out: &mut String, position: usize, insight: &Insight) {
    let customer = &insight.record.customer;
    let request = &insight.record.request;
    let impact = &insight.record.impact;

    let company = non_empty(&customer.company_name).unwrap_or("Unknown Company");
    let tier = customer.tier.map(|tier| tier.as_str()).unwrap_or("Unknown Tier");
    let _ = writeln!(out, "{position}. **{company}** ({tier}, ${} ARR)", usd(customer.arr));

    let headline = non_empty(&request.title)
        .or_else(|| non_empty(&request.description))
        .unwrap_or("No title");
    let _ = writeln!(out, "   - **Request:** {headline}");

    if let Some(category) = non_empty(&request.category) {
        let _ = writeln!(out, "   - **Category:** {category}");
    }
    if let Some(priority) = request.priority {
        let _ = writeln!(out, "   - **Priority:** {priority}");
    }
    if impact.revenue_at_risk > 0.0 {
        let _ = writeln!(out, "   - **Revenue at Risk:** ${}", usd(impact.revenue_at_risk));
    }
    if let Some(threat) = non_empty(&impact.competitive_threat) {
        let _ = writeln!(out, "   - **Competitive Threat:** {threat}");
    }
    if let Some(renewal) = non_empty(&customer.renewal_date) {
        let _ = writeln!(out, "   - **Renewal Date:** {renewal}");
    }
    if let Some(health) = non_empty(&customer.account_health) {
        let _ = writeln!(out, "   - **Account Health:** {health}");
    }
    if let Some(problem) = non_empty(&request.business_problem) {
        let _ = writeln!(out, "   - **Business Problem:** {problem}");
    }
    out.push('\n');
}

pub fn format_codebase_context() -> String {
    let mut out = String::from("### System Components\n\n");
    for component in COMPONENTS {
        let _ = writeln!(out, "**{}** ({})", component.name, component.path);
        let _ = writeln!(out, "- Description: {}", component.description);
        let _ = writeln!(out, "- Language: {}", component.language);
        let _ = writeln!(out, "- Dependencies: {}", component.dependencies.join(", "));
        let _ = writeln!(out, "- Performance: {}", component.performance);
        let _ = writeln!(out, "- Complexity: {}", component.complexity);
        let _ = writeln!(out, "- Limitations: {}", component.limitations);
        let _ = writeln!(out, "- Last Modified: {}\n", component.last_modified);
    }

    out.push_str("### Architecture Patterns\n\n");
    for pattern in ARCHITECTURE_PATTERNS {
        let _ = writeln!(out, "**{}**", pattern.pattern);
        let _ = writeln!(out, "- Usage: {}", pattern.usage);
        let _ = writeln!(out, "- Benefits: {}\n", pattern.benefits);
    }

    out.push_str("### Past Implementations (for reference)\n\n");
    for past in PAST_IMPLEMENTATIONS {
        let _ = writeln!(out, "**{}** ({})", past.feature_name, past.implementation_date);
        let _ = writeln!(out, "- Complexity: {}", past.complexity);
        let _ = writeln!(out, "- Time to Implement: {}", past.time_to_implement);
        let _ = writeln!(out, "- Approach: {}", past.approach);
        let _ = writeln!(out, "- Challenges: {}", past.challenges);
        let _ = writeln!(out, "- Success Metrics: {}\n", past.success_metrics);
    }

    out
}

/// User message that opens an autonomous analysis.
pub fn autonomous_request_prompt(requirements: &FeatureRequirements) -> String {
    let mut out = String::from(
        "Please analyze the following feature request and provide a complete technical specification:\n\n",
    );

    if let Some(text) = &requirements.source_text {
        out.push_str(text.trim());
        out.push_str("\n\n");
    } else {
        let fields = &requirements.fields;
        let feature = non_empty(&fields.title).or_else(|| non_empty(&fields.description));
        let _ = write!(out, "**Feature:** {}\n\n", feature.unwrap_or(requirements.feature_title()));

        if let Some(description) = non_empty(&fields.description) {
            if description != fields.title.trim() {
                let _ = write!(out, "**Description:** {description}\n\n");
            }
        }
        if let Some(context) = non_empty(&fields.business_context) {
            let _ = write!(out, "**Business Context:**\n{context}\n\n");
        }
        if let Some(technical) = non_empty(&fields.technical_requirements) {
            let _ = write!(out, "**Technical Requirements:**\n{technical}\n\n");
        }
        if let Some(impact) = &fields.customer_data {
            out.push_str("**Customer Impact:**\n");
            let _ = writeln!(out, "- Customer Count: {}", impact.count);
            let _ = writeln!(out, "- Total ARR: ${}", usd(impact.total_arr));
            if let Some(urgency) = non_empty(&impact.urgency) {
                let _ = writeln!(out, "- Urgency: {urgency}");
            }
            out.push('\n');
        }
    }

    out.push_str(
        "Provide a comprehensive technical specification following the autonomous analysis format.",
    );
    out
}
