use serde::Serialize;

use crate::domain::request::{CustomerTier, Priority};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum HistoricalStatus {
    Pending,
    InProgress,
    Completed,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoricalRequest {
    pub id: &'static str,
    pub customer_id: &'static str,
    pub customer_segment: CustomerTier,
    pub request_date: &'static str,
    pub description: &'static str,
    pub category: &'static str,
    pub status: HistoricalStatus,
    pub priority: Priority,
    pub revenue_at_risk: f64,
    pub urgency: &'static str,
    pub competitor_mention: Option<&'static str>,
    pub estimated_volume: &'static str,
    pub business_impact: &'static str,
    pub resolution: Option<Resolution>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Resolution {
    pub implementation_date: &'static str,
    pub notes: &'static str,
}

pub const REQUESTS: &[HistoricalRequest] = &[
    HistoricalRequest {
        id: "req-001",
        customer_id: "cust-001",
        customer_segment: CustomerTier::Enterprise,
        request_date: "2024-09-15",
        description: "Bulk export functionality for reports",
        category: "Export",
        status: HistoricalStatus::Pending,
        priority: Priority::High,
        revenue_at_risk: 150_000.0,
        urgency: "Contract renewal in 60 days",
        competitor_mention: Some("Competitor X offers this feature"),
        estimated_volume: "200+ reports per month",
        business_impact: "Critical for workflow efficiency",
        resolution: None,
    },
    HistoricalRequest {
        id: "req-002",
        customer_id: "cust-003",
        customer_segment: CustomerTier::Enterprise,
        request_date: "2024-10-22",
        description: "SSO integration with Okta",
        category: "Authentication",
        status: HistoricalStatus::InProgress,
        priority: Priority::High,
        revenue_at_risk: 100_000.0,
        urgency: "Blocking expansion deal",
        competitor_mention: None,
        estimated_volume: "1200 users",
        business_impact: "Required for enterprise security compliance",
        resolution: None,
    },
    HistoricalRequest {
        id: "req-003",
        customer_id: "cust-005",
        customer_segment: CustomerTier::Growth,
        request_date: "2024-08-10",
        description: "Advanced filtering in dashboard",
        category: "UI Enhancement",
        status: HistoricalStatus::Completed,
        priority: Priority::Medium,
        revenue_at_risk: 0.0,
        urgency: "Quality of life improvement",
        competitor_mention: None,
        estimated_volume: "All users",
        business_impact: "Improves user productivity",
        resolution: Some(Resolution {
            implementation_date: "2024-11-05",
            notes: "Implemented with custom filter builder",
        }),
    },
    HistoricalRequest {
        id: "req-004",
        customer_id: "cust-004",
        customer_segment: CustomerTier::Growth,
        request_date: "2024-07-18",
        description: "API rate limit increase",
        category: "API",
        status: HistoricalStatus::Completed,
        priority: Priority::High,
        revenue_at_risk: 75_000.0,
        urgency: "Service degradation occurring",
        competitor_mention: None,
        estimated_volume: "10,000 requests/hour needed",
        business_impact: "Preventing service disruption",
        resolution: Some(Resolution {
            implementation_date: "2024-08-01",
            notes: "Upgraded tier with custom rate limits",
        }),
    },
    HistoricalRequest {
        id: "req-005",
        customer_id: "cust-006",
        customer_segment: CustomerTier::Enterprise,
        request_date: "2024-09-25",
        description: "Custom branding options",
        category: "Customization",
        status: HistoricalStatus::Pending,
        priority: Priority::Medium,
        revenue_at_risk: 0.0,
        urgency: "Nice to have for Q1",
        competitor_mention: None,
        estimated_volume: "White-label interface",
        business_impact: "Brand consistency for client-facing reports",
        resolution: None,
    },
    HistoricalRequest {
        id: "req-006",
        customer_id: "cust-002",
        customer_segment: CustomerTier::Startup,
        request_date: "2024-06-12",
        description: "Webhook notifications for events",
        category: "Integration",
        status: HistoricalStatus::Completed,
        priority: Priority::Medium,
        revenue_at_risk: 0.0,
        urgency: "Automation requirement",
        competitor_mention: None,
        estimated_volume: "100 events/day",
        business_impact: "Enable workflow automation",
        resolution: Some(Resolution {
            implementation_date: "2024-09-20",
            notes: "Built event notification system with webhook support",
        }),
    },
    HistoricalRequest {
        id: "req-007",
        customer_id: "cust-007",
        customer_segment: CustomerTier::Growth,
        request_date: "2024-10-05",
        description: "HIPAA compliance features",
        category: "Compliance",
        status: HistoricalStatus::InProgress,
        priority: Priority::Critical,
        revenue_at_risk: 60_000.0,
        urgency: "Required for healthcare clients",
        competitor_mention: None,
        estimated_volume: "All healthcare segment",
        business_impact: "Market expansion requirement",
        resolution: None,
    },
    HistoricalRequest {
        id: "req-008",
        customer_id: "cust-001",
        customer_segment: CustomerTier::Enterprise,
        request_date: "2024-05-20",
        description: "Scheduled report generation",
        category: "Export",
        status: HistoricalStatus::Completed,
        priority: Priority::High,
        revenue_at_risk: 0.0,
        urgency: "Operational efficiency",
        competitor_mention: None,
        estimated_volume: "Daily/weekly schedules",
        business_impact: "Reduces manual work",
        resolution: Some(Resolution {
            implementation_date: "2024-07-15",
            notes: "Built scheduler with cron-based triggers",
        }),
    },
    HistoricalRequest {
        id: "req-009",
        customer_id: "cust-005",
        customer_segment: CustomerTier::Growth,
        request_date: "2024-11-01",
        description: "Multi-language support",
        category: "Localization",
        status: HistoricalStatus::Pending,
        priority: Priority::Low,
        revenue_at_risk: 0.0,
        urgency: "Future expansion",
        competitor_mention: None,
        estimated_volume: "Spanish, French, German",
        business_impact: "International market expansion",
        resolution: None,
    },
    HistoricalRequest {
        id: "req-010",
        customer_id: "cust-008",
        customer_segment: CustomerTier::Startup,
        request_date: "2024-09-30",
        description: "Mobile app development",
        category: "Platform",
        status: HistoricalStatus::Pending,
        priority: Priority::Low,
        revenue_at_risk: 0.0,
        urgency: "Long-term strategic",
        competitor_mention: Some("Competitors have mobile apps"),
        estimated_volume: "iOS and Android",
        business_impact: "Mobile-first user access",
        resolution: None,
    },
];

const STOP_WORDS: &[&str] = &[
    "about", "after", "also", "been", "could", "customer", "from", "have", "into", "like", "need",
    "needs", "only", "should", "that", "their", "them", "they", "this", "want", "wants", "were",
    "what", "when", "which", "with", "would", "your",
];

pub fn requests_by_category(category: &str) -> impl Iterator<Item = &'static HistoricalRequest> + '_ {
    REQUESTS.iter().filter(move |request| request.category == category)
}

pub fn requests_by_status(status: HistoricalStatus) -> impl Iterator<Item = &'static HistoricalRequest> {
    REQUESTS.iter().filter(move |request| request.status == status)
}

pub fn high_priority_requests() -> impl Iterator<Item = &'static HistoricalRequest> {
    REQUESTS.iter().filter(|request| request.priority.is_urgent())
}

/// Revenue at risk across requests that have not been picked up yet.
pub fn pending_revenue_at_risk() -> f64 {
    requests_by_status(HistoricalStatus::Pending).map(|request| request.revenue_at_risk).sum()
}

fn keywords(text: &str) -> Vec<String> {
    text.split(|ch: char| !ch.is_alphanumeric())
        .map(str::to_lowercase)
        .filter(|word| word.len() >= 4 && !STOP_WORDS.contains(&word.as_str()))
        .collect()
}

/// Historical requests sharing vocabulary with `text`, most overlapping first.
///
/// Plural forms are folded so that "reports" matches "report". Ties keep catalog order.
pub fn similar_requests(text: &str) -> Vec<&'static HistoricalRequest> {
    let wanted: Vec<String> = keywords(text).iter().map(|word| stem(word)).collect();
    if wanted.is_empty() {
        return Vec::new();
    }

    let mut scored: Vec<(usize, usize, &'static HistoricalRequest)> = REQUESTS
        .iter()
        .enumerate()
        .filter_map(|(position, request)| {
            let mut vocabulary = keywords(request.description);
            vocabulary.extend(keywords(request.category));
            let vocabulary: Vec<String> = vocabulary.iter().map(|word| stem(word)).collect();
            let score = wanted.iter().filter(|word| vocabulary.contains(word)).count();
            (score > 0).then_some((score, position, request))
        })
        .collect();

    scored.sort_by(|left, right| right.0.cmp(&left.0).then(left.1.cmp(&right.1)));
    scored.into_iter().map(|(_, _, request)| request).collect()
}

fn stem(word: &str) -> String {
    word.strip_suffix('s').filter(|rest| rest.len() >= 4).unwrap_or(word).to_string()
}
