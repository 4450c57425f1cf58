use serde::Serialize;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Component {
    pub name: &'static str,
    pub path: &'static str,
    pub description: &'static str,
    pub language: &'static str,
    pub dependencies: &'static [&'static str],
    pub last_modified: &'static str,
    pub complexity: &'static str,
    pub performance: &'static str,
    pub limitations: &'static str,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PastImplementation {
    pub feature_name: &'static str,
    pub implementation_date: &'static str,
    pub complexity: &'static str,
    pub time_to_implement: &'static str,
    pub approach: &'static str,
    pub challenges: &'static str,
    pub success_metrics: &'static str,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct ArchitecturePattern {
    pub pattern: &'static str,
    pub usage: &'static str,
    pub benefits: &'static str,
}

pub const COMPONENTS: &[Component] = &[
    Component {
        name: "Export API",
        path: "/api/v1/exports",
        description: "Handles data export requests in various formats (CSV, PDF, Excel)",
        language: "Node.js",
        dependencies: &["express", "csv-parser", "pdfkit", "xlsx"],
        last_modified: "2024-09-15",
        complexity: "medium",
        performance: "Handles up to 50 concurrent export requests",
        limitations: "Single file exports only, no batching support",
    },
    Component {
        name: "Batch Processor",
        path: "/services/batch-processor",
        description: "Background job processing system for scheduled tasks",
        language: "Node.js",
        dependencies: &["bull", "redis", "node-cron"],
        last_modified: "2024-07-20",
        complexity: "high",
        performance: "Processes 1000+ jobs per hour",
        limitations: "Optimized for background jobs, not user-triggered tasks",
    },
    Component {
        name: "Report Generation Service",
        path: "/services/reports",
        description: "Generates various report types from database queries",
        language: "Node.js",
        dependencies: &["sequelize", "handlebars", "chart.js"],
        last_modified: "2024-11-05",
        complexity: "high",
        performance: "Generates reports in 2-5 seconds average",
        limitations: "Template-based, limited customization",
    },
    Component {
        name: "Authentication Layer",
        path: "/middleware/auth",
        description: "Handles user authentication and authorization",
        language: "Node.js",
        dependencies: &["passport", "jsonwebtoken", "bcrypt"],
        last_modified: "2024-08-10",
        complexity: "medium",
        performance: "JWT-based, stateless authentication",
        limitations: "No SSO integration yet",
    },
    Component {
        name: "Database Layer",
        path: "/models",
        description: "PostgreSQL database models and ORM",
        language: "Node.js",
        dependencies: &["sequelize", "pg"],
        last_modified: "2024-10-01",
        complexity: "medium",
        performance: "Supports 10,000+ concurrent connections",
        limitations: "Some queries need optimization for large datasets",
    },
    Component {
        name: "API Rate Limiter",
        path: "/middleware/rate-limit",
        description: "Controls API request rates per user/account",
        language: "Node.js",
        dependencies: &["express-rate-limit", "redis"],
        last_modified: "2024-08-01",
        complexity: "low",
        performance: "Distributed rate limiting via Redis",
        limitations: "Fixed tiers, no dynamic adjustment",
    },
    Component {
        name: "Notification Service",
        path: "/services/notifications",
        description: "Sends email, webhook, and in-app notifications",
        language: "Node.js",
        dependencies: &["nodemailer", "axios", "socket.io"],
        last_modified: "2024-09-20",
        complexity: "medium",
        performance: "Async delivery, 99% delivery rate",
        limitations: "Email only, no SMS support",
    },
    Component {
        name: "Scheduler Service",
        path: "/services/scheduler",
        description: "Cron-based task scheduling system",
        language: "Node.js",
        dependencies: &["node-cron", "agenda"],
        last_modified: "2024-07-15",
        complexity: "low",
        performance: "Runs tasks on schedule with retry logic",
        limitations: "Server-time based, no timezone support",
    },
];

pub const PAST_IMPLEMENTATIONS: &[PastImplementation] = &[
    PastImplementation {
        feature_name: "Scheduled Report Generation",
        implementation_date: "2024-07-15",
        complexity: "medium",
        time_to_implement: "5 days",
        approach: "Extended Scheduler Service with report generation hooks",
        challenges: "Timezone handling, retry logic for failed reports",
        success_metrics: "Reduced manual report generation by 80%",
    },
    PastImplementation {
        feature_name: "Webhook Notifications",
        implementation_date: "2024-09-20",
        complexity: "low",
        time_to_implement: "3 days",
        approach: "Added webhook delivery to existing Notification Service",
        challenges: "Retry logic, webhook verification",
        success_metrics: "95% successful delivery rate",
    },
    PastImplementation {
        feature_name: "Advanced Dashboard Filtering",
        implementation_date: "2024-11-05",
        complexity: "medium",
        time_to_implement: "4 days",
        approach: "Built custom filter builder component with query optimization",
        challenges: "Complex query generation, UI/UX design",
        success_metrics: "User satisfaction score increased 40%",
    },
    PastImplementation {
        feature_name: "API Rate Limit Upgrade",
        implementation_date: "2024-08-01",
        complexity: "low",
        time_to_implement: "2 days",
        approach: "Configured tier-based limits with Redis backend",
        challenges: "Backward compatibility, migration",
        success_metrics: "Zero service degradation incidents",
    },
];

pub const ARCHITECTURE_PATTERNS: &[ArchitecturePattern] = &[
    ArchitecturePattern {
        pattern: "Microservices",
        usage: "Services are modular and independently deployable",
        benefits: "Easy to scale individual components",
    },
    ArchitecturePattern {
        pattern: "Queue-based Processing",
        usage: "Background jobs via Bull/Redis",
        benefits: "Decouples long-running tasks from API requests",
    },
    ArchitecturePattern {
        pattern: "RESTful API",
        usage: "Standard REST endpoints for client-server communication",
        benefits: "Familiar pattern, wide tool support",
    },
    ArchitecturePattern {
        pattern: "JWT Authentication",
        usage: "Stateless token-based auth",
        benefits: "Scalable, no server-side session storage",
    },
];

pub fn component_by_name(name: &str) -> Option<&'static Component> {
    let wanted = name.trim();
    COMPONENTS.iter().find(|component| component.name.eq_ignore_ascii_case(wanted))
}

pub fn components_depending_on(dependency: &str) -> Vec<&'static Component> {
    let wanted = dependency.to_lowercase();
    COMPONENTS
        .iter()
        .filter(|component| {
            component.dependencies.iter().any(|dep| dep.to_lowercase().contains(&wanted))
        })
        .collect()
}

pub fn past_implementations_by_complexity(complexity: &str) -> Vec<&'static PastImplementation> {
    PAST_IMPLEMENTATIONS.iter().filter(|past| past.complexity == complexity).collect()
}

pub fn search_components(term: &str) -> Vec<&'static Component> {
    let term = term.to_lowercase();
    COMPONENTS
        .iter()
        .filter(|component| {
            component.name.to_lowercase().contains(&term)
                || component.description.to_lowercase().contains(&term)
        })
        .collect()
}
