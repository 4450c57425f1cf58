use serde::Serialize;
use triad_agent::{AnthropicClient, RetryConfig};
use triad_core::config::{AppConfig, ConfigError, LoadOptions};

use crate::commands::CommandResult;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
enum CheckStatus {
    Pass,
    Warn,
    Fail,
    Skipped,
}

#[derive(Debug, Serialize)]
struct DoctorCheck {
    name: &'static str,
    status: CheckStatus,
    details: String,
}

#[derive(Debug, Serialize)]
struct DoctorReport {
    overall_status: CheckStatus,
    summary: String,
    checks: Vec<DoctorCheck>,
}

pub fn run(json_output: bool) -> CommandResult {
    let report = build_report(AppConfig::load(LoadOptions::default()));
    let exit_code = if report.overall_status == CheckStatus::Fail { 1 } else { 0 };

    if !json_output {
        return CommandResult { exit_code, output: render_human(&report) };
    }

    match serde_json::to_string_pretty(&report) {
        Ok(output) => CommandResult { exit_code, output },
        Err(error) => CommandResult::failure("doctor", "serialization", error.to_string(), 2),
    }
}

fn build_report(loaded: Result<AppConfig, ConfigError>) -> DoctorReport {
    let mut checks = Vec::new();

    match loaded {
        Ok(config) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Pass,
                details: "configuration loaded and validated".to_string(),
            });
            checks.push(check_llm_client(&config));
            checks.push(check_cors_origins(&config));
        }
        Err(error) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Fail,
                details: error.to_string(),
            });
            for name in ["llm_client_readiness", "cors_origins"] {
                checks.push(DoctorCheck {
                    name,
                    status: CheckStatus::Skipped,
                    details: "skipped because configuration did not load".to_string(),
                });
            }
        }
    }

    let failed = checks.iter().any(|check| matches!(check.status, CheckStatus::Fail | CheckStatus::Skipped));
    let (overall_status, summary) = if failed {
        (CheckStatus::Fail, "doctor: one or more readiness checks failed")
    } else if checks.iter().any(|check| check.status == CheckStatus::Warn) {
        (CheckStatus::Warn, "doctor: ready with warnings")
    } else {
        (CheckStatus::Pass, "doctor: all readiness checks passed")
    };

    DoctorReport { overall_status, summary: summary.to_string(), checks }
}

/// Builds the real client without sending anything.
fn check_llm_client(config: &AppConfig) -> DoctorCheck {
    match AnthropicClient::from_config(&config.llm) {
        Ok(client) => {
            let retry = RetryConfig::from(&config.llm);
            DoctorCheck {
                name: "llm_client_readiness",
                status: CheckStatus::Pass,
                details: format!(
                    "model `{}` at `{}`, up to {} attempt(s)",
                    client.model(),
                    client.endpoint(),
                    retry.max_attempts
                ),
            }
        }
        Err(error) => DoctorCheck {
            name: "llm_client_readiness",
            status: CheckStatus::Fail,
            details: error.to_string(),
        },
    }
}

fn check_cors_origins(config: &AppConfig) -> DoctorCheck {
    let origins = config.server.allowed_origins.join(", ");
    let production = config.server.environment == triad_core::config::Environment::Production;

    if production && config.server.origins_are_local_only() {
        DoctorCheck {
            name: "cors_origins",
            status: CheckStatus::Warn,
            details: format!("production allows only local origins: {origins}"),
        }
    } else {
        DoctorCheck { name: "cors_origins", status: CheckStatus::Pass, details: origins }
    }
}

fn render_human(report: &DoctorReport) -> String {
    let mut lines = vec![report.summary.clone()];

    for check in &report.checks {
        let marker = match check.status {
            CheckStatus::Pass => "ok",
            CheckStatus::Warn => "warn",
            CheckStatus::Fail => "fail",
            CheckStatus::Skipped => "skip",
        };
        lines.push(format!("- [{marker}] {}: {}", check.name, check.details));
    }

    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use triad_core::config::{AppConfig, ConfigError, Environment};

    use super::{build_report, render_human, CheckStatus};

    fn valid_config() -> AppConfig {
        let mut config = AppConfig::default();
        config.llm.api_key = Some("sk-ant-test".to_string().into());
        config
    }

    #[test]
    fn valid_config_passes_every_check() {
        let report = build_report(Ok(valid_config()));

        assert_eq!(report.overall_status, CheckStatus::Pass);
        assert!(report.checks.iter().all(|check| check.status == CheckStatus::Pass));
        let llm = &report.checks[1];
        assert!(llm.details.contains("https://api.anthropic.com/v1/messages"));
    }

    #[test]
    fn config_failure_skips_dependent_checks() {
        let report = build_report(Err(ConfigError::Validation("llm.api_key is required".to_string())));

        assert_eq!(report.overall_status, CheckStatus::Fail);
        assert_eq!(report.checks[0].status, CheckStatus::Fail);
        assert!(report.checks[1..].iter().all(|check| check.status == CheckStatus::Skipped));
        assert!(render_human(&report).contains("- [fail] config_validation: configuration validation failed"));
    }

    #[test]
    fn local_origins_in_production_warn() {
        let mut config = valid_config();
        config.server.environment = Environment::Production;

        let report = build_report(Ok(config));

        assert_eq!(report.overall_status, CheckStatus::Warn);
        assert_eq!(report.checks[2].status, CheckStatus::Warn);
    }
}
