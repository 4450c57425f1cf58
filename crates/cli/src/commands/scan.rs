use serde::Serialize;
use triad_agent::trigger::{scan_for_trigger, TriggerScan};
use triad_core::domain::feature::FeatureRequirements;

use crate::commands::CommandResult;

#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case")]
enum Outcome {
    NoTrigger,
    Triggered,
    Malformed,
}

#[derive(Debug, Serialize)]
struct ScanReport<'a> {
    outcome: Outcome,
    display_text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    feature_title: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    payload: Option<&'a FeatureRequirements>,
    #[serde(skip_serializing_if = "Option::is_none")]
    reason: Option<&'a str>,
}

/// Classifies `input` offline. Exit code 0 for a clean reply or a usable hand-off, 1 when a
/// marker was found without a usable payload.
pub fn run(input: &str) -> CommandResult {
    let scan = scan_for_trigger(input);
    let report = match &scan {
        TriggerScan::NoTrigger => ScanReport {
            outcome: Outcome::NoTrigger,
            display_text: input.trim(),
            feature_title: None,
            payload: None,
            reason: None,
        },
        TriggerScan::Triggered { payload, display_text } => ScanReport {
            outcome: Outcome::Triggered,
            display_text,
            feature_title: Some(payload.feature_title()),
            payload: Some(payload),
            reason: None,
        },
        TriggerScan::Malformed { display_text, reason } => ScanReport {
            outcome: Outcome::Malformed,
            display_text,
            feature_title: None,
            payload: None,
            reason: Some(reason.as_str()),
        },
    };

    let exit_code = if matches!(scan, TriggerScan::Malformed { .. }) { 1 } else { 0 };
    match serde_json::to_string_pretty(&report) {
        Ok(output) => CommandResult { exit_code, output },
        Err(error) => CommandResult::failure("scan", "serialization", error.to_string(), 2),
    }
}
