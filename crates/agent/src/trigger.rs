//! Hand-off protocol between the insights agent and the tech spec agent.
//!
//! The insights agent signals a hand-off by writing [`TECH_ANALYSIS_MARKER`] followed by a
//! JSON object. Scanning is pure: it never calls a model, it only classifies the text.

use triad_core::domain::feature::{FeatureRequirements, FeatureRequirementsInput};

pub const TECH_ANALYSIS_MARKER: &str = "[TRIGGER_TECH_ANALYSIS]";

/// Appended to the visible reply when a hand-off was attempted but could not be started.
pub const DISPATCH_FAILURE_NOTE: &str = "\n\n⚠️ Note: There was an issue initiating technical \
analysis. Please try again or contact the Engineering Lead directly.";

#[derive(Clone, Debug, PartialEq)]
pub enum TriggerScan {
    NoTrigger,
    Triggered { payload: FeatureRequirements, display_text: String },
    /// Marker found but no usable payload after it.
    Malformed { display_text: String, reason: String },
}

impl TriggerScan {
    pub fn is_triggered(&self) -> bool {
        matches!(self, Self::Triggered { .. })
    }

    /// Text the end user should see for a reply that produced this scan.
    pub fn display_text<'a>(&'a self, original: &'a str) -> &'a str {
        match self {
            Self::NoTrigger => original,
            Self::Triggered { display_text, .. } | Self::Malformed { display_text, .. } => {
                display_text
            }
        }
    }
}

pub fn scan_for_trigger(text: &str) -> TriggerScan {
    let Some(marker_at) = text.find(TECH_ANALYSIS_MARKER) else {
        return TriggerScan::NoTrigger;
    };

    let after_marker = &text[marker_at + TECH_ANALYSIS_MARKER.len()..];
    let Some(candidate) = balanced_json_object(after_marker) else {
        return TriggerScan::Malformed {
            display_text: degraded_display_text(text),
            reason: "no balanced JSON object after the marker".to_string(),
        };
    };

    match serde_json::from_str::<FeatureRequirementsInput>(candidate) {
        Ok(input) => TriggerScan::Triggered {
            payload: FeatureRequirements::from(input),
            display_text: text[..marker_at].trim().to_string(),
        },
        Err(error) => TriggerScan::Malformed {
            display_text: degraded_display_text(text),
            reason: error.to_string(),
        },
    }
}

/// Returns the first `{ ... }` span whose braces balance, counting depth only. Braces inside
/// string values must themselves balance for the span to be found.
pub fn balanced_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let mut depth = 0_usize;
    for (offset, ch) in text[start..].char_indices() {
        match ch {
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..start + offset + ch.len_utf8()]);
                }
            }
            _ => {}
        }
    }
    None
}

/// Strips everything from the marker onward and appends [`DISPATCH_FAILURE_NOTE`].
pub fn degraded_display_text(text: &str) -> String {
    let visible = match text.find(TECH_ANALYSIS_MARKER) {
        Some(marker_at) => &text[..marker_at],
        None => text,
    };
    format!("{}{DISPATCH_FAILURE_NOTE}", visible.trim())
}

#[cfg(test)]
mod tests {
    use super::{
        balanced_json_object, degraded_display_text, scan_for_trigger, TriggerScan,
        DISPATCH_FAILURE_NOTE, TECH_ANALYSIS_MARKER,
    };

    const PAYLOAD: &str = r#"{
  "title": "Bulk CSV Export",
  "description": "Export {report} batches",
  "businessContext": "Acme renewal in 60 days",
  "technicalRequirements": "200+ reports",
  "customerData": {"count": 1, "totalARR": 150000, "urgency": "High"}
}"#;

    fn reply(payload: &str) -> String {
        format!("I'm starting a feasibility review with Engineering.\n\n{TECH_ANALYSIS_MARKER}\n{payload}")
    }

    #[test]
    fn text_without_marker_is_untouched() {
        let text = "Three themes stand out: export, mobile and SSO.";
        let scan = scan_for_trigger(text);
        assert_eq!(scan, TriggerScan::NoTrigger);
        assert_eq!(scan.display_text(text), text);
    }

    #[test]
    fn nested_braces_parse_into_payload() {
        let text = reply(PAYLOAD);

        let TriggerScan::Triggered { payload, display_text } = scan_for_trigger(&text) else {
            panic!("expected a trigger");
        };

        assert_eq!(display_text, "I'm starting a feasibility review with Engineering.");
        assert_eq!(payload.feature_title(), "Bulk CSV Export");
        assert_eq!(payload.fields.description, "Export {report} batches");
        let impact = payload.fields.customer_data.expect("customer data");
        assert_eq!(impact.count, 1);
        assert_eq!(impact.total_arr, 150_000.0);
    }

    #[test]
    fn prose_customer_data_still_hands_off() {
        let text = reply(r#"{"title": "Offline mode", "customerData": "3 customers, $240K"}"#);

        let TriggerScan::Triggered { payload, .. } = scan_for_trigger(&text) else {
            panic!("expected a trigger");
        };

        assert_eq!(payload.feature_title(), "Offline mode");
        assert_eq!(payload.fields.customer_data, None);
    }

    #[test]
    fn deleted_closing_brace_is_malformed_and_stripped() {
        let truncated = PAYLOAD.trim_end().trim_end_matches('}');
        let text = reply(truncated);

        let scan = scan_for_trigger(&text);

        assert!(!scan.is_triggered());
        let TriggerScan::Malformed { display_text, .. } = &scan else {
            panic!("expected malformed scan");
        };
        assert!(!display_text.contains(TECH_ANALYSIS_MARKER));
        assert!(!display_text.contains("Bulk CSV Export"));
        assert!(display_text.starts_with("I'm starting a feasibility review with Engineering."));
        assert!(display_text.ends_with(DISPATCH_FAILURE_NOTE));
    }

    #[test]
    fn invalid_json_inside_balanced_braces_is_malformed() {
        let scan = scan_for_trigger(&reply("{ title: unquoted }"));
        assert!(matches!(scan, TriggerScan::Malformed { .. }));
    }

    #[test]
    fn marker_without_object_is_malformed() {
        let scan = scan_for_trigger(&format!("Looking into it. {TECH_ANALYSIS_MARKER}"));
        let TriggerScan::Malformed { display_text, .. } = scan else {
            panic!("expected malformed scan");
        };
        assert_eq!(display_text, format!("Looking into it.{DISPATCH_FAILURE_NOTE}"));
    }

    #[test]
    fn balance_scan_ignores_trailing_text() {
        assert_eq!(balanced_json_object("x {\"a\": {\"b\": 1}} tail }"), Some("{\"a\": {\"b\": 1}}"));
        assert_eq!(balanced_json_object("no object here"), None);
        assert_eq!(balanced_json_object("{\"open\": {"), None);
    }

    #[test]
    fn degraded_text_without_marker_keeps_everything() {
        assert_eq!(degraded_display_text("  done  "), format!("done{DISPATCH_FAILURE_NOTE}"));
    }
}
