use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use secrecy::ExposeSecret;
use toml::Value;
use triad_core::config::{AppConfig, LoadOptions, API_KEY_PREFIX};

pub fn run() -> String {
    match AppConfig::load(LoadOptions::default()) {
        Ok(config) => {
            let path = detect_config_path();
            let doc = load_config_file_doc(path.as_deref());
            render(&config, doc.as_ref(), path.as_deref())
        }
        Err(error) => format!("config validation failed: {error}"),
    }
}

/// One line per setting: `- key = value (source: ...)`. Secrets are redacted.
pub fn render(config: &AppConfig, doc: Option<&Value>, path: Option<&Path>) -> String {
    let api_key = config
        .llm
        .api_key
        .as_ref()
        .map(|key| redact_api_key(key.expose_secret()))
        .unwrap_or_else(|| "<unset>".to_string());

    let fields: [(&str, String, &[&str]); 15] = [
        ("llm.api_key", api_key, &["TRIAD_LLM_API_KEY", "CLAUDE_API_KEY"]),
        ("llm.base_url", config.llm.base_url.clone(), &["TRIAD_LLM_BASE_URL"]),
        ("llm.model", config.llm.model.clone(), &["TRIAD_LLM_MODEL"]),
        ("llm.timeout_secs", config.llm.timeout_secs.to_string(), &["TRIAD_LLM_TIMEOUT_SECS"]),
        ("llm.max_retries", config.llm.max_retries.to_string(), &["TRIAD_LLM_MAX_RETRIES"]),
        (
            "llm.retry_initial_delay_ms",
            config.llm.retry_initial_delay_ms.to_string(),
            &["TRIAD_LLM_RETRY_INITIAL_DELAY_MS"],
        ),
        (
            "llm.retry_max_delay_ms",
            config.llm.retry_max_delay_ms.to_string(),
            &["TRIAD_LLM_RETRY_MAX_DELAY_MS"],
        ),
        (
            "server.bind_address",
            config.server.bind_address.clone(),
            &["TRIAD_SERVER_BIND_ADDRESS"],
        ),
        ("server.port", config.server.port.to_string(), &["TRIAD_SERVER_PORT", "PORT"]),
        (
            "server.allowed_origins",
            config.server.allowed_origins.join(","),
            &["TRIAD_SERVER_ALLOWED_ORIGINS", "ALLOWED_ORIGINS"],
        ),
        (
            "server.environment",
            config.server.environment.as_str().to_string(),
            &["TRIAD_ENVIRONMENT"],
        ),
        ("session.ttl_secs", config.session.ttl_secs.to_string(), &["TRIAD_SESSION_TTL_SECS"]),
        (
            "session.sweep_interval_secs",
            config.session.sweep_interval_secs.to_string(),
            &["TRIAD_SESSION_SWEEP_INTERVAL_SECS"],
        ),
        (
            "logging.level",
            config.logging.level.clone(),
            &["TRIAD_LOGGING_LEVEL", "TRIAD_LOG_LEVEL"],
        ),
        (
            "logging.format",
            config.logging.format.as_str().to_string(),
            &["TRIAD_LOGGING_FORMAT", "TRIAD_LOG_FORMAT"],
        ),
    ];

    let mut lines = vec!["effective config (source precedence: env > file > default):".to_string()];
    lines.extend(fields.iter().map(|(key, value, env_keys)| {
        format!("- {key} = {value} (source: {})", field_source(key, env_keys, doc, path))
    }));
    lines.join("\n")
}

fn detect_config_path() -> Option<PathBuf> {
    [PathBuf::from("triad.toml"), PathBuf::from("config/triad.toml")]
        .into_iter()
        .find(|path| path.exists())
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let raw = fs::read_to_string(path?).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(key_path: &str, env_keys: &[&str], doc: Option<&Value>, path: Option<&Path>) -> String {
    if let Some(env_key) = env_keys.iter().find(|key| env::var_os(key).is_some()) {
        return format!("env ({env_key})");
    }

    if doc.is_some_and(|doc| contains_path(doc, key_path)) {
        let file = path.map(|path| path.display().to_string()).unwrap_or_else(|| "config file".to_string());
        return format!("file ({file})");
    }

    "default".to_string()
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    true
}

fn redact_api_key(key: &str) -> String {
    let trimmed = key.trim();
    if trimmed.is_empty() {
        "<empty>".to_string()
    } else if trimmed.starts_with(API_KEY_PREFIX) {
        format!("{API_KEY_PREFIX}***")
    } else {
        "<redacted>".to_string()
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use toml::Value;
    use triad_core::config::AppConfig;

    use super::{redact_api_key, render};

    #[test]
    fn api_keys_never_render_in_full() {
        assert_eq!(redact_api_key("sk-ant-api03-secret"), "sk-ant-***");
        assert_eq!(redact_api_key("other-secret"), "<redacted>");
        assert_eq!(redact_api_key("  "), "<empty>");
    }

    #[test]
    fn file_values_are_attributed_to_the_file() {
        let mut config = AppConfig::default();
        config.llm.api_key = Some("sk-ant-api03-secret".to_string().into());
        config.session.ttl_secs = 600;
        let doc: Value = "[session]\nttl_secs = 600\n".parse().expect("toml");

        let output = render(&config, Some(&doc), Some(Path::new("triad.toml")));

        assert!(output.contains("- session.ttl_secs = 600 (source: file (triad.toml))"));
        assert!(output.contains("- llm.api_key = sk-ant-*** (source:"));
        assert!(output.contains("- server.environment = development (source:"));
        assert!(!output.contains("api03-secret"));
    }
}
