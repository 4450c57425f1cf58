use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const API_KEY_PREFIX: &str = "sk-ant-";

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub llm: LlmConfig,
    pub server: ServerConfig,
    pub session: SessionConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug)]
pub struct LlmConfig {
    pub api_key: Option<SecretString>,
    pub base_url: String,
    pub model: String,
    pub timeout_secs: u64,
    /// Total attempts per request, including the first one.
    pub max_retries: u32,
    pub retry_initial_delay_ms: u64,
    pub retry_max_delay_ms: u64,
}

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub bind_address: String,
    pub port: u16,
    pub allowed_origins: Vec<String>,
    pub environment: Environment,
}

#[derive(Clone, Debug)]
pub struct SessionConfig {
    pub ttl_secs: u64,
    pub sweep_interval_secs: u64,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Environment {
    Development,
    Production,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub llm_api_key: Option<String>,
    pub llm_model: Option<String>,
    pub server_port: Option<u16>,
    pub log_level: Option<String>,
    pub log_format: Option<LogFormat>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("environment variable interpolation failed for `{var}`")]
    MissingEnvInterpolation { var: String },
    #[error("unterminated environment interpolation expression")]
    UnterminatedInterpolation,
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            llm: LlmConfig {
                api_key: None,
                base_url: "https://api.anthropic.com".to_string(),
                model: "claude-3-haiku-20240307".to_string(),
                timeout_secs: 120,
                max_retries: 3,
                retry_initial_delay_ms: 1_000,
                retry_max_delay_ms: 8_000,
            },
            server: ServerConfig {
                bind_address: "127.0.0.1".to_string(),
                port: 3001,
                allowed_origins: vec!["http://localhost:5173".to_string()],
                environment: Environment::Development,
            },
            session: SessionConfig { ttl_secs: 2 * 60 * 60, sweep_interval_secs: 60 * 60 },
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

fn secret_value(value: String) -> SecretString {
    value.into()
}

impl Environment {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Development => "development",
            Self::Production => "production",
        }
    }
}

impl LogFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Compact => "compact",
            Self::Pretty => "pretty",
            Self::Json => "json",
        }
    }
}

impl std::str::FromStr for Environment {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" => Ok(Self::Development),
            "production" | "prod" => Ok(Self::Production),
            other => Err(ConfigError::Validation(format!(
                "unsupported environment `{other}` (expected development|production)"
            ))),
        }
    }
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

impl ServerConfig {
    /// True when every allowed origin points at a loopback host.
    pub fn origins_are_local_only(&self) -> bool {
        self.allowed_origins
            .iter()
            .all(|origin| origin.contains("localhost") || origin.contains("127.0.0.1"))
    }
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch)?;
        } else if options.require_file {
            let expected = options.config_path.unwrap_or_else(|| PathBuf::from("triad.toml"));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) -> Result<(), ConfigError> {
        if let Some(llm) = patch.llm {
            if let Some(llm_api_key_value) = llm.api_key {
                self.llm.api_key = Some(secret_value(llm_api_key_value));
            }
            if let Some(base_url) = llm.base_url {
                self.llm.base_url = base_url;
            }
            if let Some(model) = llm.model {
                self.llm.model = model;
            }
            if let Some(timeout_secs) = llm.timeout_secs {
                self.llm.timeout_secs = timeout_secs;
            }
            if let Some(max_retries) = llm.max_retries {
                self.llm.max_retries = max_retries;
            }
            if let Some(initial) = llm.retry_initial_delay_ms {
                self.llm.retry_initial_delay_ms = initial;
            }
            if let Some(max) = llm.retry_max_delay_ms {
                self.llm.retry_max_delay_ms = max;
            }
        }

        if let Some(server) = patch.server {
            if let Some(bind_address) = server.bind_address {
                self.server.bind_address = bind_address;
            }
            if let Some(port) = server.port {
                self.server.port = port;
            }
            if let Some(allowed_origins) = server.allowed_origins {
                self.server.allowed_origins = allowed_origins;
            }
            if let Some(environment) = server.environment {
                self.server.environment = environment.parse()?;
            }
        }

        if let Some(session) = patch.session {
            if let Some(ttl_secs) = session.ttl_secs {
                self.session.ttl_secs = ttl_secs;
            }
            if let Some(sweep_interval_secs) = session.sweep_interval_secs {
                self.session.sweep_interval_secs = sweep_interval_secs;
            }
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }

        Ok(())
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        let api_key = read_env("TRIAD_LLM_API_KEY").or_else(|| read_env("CLAUDE_API_KEY"));
        if let Some(value) = api_key {
            self.llm.api_key = Some(secret_value(value));
        }
        if let Some(value) = read_env("TRIAD_LLM_BASE_URL") {
            self.llm.base_url = value;
        }
        if let Some(value) = read_env("TRIAD_LLM_MODEL") {
            self.llm.model = value;
        }
        if let Some(value) = read_env("TRIAD_LLM_TIMEOUT_SECS") {
            self.llm.timeout_secs = parse_u64("TRIAD_LLM_TIMEOUT_SECS", &value)?;
        }
        if let Some(value) = read_env("TRIAD_LLM_MAX_RETRIES") {
            self.llm.max_retries = parse_u32("TRIAD_LLM_MAX_RETRIES", &value)?;
        }
        if let Some(value) = read_env("TRIAD_LLM_RETRY_INITIAL_DELAY_MS") {
            self.llm.retry_initial_delay_ms =
                parse_u64("TRIAD_LLM_RETRY_INITIAL_DELAY_MS", &value)?;
        }
        if let Some(value) = read_env("TRIAD_LLM_RETRY_MAX_DELAY_MS") {
            self.llm.retry_max_delay_ms = parse_u64("TRIAD_LLM_RETRY_MAX_DELAY_MS", &value)?;
        }

        if let Some(value) = read_env("TRIAD_SERVER_BIND_ADDRESS") {
            self.server.bind_address = value;
        }
        let port = read_env("TRIAD_SERVER_PORT")
            .map(|value| ("TRIAD_SERVER_PORT", value))
            .or_else(|| read_env("PORT").map(|value| ("PORT", value)));
        if let Some((key, value)) = port {
            self.server.port = parse_u16(key, &value)?;
        }
        let origins =
            read_env("TRIAD_SERVER_ALLOWED_ORIGINS").or_else(|| read_env("ALLOWED_ORIGINS"));
        if let Some(value) = origins {
            self.server.allowed_origins = split_origins(&value);
        }
        if let Some(value) = read_env("TRIAD_ENVIRONMENT") {
            self.server.environment = value.parse()?;
        }

        if let Some(value) = read_env("TRIAD_SESSION_TTL_SECS") {
            self.session.ttl_secs = parse_u64("TRIAD_SESSION_TTL_SECS", &value)?;
        }
        if let Some(value) = read_env("TRIAD_SESSION_SWEEP_INTERVAL_SECS") {
            self.session.sweep_interval_secs =
                parse_u64("TRIAD_SESSION_SWEEP_INTERVAL_SECS", &value)?;
        }

        let log_level = read_env("TRIAD_LOGGING_LEVEL").or_else(|| read_env("TRIAD_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format = read_env("TRIAD_LOGGING_FORMAT").or_else(|| read_env("TRIAD_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(llm_api_key) = overrides.llm_api_key {
            self.llm.api_key = Some(secret_value(llm_api_key));
        }
        if let Some(llm_model) = overrides.llm_model {
            self.llm.model = llm_model;
        }
        if let Some(server_port) = overrides.server_port {
            self.server.port = server_port;
        }
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
        if let Some(log_format) = overrides.log_format {
            self.logging.format = log_format;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_llm(&self.llm)?;
        validate_server(&self.server)?;
        validate_session(&self.session)?;
        validate_logging(&self.logging)?;
        Ok(())
    }
}

fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    [PathBuf::from("triad.toml"), PathBuf::from("config/triad.toml")]
        .into_iter()
        .find(|path| path.exists())
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;

    let interpolated = interpolate_env_vars(&raw)?;
    toml::from_str::<ConfigPatch>(&interpolated)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && matches!(chars.peek(), Some('{')) {
            chars.next();
            let mut key = String::new();

            loop {
                match chars.next() {
                    Some('}') => break,
                    Some(next) => key.push(next),
                    None => return Err(ConfigError::UnterminatedInterpolation),
                }
            }

            let value = env::var(&key)
                .map_err(|_| ConfigError::MissingEnvInterpolation { var: key.clone() })?;
            output.push_str(&value);
            continue;
        }

        output.push(ch);
    }

    Ok(output)
}

fn split_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .map(str::to_string)
        .collect()
}

fn validate_llm(llm: &LlmConfig) -> Result<(), ConfigError> {
    let api_key = llm.api_key.as_ref().map(|value| value.expose_secret().trim()).unwrap_or("");
    if api_key.is_empty() {
        return Err(ConfigError::Validation(
            "llm.api_key is required (set TRIAD_LLM_API_KEY or CLAUDE_API_KEY). Get one from https://console.anthropic.com/".to_string(),
        ));
    }
    if !api_key.starts_with(API_KEY_PREFIX) {
        return Err(ConfigError::Validation(format!(
            "llm.api_key must start with `{API_KEY_PREFIX}`"
        )));
    }

    if !llm.base_url.starts_with("http://") && !llm.base_url.starts_with("https://") {
        return Err(ConfigError::Validation(
            "llm.base_url must start with http:// or https://".to_string(),
        ));
    }

    if llm.model.trim().is_empty() {
        return Err(ConfigError::Validation("llm.model must not be empty".to_string()));
    }

    if llm.timeout_secs == 0 || llm.timeout_secs > 600 {
        return Err(ConfigError::Validation(
            "llm.timeout_secs must be in range 1..=600".to_string(),
        ));
    }

    if llm.max_retries == 0 || llm.max_retries > 10 {
        return Err(ConfigError::Validation(
            "llm.max_retries must be in range 1..=10".to_string(),
        ));
    }

    if llm.retry_max_delay_ms < llm.retry_initial_delay_ms {
        return Err(ConfigError::Validation(
            "llm.retry_max_delay_ms must not be lower than llm.retry_initial_delay_ms".to_string(),
        ));
    }

    Ok(())
}

fn validate_server(server: &ServerConfig) -> Result<(), ConfigError> {
    if server.port == 0 {
        return Err(ConfigError::Validation("server.port must be greater than zero".to_string()));
    }

    if server.allowed_origins.is_empty() {
        return Err(ConfigError::Validation(
            "server.allowed_origins must list at least one origin".to_string(),
        ));
    }

    if let Some(origin) = server
        .allowed_origins
        .iter()
        .find(|origin| !origin.starts_with("http://") && !origin.starts_with("https://"))
    {
        return Err(ConfigError::Validation(format!(
            "server.allowed_origins entry `{origin}` must start with http:// or https://"
        )));
    }

    Ok(())
}

fn validate_session(session: &SessionConfig) -> Result<(), ConfigError> {
    if session.ttl_secs == 0 {
        return Err(ConfigError::Validation(
            "session.ttl_secs must be greater than zero".to_string(),
        ));
    }

    if session.sweep_interval_secs == 0 {
        return Err(ConfigError::Validation(
            "session.sweep_interval_secs must be greater than zero".to_string(),
        ));
    }

    Ok(())
}

fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
    let level = logging.level.trim().to_ascii_lowercase();
    match level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ConfigError::Validation(
            "logging.level must be one of trace|debug|info|warn|error".to_string(),
        )),
    }
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_u16(key: &str, value: &str) -> Result<u16, ConfigError> {
    value.parse::<u16>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_u32(key: &str, value: &str) -> Result<u32, ConfigError> {
    value.parse::<u32>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_u64(key: &str, value: &str) -> Result<u64, ConfigError> {
    value.parse::<u64>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    llm: Option<LlmPatch>,
    server: Option<ServerPatch>,
    session: Option<SessionPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct LlmPatch {
    api_key: Option<String>,
    base_url: Option<String>,
    model: Option<String>,
    timeout_secs: Option<u64>,
    max_retries: Option<u32>,
    retry_initial_delay_ms: Option<u64>,
    retry_max_delay_ms: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct ServerPatch {
    bind_address: Option<String>,
    port: Option<u16>,
    allowed_origins: Option<Vec<String>>,
    environment: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct SessionPatch {
    ttl_secs: Option<u64>,
    sweep_interval_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}

#[cfg(test)]
// ubs:ignore
mod tests {
    use std::env;
    use std::fs;
    use std::io;
    use std::sync::{Mutex, OnceLock};

    use secrecy::ExposeSecret;
    use tempfile::TempDir;

    use super::{AppConfig, ConfigError, ConfigOverrides, Environment, LoadOptions, LogFormat};

    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

    const ALL_VARS: &[&str] = &[
        "TRIAD_LLM_API_KEY",
        "CLAUDE_API_KEY",
        "TRIAD_LLM_MODEL",
        "TRIAD_SERVER_PORT",
        "PORT",
        "ALLOWED_ORIGINS",
        "TRIAD_LOG_LEVEL",
        "TRIAD_LOG_FORMAT",
        "TRIAD_SESSION_TTL_SECS",
    ];

    fn env_lock() -> &'static Mutex<()> {
        ENV_LOCK.get_or_init(|| Mutex::new(()))
    }

    fn clear_vars(vars: &[&str]) {
        for var in vars {
            env::remove_var(var);
        }
    }

    fn ensure(condition: bool, message: &'static str) -> Result<(), String> {
        if condition {
            Ok(())
        } else {
            Err(message.to_string())
        }
    }

    #[test]
    fn file_load_supports_env_interpolation() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;
        clear_vars(ALL_VARS);

        env::set_var("TEST_TRIAD_KEY", "sk-ant-from-env");

        let result = (|| -> Result<(), String> {
            let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
            let path = dir.path().join("triad.toml");
            fs::write(
                &path,
                r#"
[llm]
api_key = "${TEST_TRIAD_KEY}" # ubs:ignore

[session]
ttl_secs = 60
"#,
            )
            .map_err(|err| err.to_string())?;

            let config =
                AppConfig::load(LoadOptions { config_path: Some(path), ..LoadOptions::default() })
                    .map_err(|err| format!("config load failed: {err}"))?;

            let key = config.llm.api_key.as_ref().map(|key| key.expose_secret().to_string());
            ensure(key.as_deref() == Some("sk-ant-from-env"), "api key should be interpolated")?;
            ensure(config.session.ttl_secs == 60, "session ttl should come from the file")?;
            ensure(config.session.sweep_interval_secs == 3600, "sweep interval keeps default")?;
            Ok(())
        })();

        clear_vars(&["TEST_TRIAD_KEY"]);
        result
    }

    #[test]
    fn legacy_env_names_are_supported() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;
        clear_vars(ALL_VARS);

        env::set_var("CLAUDE_API_KEY", "sk-ant-legacy");
        env::set_var("PORT", "4100");
        env::set_var("ALLOWED_ORIGINS", "http://localhost:5173, https://triad.example.com");
        env::set_var("TRIAD_LOG_LEVEL", "warn");
        env::set_var("TRIAD_LOG_FORMAT", "pretty");

        let result = (|| -> Result<(), String> {
            let config = AppConfig::load(LoadOptions::default())
                .map_err(|err| format!("config load failed: {err}"))?;

            ensure(config.server.port == 4100, "PORT should set the listen port")?;
            ensure(config.server.allowed_origins.len() == 2, "origins should be comma split")?;
            ensure(
                config.server.allowed_origins[1] == "https://triad.example.com",
                "origins should be trimmed",
            )?;
            ensure(!config.server.origins_are_local_only(), "public origin was configured")?;
            ensure(config.logging.level == "warn", "warning log level should be set from env var")?;
            ensure(
                matches!(config.logging.format, LogFormat::Pretty),
                "pretty logging format should be set from env var",
            )?;
            Ok(())
        })();

        clear_vars(ALL_VARS);
        result
    }

    #[test]
    fn precedence_defaults_file_env_overrides() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;
        clear_vars(ALL_VARS);

        env::set_var("TRIAD_LLM_API_KEY", "sk-ant-from-env");
        env::set_var("TRIAD_LLM_MODEL", "claude-from-env");

        let result = (|| -> Result<(), String> {
            let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
            let path = dir.path().join("triad.toml");
            fs::write(
                &path,
                r#"
[llm]
api_key = "sk-ant-from-file" # ubs:ignore
model = "claude-from-file"

[server]
port = 4200
environment = "production"

[logging]
level = "warn"
"#,
            )
            .map_err(|err| err.to_string())?;

            let config = AppConfig::load(LoadOptions {
                config_path: Some(path),
                overrides: ConfigOverrides {
                    llm_model: Some("claude-from-override".to_string()),
                    log_level: Some("debug".to_string()),
                    ..ConfigOverrides::default()
                },
                ..LoadOptions::default()
            })
            .map_err(|err| format!("config load failed: {err}"))?;

            ensure(config.llm.model == "claude-from-override", "override model should win")?;
            ensure(config.logging.level == "debug", "overridden log level should be debug")?;
            ensure(config.server.port == 4200, "file port should beat defaults")?;
            ensure(
                config.server.environment == Environment::Production,
                "file environment should apply",
            )?;
            let key = config.llm.api_key.as_ref().map(|key| key.expose_secret().to_string());
            ensure(
                key.as_deref() == Some("sk-ant-from-env"),
                "env api key should win over file and defaults",
            )?;
            Ok(())
        })();

        clear_vars(ALL_VARS);
        result
    }

    #[test]
    fn validation_rejects_foreign_api_keys() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;
        clear_vars(ALL_VARS);

        env::set_var("TRIAD_LLM_API_KEY", "sk-openai-value");

        let result = (|| -> Result<(), String> {
            let error = match AppConfig::load(LoadOptions::default()) {
                Ok(_) => {
                    return Err("expected validation failure but config load succeeded".to_string())
                }
                Err(error) => error,
            };
            let has_message = matches!(
                error,
                ConfigError::Validation(ref message) if message.contains("sk-ant-")
            );
            ensure(has_message, "validation failure should mention the key prefix")
        })();

        clear_vars(ALL_VARS);
        result
    }

    #[test]
    fn missing_api_key_fails_fast() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;
        clear_vars(ALL_VARS);

        let result = match AppConfig::load(LoadOptions::default()) {
            Ok(_) => Err("expected missing api key to fail".to_string()),
            Err(ConfigError::Validation(message)) => {
                ensure(message.contains("llm.api_key"), "error should name llm.api_key")
            }
            Err(other) => Err(format!("unexpected error: {other}")),
        };

        result
    }

    #[test]
    fn invalid_numeric_override_is_reported() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;
        clear_vars(ALL_VARS);

        env::set_var("TRIAD_LLM_API_KEY", "sk-ant-valid");
        env::set_var("TRIAD_SESSION_TTL_SECS", "two-hours");

        let result = match AppConfig::load(LoadOptions::default()) {
            Ok(_) => Err("expected invalid ttl to fail".to_string()),
            Err(ConfigError::InvalidEnvOverride { key, .. }) => {
                ensure(key == "TRIAD_SESSION_TTL_SECS", "error should name the variable")
            }
            Err(other) => Err(format!("unexpected error: {other}")),
        };

        clear_vars(ALL_VARS);
        result
    }

    #[test]
    fn secret_values_are_not_leaked_by_debug() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;
        clear_vars(ALL_VARS);

        env::set_var("TRIAD_LLM_API_KEY", "sk-ant-secret-value");

        let result = (|| -> Result<(), String> {
            let config = AppConfig::load(LoadOptions::default())
                .map_err(|err| format!("config load failed: {err}"))?;
            let debug = format!("{config:?}");

            ensure(!debug.contains("sk-ant-secret-value"), "debug output should not contain key")?;
            ensure(
                matches!(config.logging.format, LogFormat::Compact),
                "default logging format should be compact",
            )?;
            ensure(config.server.port == 3001, "default port is 3001")?;
            ensure(config.session.ttl_secs == 7200, "default session ttl is two hours")?;
            Ok(())
        })();

        clear_vars(ALL_VARS);
        result
    }
}
