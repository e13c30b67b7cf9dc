use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub backend: BackendConfig,
    pub todo: TodoConfig,
    pub home_assistant: HomeAssistantConfig,
    pub skill: SkillConfig,
    pub server: ServerConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug)]
pub struct BackendConfig {
    pub kind: BackendKind,
    pub timeout_secs: u64,
}

impl BackendConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Clone, Debug)]
pub struct TodoConfig {
    pub database_url: String,
    pub max_connections: u32,
}

#[derive(Clone, Debug)]
pub struct HomeAssistantConfig {
    pub base_url: Option<String>,
    pub token: Option<SecretString>,
}

#[derive(Clone, Debug)]
pub struct SkillConfig {
    pub application_id: Option<String>,
}

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub bind_address: String,
    pub port: u16,
    pub graceful_shutdown_secs: u64,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    #[serde(alias = "todo")]
    TodoList,
    #[serde(alias = "hass")]
    HomeAssistant,
    Memory,
}

impl BackendKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TodoList => "to_do_list",
            Self::HomeAssistant => "home_assistant",
            Self::Memory => "memory",
        }
    }
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
    pub backend_kind: Option<BackendKind>,
    pub backend_timeout_secs: Option<u64>,
    pub todo_database_url: Option<String>,
    pub hass_base_url: Option<String>,
    pub hass_token: Option<String>,
    pub application_id: Option<String>,
    pub log_level: Option<String>,
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
            backend: BackendConfig { kind: BackendKind::TodoList, timeout_secs: 5 },
            todo: TodoConfig {
                database_url: "sqlite://shoplist.db?mode=rwc".to_string(),
                max_connections: 5,
            },
            home_assistant: HomeAssistantConfig { base_url: None, token: None },
            skill: SkillConfig { application_id: None },
            server: ServerConfig {
                bind_address: "127.0.0.1".to_string(),
                port: 8080,
                graceful_shutdown_secs: 15,
            },
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

fn secret_value(value: String) -> SecretString {
    value.into()
}

impl std::str::FromStr for BackendKind {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "todo" | "to_do_list" | "to-do-list" => Ok(Self::TodoList),
            "hass" | "home_assistant" | "home-assistant" => Ok(Self::HomeAssistant),
            "memory" => Ok(Self::Memory),
            other => Err(ConfigError::Validation(format!(
                "unsupported backend `{other}` (expected todo|hass|memory)"
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

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        } else if options.require_file {
            let expected = options.config_path.unwrap_or_else(|| PathBuf::from("shoplist.toml"));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(backend) = patch.backend {
            if let Some(kind) = backend.kind {
                self.backend.kind = kind;
            }
            if let Some(timeout_secs) = backend.timeout_secs {
                self.backend.timeout_secs = timeout_secs;
            }
        }

        if let Some(todo) = patch.todo {
            if let Some(database_url) = todo.database_url {
                self.todo.database_url = database_url;
            }
            if let Some(max_connections) = todo.max_connections {
                self.todo.max_connections = max_connections;
            }
        }

        if let Some(home_assistant) = patch.home_assistant {
            if let Some(base_url) = home_assistant.base_url {
                self.home_assistant.base_url = Some(base_url);
            }
            if let Some(token) = home_assistant.token {
                self.home_assistant.token = Some(secret_value(token));
            }
        }

        if let Some(skill) = patch.skill {
            if let Some(application_id) = skill.application_id {
                self.skill.application_id = Some(application_id);
            }
        }

        if let Some(server) = patch.server {
            if let Some(bind_address) = server.bind_address {
                self.server.bind_address = bind_address;
            }
            if let Some(port) = server.port {
                self.server.port = port;
            }
            if let Some(graceful_shutdown_secs) = server.graceful_shutdown_secs {
                self.server.graceful_shutdown_secs = graceful_shutdown_secs;
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
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        // `BACKEND` is the variable older deployments set.
        let backend = read_env("SHOPLIST_BACKEND").or_else(|| read_env("BACKEND"));
        if let Some(value) = backend {
            self.backend.kind = value.parse()?;
        }
        if let Some(value) = read_env("SHOPLIST_BACKEND_TIMEOUT_SECS") {
            self.backend.timeout_secs = parse_u64("SHOPLIST_BACKEND_TIMEOUT_SECS", &value)?;
        }

        if let Some(value) = read_env("SHOPLIST_TODO_DATABASE_URL") {
            self.todo.database_url = value;
        }
        if let Some(value) = read_env("SHOPLIST_TODO_MAX_CONNECTIONS") {
            self.todo.max_connections = parse_u32("SHOPLIST_TODO_MAX_CONNECTIONS", &value)?;
        }

        if let Some(value) = read_env("SHOPLIST_HASS_BASE_URL") {
            self.home_assistant.base_url = Some(value);
        }
        if let Some(value) = read_env("SHOPLIST_HASS_TOKEN") {
            self.home_assistant.token = Some(secret_value(value));
        }

        if let Some(value) = read_env("SHOPLIST_SKILL_APPLICATION_ID") {
            self.skill.application_id = Some(value);
        }

        if let Some(value) = read_env("SHOPLIST_SERVER_BIND_ADDRESS") {
            self.server.bind_address = value;
        }
        if let Some(value) = read_env("SHOPLIST_SERVER_PORT") {
            self.server.port = parse_u16("SHOPLIST_SERVER_PORT", &value)?;
        }
        if let Some(value) = read_env("SHOPLIST_SERVER_GRACEFUL_SHUTDOWN_SECS") {
            self.server.graceful_shutdown_secs =
                parse_u64("SHOPLIST_SERVER_GRACEFUL_SHUTDOWN_SECS", &value)?;
        }

        let log_level =
            read_env("SHOPLIST_LOGGING_LEVEL").or_else(|| read_env("SHOPLIST_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format =
            read_env("SHOPLIST_LOGGING_FORMAT").or_else(|| read_env("SHOPLIST_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(kind) = overrides.backend_kind {
            self.backend.kind = kind;
        }
        if let Some(timeout_secs) = overrides.backend_timeout_secs {
            self.backend.timeout_secs = timeout_secs;
        }
        if let Some(database_url) = overrides.todo_database_url {
            self.todo.database_url = database_url;
        }
        if let Some(base_url) = overrides.hass_base_url {
            self.home_assistant.base_url = Some(base_url);
        }
        if let Some(token) = overrides.hass_token {
            self.home_assistant.token = Some(secret_value(token));
        }
        if let Some(application_id) = overrides.application_id {
            self.skill.application_id = Some(application_id);
        }
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_backend(&self.backend)?;
        match self.backend.kind {
            BackendKind::TodoList => validate_todo(&self.todo)?,
            BackendKind::HomeAssistant => validate_home_assistant(&self.home_assistant)?,
            BackendKind::Memory => {}
        }
        validate_skill(&self.skill)?;
        validate_server(&self.server)?;
        validate_logging(&self.logging)?;
        Ok(())
    }
}

fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    [PathBuf::from("shoplist.toml"), PathBuf::from("config/shoplist.toml")]
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

fn validate_backend(backend: &BackendConfig) -> Result<(), ConfigError> {
    if backend.timeout_secs == 0 || backend.timeout_secs > 60 {
        return Err(ConfigError::Validation(
            "backend.timeout_secs must be in range 1..=60".to_string(),
        ));
    }
    Ok(())
}

fn validate_todo(todo: &TodoConfig) -> Result<(), ConfigError> {
    let url = todo.database_url.trim();
    let sqlite_url =
        url.starts_with("sqlite://") || url.starts_with("sqlite::") || url == ":memory:";
    if !sqlite_url {
        return Err(ConfigError::Validation(
            "todo.database_url must be a sqlite URL (`sqlite://...`, `sqlite::...`, or `:memory:`)"
                .to_string(),
        ));
    }

    if todo.max_connections == 0 {
        return Err(ConfigError::Validation(
            "todo.max_connections must be greater than zero".to_string(),
        ));
    }

    Ok(())
}

fn validate_home_assistant(home_assistant: &HomeAssistantConfig) -> Result<(), ConfigError> {
    let base_url = home_assistant.base_url.as_deref().map(str::trim).unwrap_or_default();
    if base_url.is_empty() {
        return Err(ConfigError::Validation(
            "home_assistant.base_url is required when backend.kind = home_assistant".to_string(),
        ));
    }
    if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
        return Err(ConfigError::Validation(
            "home_assistant.base_url must start with http:// or https://".to_string(),
        ));
    }

    let missing_token = home_assistant
        .token
        .as_ref()
        .map(|value| value.expose_secret().trim().is_empty())
        .unwrap_or(true);
    if missing_token {
        return Err(ConfigError::Validation(
            "home_assistant.token is required. Create a long-lived access token under your Home Assistant profile".to_string(),
        ));
    }

    Ok(())
}

fn validate_skill(skill: &SkillConfig) -> Result<(), ConfigError> {
    if let Some(application_id) = &skill.application_id {
        if application_id.trim().is_empty() {
            return Err(ConfigError::Validation(
                "skill.application_id must not be blank when set".to_string(),
            ));
        }
    }
    Ok(())
}

fn validate_server(server: &ServerConfig) -> Result<(), ConfigError> {
    if server.port == 0 {
        return Err(ConfigError::Validation("server.port must be greater than zero".to_string()));
    }

    if server.graceful_shutdown_secs == 0 {
        return Err(ConfigError::Validation(
            "server.graceful_shutdown_secs must be greater than zero".to_string(),
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
    backend: Option<BackendPatch>,
    todo: Option<TodoPatch>,
    home_assistant: Option<HomeAssistantPatch>,
    skill: Option<SkillPatch>,
    server: Option<ServerPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct BackendPatch {
    kind: Option<BackendKind>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct TodoPatch {
    database_url: Option<String>,
    max_connections: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
struct HomeAssistantPatch {
    base_url: Option<String>,
    token: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct SkillPatch {
    application_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ServerPatch {
    bind_address: Option<String>,
    port: Option<u16>,
    graceful_shutdown_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}
