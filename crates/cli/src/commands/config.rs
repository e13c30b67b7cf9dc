use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use shoplist_core::config::AppConfig;
use toml::Value;

use crate::commands::load_app_config;

struct Field<'a> {
    key: &'static str,
    value: String,
    env_keys: &'a [&'static str],
}

pub fn run() -> String {
    let config = match load_app_config() {
        Ok(config) => config,
        Err(error) => return format!("config validation failed: {error}"),
    };

    let file_path = detect_config_path();
    let file_doc = file_path.as_deref().and_then(load_config_file_doc);

    let mut lines = vec!["effective config (source precedence: env > file > default):".to_string()];
    for field in fields(&config) {
        let source = field_source(&field, file_doc.as_ref(), file_path.as_deref());
        lines.push(format!("- {} = {} (source: {source})", field.key, field.value));
    }

    lines.join("\n")
}

fn fields(config: &AppConfig) -> Vec<Field<'static>> {
    let unset = || "<unset>".to_string();

    vec![
        Field {
            key: "backend.kind",
            value: config.backend.kind.as_str().to_string(),
            env_keys: &["SHOPLIST_BACKEND", "BACKEND"],
        },
        Field {
            key: "backend.timeout_secs",
            value: config.backend.timeout_secs.to_string(),
            env_keys: &["SHOPLIST_BACKEND_TIMEOUT_SECS"],
        },
        Field {
            key: "todo.database_url",
            value: config.todo.database_url.clone(),
            env_keys: &["SHOPLIST_TODO_DATABASE_URL"],
        },
        Field {
            key: "todo.max_connections",
            value: config.todo.max_connections.to_string(),
            env_keys: &["SHOPLIST_TODO_MAX_CONNECTIONS"],
        },
        Field {
            key: "home_assistant.base_url",
            value: config.home_assistant.base_url.clone().unwrap_or_else(unset),
            env_keys: &["SHOPLIST_HASS_BASE_URL"],
        },
        Field {
            key: "home_assistant.token",
            value: if config.home_assistant.token.is_some() {
                "<redacted>".to_string()
            } else {
                unset()
            },
            env_keys: &["SHOPLIST_HASS_TOKEN"],
        },
        Field {
            key: "skill.application_id",
            value: config.skill.application_id.clone().unwrap_or_else(unset),
            env_keys: &["SHOPLIST_SKILL_APPLICATION_ID"],
        },
        Field {
            key: "server.bind_address",
            value: config.server.bind_address.clone(),
            env_keys: &["SHOPLIST_SERVER_BIND_ADDRESS"],
        },
        Field {
            key: "server.port",
            value: config.server.port.to_string(),
            env_keys: &["SHOPLIST_SERVER_PORT"],
        },
        Field {
            key: "server.graceful_shutdown_secs",
            value: config.server.graceful_shutdown_secs.to_string(),
            env_keys: &["SHOPLIST_SERVER_GRACEFUL_SHUTDOWN_SECS"],
        },
        Field {
            key: "logging.level",
            value: config.logging.level.clone(),
            env_keys: &["SHOPLIST_LOGGING_LEVEL", "SHOPLIST_LOG_LEVEL"],
        },
        Field {
            key: "logging.format",
            value: format!("{:?}", config.logging.format).to_lowercase(),
            env_keys: &["SHOPLIST_LOGGING_FORMAT", "SHOPLIST_LOG_FORMAT"],
        },
    ]
}

fn detect_config_path() -> Option<PathBuf> {
    [PathBuf::from("shoplist.toml"), PathBuf::from("config/shoplist.toml")]
        .into_iter()
        .find(|path| path.exists())
}

fn load_config_file_doc(path: &Path) -> Option<Value> {
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(field: &Field<'_>, file_doc: Option<&Value>, file_path: Option<&Path>) -> String {
    if let Some(env_key) = field.env_keys.iter().find(|key| env::var_os(key).is_some()) {
        return format!("env ({env_key})");
    }

    if file_doc.is_some_and(|doc| contains_path(doc, field.key)) {
        let file_path = file_path
            .map(|path| path.display().to_string())
            .unwrap_or_else(|| "config file".to_string());
        return format!("file ({file_path})");
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
