pub mod config;
pub mod doctor;
pub mod invoke;
pub mod migrate;

use serde::Serialize;
use shoplist_core::config::{AppConfig, ConfigError, LoadOptions};
use tokio::runtime::Runtime;

pub const CONFIG_EXIT: u8 = 2;
pub const RUNTIME_EXIT: u8 = 3;
pub const BACKEND_EXIT: u8 = 4;

/// What a command prints and the process exit code that goes with it.
#[derive(Debug, Clone)]
pub struct CommandResult {
    pub exit_code: u8,
    pub output: String,
}

#[derive(Debug, Serialize)]
struct CommandOutcome<'a> {
    command: &'a str,
    status: &'static str,
    error_class: Option<&'a str>,
    message: String,
}

impl CommandResult {
    pub fn success(command: &str, message: impl Into<String>) -> Self {
        let outcome =
            CommandOutcome { command, status: "ok", error_class: None, message: message.into() };
        Self { exit_code: 0, output: render(&outcome) }
    }

    pub fn failure(
        command: &str,
        error_class: &str,
        message: impl Into<String>,
        exit_code: u8,
    ) -> Self {
        let outcome = CommandOutcome {
            command,
            status: "error",
            error_class: Some(error_class),
            message: message.into(),
        };
        Self { exit_code, output: render(&outcome) }
    }
}

/// Reads `.env` from the working directory (or an ancestor) first. Variables
/// already present in the environment are not replaced.
pub(crate) fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    AppConfig::load(LoadOptions::default())
}

pub(crate) fn load_config(command: &str) -> Result<AppConfig, CommandResult> {
    load_app_config().map_err(|error| {
        CommandResult::failure(
            command,
            "config_validation",
            format!("configuration issue: {error}"),
            CONFIG_EXIT,
        )
    })
}

pub(crate) fn runtime(command: &str) -> Result<Runtime, CommandResult> {
    tokio::runtime::Builder::new_current_thread().enable_all().build().map_err(|error| {
        CommandResult::failure(
            command,
            "runtime_init",
            format!("failed to initialize async runtime: {error}"),
            RUNTIME_EXIT,
        )
    })
}

fn render(outcome: &CommandOutcome<'_>) -> String {
    serde_json::to_string(outcome).unwrap_or_else(|error| {
        format!(
            "{{\"command\":\"{}\",\"status\":\"error\",\"error_class\":\"serialization\",\"message\":\"{}\"}}",
            escape_json(outcome.command),
            escape_json(&error.to_string())
        )
    })
}

pub(crate) fn escape_json(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}
