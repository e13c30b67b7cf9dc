use serde::Serialize;
use shoplist_backends::build_backend;
use shoplist_core::config::{AppConfig, BackendKind};
use shoplist_core::BackendError;

use crate::commands::{escape_json, load_app_config, CommandResult, CONFIG_EXIT};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
enum CheckStatus {
    Pass,
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
    let report = build_report();
    let exit_code = if report.overall_status == CheckStatus::Pass { 0 } else { CONFIG_EXIT };

    let output = if json_output {
        serde_json::to_string_pretty(&report).unwrap_or_else(|error| {
            format!(
                "{{\"overall_status\":\"fail\",\"summary\":\"doctor serialization failed\",\"error\":\"{}\"}}",
                escape_json(&error.to_string())
            )
        })
    } else {
        render_human(&report)
    };

    CommandResult { exit_code, output }
}

fn build_report() -> DoctorReport {
    let mut checks = Vec::new();

    match load_app_config() {
        Ok(config) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Pass,
                details: format!(
                    "configuration loaded and validated (backend `{}`)",
                    config.backend.kind.as_str()
                ),
            });
            checks.push(check_application_id(&config));
            checks.push(check_backend_reachability(&config));
        }
        Err(error) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Fail,
                details: error.to_string(),
            });
            for name in ["application_id", "backend_reachability"] {
                checks.push(DoctorCheck {
                    name,
                    status: CheckStatus::Skipped,
                    details: "skipped because configuration did not load".to_string(),
                });
            }
        }
    }

    let failed = checks.iter().any(|check| check.status == CheckStatus::Fail);
    let overall_status = if failed { CheckStatus::Fail } else { CheckStatus::Pass };
    let summary = if failed {
        "doctor: one or more readiness checks failed".to_string()
    } else {
        "doctor: all readiness checks passed".to_string()
    };

    DoctorReport { overall_status, summary, checks }
}

fn check_application_id(config: &AppConfig) -> DoctorCheck {
    match config.skill.application_id.as_deref() {
        Some(application_id) => DoctorCheck {
            name: "application_id",
            status: CheckStatus::Pass,
            details: format!("requests for other applications than `{application_id}` are rejected"),
        },
        None => DoctorCheck {
            name: "application_id",
            status: CheckStatus::Skipped,
            details: "skill.application_id is unset; requests are accepted from any application"
                .to_string(),
        },
    }
}

fn check_backend_reachability(config: &AppConfig) -> DoctorCheck {
    let name = "backend_reachability";
    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(error) => {
            return DoctorCheck {
                name,
                status: CheckStatus::Fail,
                details: format!("failed to initialize async runtime: {error}"),
            };
        }
    };

    let timeout = config.backend.timeout();
    let result = runtime.block_on(async {
        let backend = build_backend(config)
            .await
            .map_err(|error| format!("failed to initialize backend: {error}"))?;
        let listed = match tokio::time::timeout(timeout, backend.list()).await {
            Ok(result) => result,
            Err(_elapsed) => Err(BackendError::Timeout(timeout)),
        };
        listed.map(|items| items.len()).map_err(|error| error.to_string())
    });

    match result {
        Ok(count) => DoctorCheck {
            name,
            status: CheckStatus::Pass,
            details: format!("{} answered with {count} item(s)", target(config)),
        },
        Err(details) => DoctorCheck { name, status: CheckStatus::Fail, details },
    }
}

fn target(config: &AppConfig) -> String {
    match config.backend.kind {
        BackendKind::TodoList => format!("to-do store at `{}`", config.todo.database_url),
        BackendKind::HomeAssistant => format!(
            "home assistant at `{}`",
            config.home_assistant.base_url.as_deref().unwrap_or("<unset>")
        ),
        BackendKind::Memory => "in-memory list".to_string(),
    }
}

fn render_human(report: &DoctorReport) -> String {
    let mut lines = vec![report.summary.clone()];

    for check in &report.checks {
        let marker = match check.status {
            CheckStatus::Pass => "ok",
            CheckStatus::Fail => "fail",
            CheckStatus::Skipped => "skip",
        };
        lines.push(format!("- [{marker}] {}: {}", check.name, check.details));
    }

    lines.join("\n")
}
