use kunan_core::config::{AppConfig, LoadOptions, StorageBackend};
use serde::Serialize;

use crate::commands::CommandResult;

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
    let report = build_report(AppConfig::load(LoadOptions::default()).map_err(|e| e.to_string()));
    let exit_code = if report.overall_status == CheckStatus::Pass { 0 } else { 1 };

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

fn build_report(loaded: Result<AppConfig, String>) -> DoctorReport {
    let mut checks = Vec::new();

    match loaded {
        Ok(config) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Pass,
                details: "configuration loaded and validated".to_string(),
            });
            checks.push(check_completion(&config));
            checks.push(check_order_store(&config));
        }
        Err(error) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Fail,
                details: error,
            });
            for name in ["completion_readiness", "order_store_readiness"] {
                checks.push(DoctorCheck {
                    name,
                    status: CheckStatus::Skipped,
                    details: "skipped because configuration did not load".to_string(),
                });
            }
        }
    }

    let all_pass = checks.iter().all(|check| check.status == CheckStatus::Pass);
    let overall_status = if all_pass { CheckStatus::Pass } else { CheckStatus::Fail };
    let summary = if all_pass {
        "doctor: all readiness checks passed".to_string()
    } else {
        "doctor: one or more readiness checks failed".to_string()
    };

    DoctorReport { overall_status, summary, checks }
}

fn check_completion(config: &AppConfig) -> DoctorCheck {
    if config.integration_status().completion_configured {
        DoctorCheck {
            name: "completion_readiness",
            status: CheckStatus::Pass,
            details: format!("api key set for `{}` at {}", config.llm.model, config.llm.base_url),
        }
    } else {
        DoctorCheck {
            name: "completion_readiness",
            status: CheckStatus::Fail,
            details: "llm.api_key is not set (KUNAN_LLM_API_KEY or GROQ_API_KEY)".to_string(),
        }
    }
}

fn check_order_store(config: &AppConfig) -> DoctorCheck {
    let storage = &config.storage;
    match storage.backend {
        StorageBackend::Memory => DoctorCheck {
            name: "order_store_readiness",
            status: CheckStatus::Pass,
            details: "in-memory order store; orders are lost on exit".to_string(),
        },
        StorageBackend::Document if config.integration_status().storage_configured => {
            DoctorCheck {
                name: "order_store_readiness",
                status: CheckStatus::Pass,
                details: format!(
                    "document store `{}/{}` configured",
                    storage.database_id, storage.collection_id
                ),
            }
        }
        StorageBackend::Document => {
            let mut missing = Vec::new();
            if storage.endpoint.is_none() {
                missing.push("storage.endpoint");
            }
            if storage.project_id.is_none() {
                missing.push("storage.project_id");
            }
            if storage.api_key.is_none() {
                missing.push("storage.api_key");
            }
            DoctorCheck {
                name: "order_store_readiness",
                status: CheckStatus::Fail,
                details: format!("missing {}", missing.join(", ")),
            }
        }
    }
}

fn render_human(report: &DoctorReport) -> String {
    let mut lines = Vec::new();
    lines.push(report.summary.clone());

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

fn escape_json(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}
