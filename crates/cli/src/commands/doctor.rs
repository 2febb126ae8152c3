use foafrag_core::config::{AppConfig, LlmProvider, LoadOptions, StoreKind};
use serde::Serialize;

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

pub fn run(json_output: bool) -> String {
    let report = build_report();

    if json_output {
        return serde_json::to_string_pretty(&report).unwrap_or_else(|error| {
            format!(
                "{{\"overall_status\":\"fail\",\"summary\":\"doctor serialization failed\",\"error\":\"{}\"}}",
                escape_json(&error.to_string())
            )
        });
    }

    render_human(&report)
}

fn build_report() -> DoctorReport {
    let mut checks = Vec::new();

    match AppConfig::load(LoadOptions::default()) {
        Ok(config) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Pass,
                details: "configuration loaded and validated".to_string(),
            });
            checks.push(check_model_readiness(&config));
            checks.push(check_store_connectivity(&config));
        }
        Err(error) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Fail,
                details: error.to_string(),
            });
            checks.push(DoctorCheck {
                name: "model_readiness",
                status: CheckStatus::Skipped,
                details: "skipped because configuration did not load".to_string(),
            });
            checks.push(DoctorCheck {
                name: "store_connectivity",
                status: CheckStatus::Skipped,
                details: "skipped because configuration did not load".to_string(),
            });
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

fn check_model_readiness(config: &AppConfig) -> DoctorCheck {
    let needs_key = matches!(config.llm.provider, LlmProvider::OpenAi | LlmProvider::Gemini);
    if needs_key && config.llm.api_key.is_none() {
        return DoctorCheck {
            name: "model_readiness",
            status: CheckStatus::Fail,
            details: format!(
                "provider {:?} requires an api key (set FOAFRAG_LLM_API_KEY)",
                config.llm.provider
            ),
        };
    }
    DoctorCheck {
        name: "model_readiness",
        status: CheckStatus::Pass,
        details: format!("provider {:?}, model `{}`", config.llm.provider, config.llm.model),
    }
}

fn check_store_connectivity(config: &AppConfig) -> DoctorCheck {
    let runtime = match super::build_runtime() {
        Ok(runtime) => runtime,
        Err(error) => {
            return DoctorCheck {
                name: "store_connectivity",
                status: CheckStatus::Fail,
                details: error,
            };
        }
    };

    let store = match super::build_store(config) {
        Ok(store) => store,
        Err(error) => {
            return DoctorCheck {
                name: "store_connectivity",
                status: CheckStatus::Fail,
                details: error,
            };
        }
    };

    let endpoint = match config.store.kind {
        StoreKind::Graph => config.store.sparql_endpoint.clone(),
        StoreKind::Vector => config.store.vector_endpoint.clone(),
    };

    if runtime.block_on(store.test_connectivity()) {
        DoctorCheck {
            name: "store_connectivity",
            status: CheckStatus::Pass,
            details: format!("reached {:?} store at `{endpoint}`", config.store.kind),
        }
    } else {
        DoctorCheck {
            name: "store_connectivity",
            status: CheckStatus::Fail,
            details: format!("could not reach {:?} store at `{endpoint}`", config.store.kind),
        }
    }
}

fn render_human(report: &DoctorReport) -> String {
    let mut lines = vec![report.summary.clone()];
    for check in &report.checks {
        let marker = match check.status {
            CheckStatus::Pass => "ok",
            CheckStatus::Fail => "FAIL",
            CheckStatus::Skipped => "skip",
        };
        lines.push(format!("  [{marker}] {}: {}", check.name, check.details));
    }
    lines.join("\n")
}

fn escape_json(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}
