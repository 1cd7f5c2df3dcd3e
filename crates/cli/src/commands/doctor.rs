use serde::Serialize;

use showroom_core::config::{AppConfig, LoadOptions};
use showroom_db::{connect, migrations};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
enum CheckStatus {
    Pass,
    Fail,
    Skipped,
}

impl CheckStatus {
    fn marker(self) -> &'static str {
        match self {
            Self::Pass => "ok",
            Self::Fail => "fail",
            Self::Skipped => "skip",
        }
    }
}

#[derive(Debug, Serialize)]
struct ReadinessCheck {
    name: &'static str,
    status: CheckStatus,
    details: String,
}

impl ReadinessCheck {
    fn pass(name: &'static str, details: impl Into<String>) -> Self {
        Self { name, status: CheckStatus::Pass, details: details.into() }
    }

    fn fail(name: &'static str, details: impl Into<String>) -> Self {
        Self { name, status: CheckStatus::Fail, details: details.into() }
    }

    fn skipped(name: &'static str) -> Self {
        Self {
            name,
            status: CheckStatus::Skipped,
            details: "skipped because configuration did not load".to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
struct ReadinessReport {
    overall_status: CheckStatus,
    summary: String,
    checks: Vec<ReadinessCheck>,
}

pub fn run(json_output: bool) -> String {
    let report = build_report();

    if json_output {
        return serde_json::to_string_pretty(&report).unwrap_or_else(|error| {
            format!(
                "{{\"overall_status\":\"fail\",\"summary\":\"doctor serialization failed\",\"error\":\"{}\"}}",
                error.to_string().replace('\\', "\\\\").replace('"', "\\\"")
            )
        });
    }

    let mut lines = vec![report.summary.clone()];
    for check in &report.checks {
        lines.push(format!("- [{}] {}: {}", check.status.marker(), check.name, check.details));
    }
    lines.join("\n")
}

fn build_report() -> ReadinessReport {
    let checks = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => vec![
            ReadinessCheck::pass("config_validation", "configuration loaded and validated"),
            dealer_identity(&config),
            database_connectivity(&config),
        ],
        Err(error) => vec![
            ReadinessCheck::fail("config_validation", error.to_string()),
            ReadinessCheck::skipped("dealer_identity"),
            ReadinessCheck::skipped("database_connectivity"),
        ],
    };

    let all_pass = checks.iter().all(|check| check.status == CheckStatus::Pass);
    ReadinessReport {
        overall_status: if all_pass { CheckStatus::Pass } else { CheckStatus::Fail },
        summary: if all_pass {
            "doctor: all readiness checks passed".to_string()
        } else {
            "doctor: one or more readiness checks failed".to_string()
        },
        checks,
    }
}

fn dealer_identity(config: &AppConfig) -> ReadinessCheck {
    ReadinessCheck::pass(
        "dealer_identity",
        format!(
            "dealer `{}` ({}) in zone `{}`",
            config.dealer.dealer_code, config.dealer.dealer_name, config.dealer.zone
        ),
    )
}

fn database_connectivity(config: &AppConfig) -> ReadinessCheck {
    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(error) => {
            return ReadinessCheck::fail(
                "database_connectivity",
                format!("failed to initialize async runtime: {error}"),
            );
        }
    };

    let result = runtime.block_on(async {
        let pool = connect(&config.database)
            .await
            .map_err(|error| format!("failed to connect to database: {error}"))?;
        let applied = migrations::MIGRATOR.iter().len();
        pool.close().await;
        Ok::<usize, String>(applied)
    });

    match result {
        Ok(known_migrations) => ReadinessCheck::pass(
            "database_connectivity",
            format!(
                "connected using `{}` ({known_migrations} known migrations)",
                config.database.url
            ),
        ),
        Err(details) => ReadinessCheck::fail("database_connectivity", details),
    }
}
