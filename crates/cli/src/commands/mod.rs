pub mod doctor;
pub mod migrate;
pub mod seed;

use serde::Serialize;

use showroom_core::config::{AppConfig, LoadOptions};

/// Exit codes reported by the operator commands. Scripts key off these.
pub mod exit_codes {
    pub const CONFIG: u8 = 2;
    pub const RUNTIME: u8 = 3;
    pub const CONNECTIVITY: u8 = 4;
    pub const EXECUTION: u8 = 5;
    pub const VERIFICATION: u8 = 6;
}

#[derive(Debug, Clone)]
pub struct CommandResult {
    pub exit_code: u8,
    pub output: String,
}

#[derive(Debug, Serialize)]
struct OutcomePayload<'a> {
    command: &'a str,
    status: &'a str,
    error_class: Option<&'a str>,
    message: &'a str,
}

impl CommandResult {
    pub fn success(command: &str, message: impl AsRef<str>) -> Self {
        Self { exit_code: 0, output: render_payload(command, "ok", None, message.as_ref()) }
    }

    pub fn failure(
        command: &str,
        error_class: &str,
        message: impl AsRef<str>,
        exit_code: u8,
    ) -> Self {
        Self {
            exit_code,
            output: render_payload(command, "error", Some(error_class), message.as_ref()),
        }
    }
}

/// Shared first steps of every command: load configuration, then build the
/// single-threaded runtime the command drives its async work on.
pub(crate) fn prepare(
    command: &str,
) -> Result<(AppConfig, tokio::runtime::Runtime), CommandResult> {
    let config = AppConfig::load(LoadOptions::default()).map_err(|error| {
        CommandResult::failure(
            command,
            "config_validation",
            format!("configuration issue: {error}"),
            exit_codes::CONFIG,
        )
    })?;
    let runtime =
        tokio::runtime::Builder::new_current_thread().enable_all().build().map_err(|error| {
            CommandResult::failure(
                command,
                "runtime_init",
                format!("failed to initialize async runtime: {error}"),
                exit_codes::RUNTIME,
            )
        })?;
    Ok((config, runtime))
}

fn render_payload(command: &str, status: &str, error_class: Option<&str>, message: &str) -> String {
    let payload = OutcomePayload { command, status, error_class, message };
    serde_json::to_string(&payload).unwrap_or_else(|error| {
        format!(
            "{{\"command\":\"{command}\",\"status\":\"error\",\"error_class\":\"serialization\",\"message\":\"{}\"}}",
            error.to_string().replace('\\', "\\\\").replace('"', "\\\"")
        )
    })
}
