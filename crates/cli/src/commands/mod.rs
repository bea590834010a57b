pub mod catalog;
pub mod config;
pub mod configure;
pub mod migrate;
pub mod quotes;
pub mod seed;

use configurator_core::config::{AppConfig, LoadOptions};
use configurator_core::errors::{ApplicationError, InterfaceError};
use configurator_db::{connect_with_config, migrations, DbPool};
use serde::Serialize;
use serde_json::Value;
use tokio::runtime::Runtime;

pub const EXIT_CONFIG: u8 = 2;
pub const EXIT_RUNTIME: u8 = 3;
pub const EXIT_DB_CONNECTIVITY: u8 = 4;
pub const EXIT_MIGRATION: u8 = 5;
pub const EXIT_VALIDATION: u8 = 6;
pub const EXIT_PERSISTENCE: u8 = 7;

/// Error class, message and exit code of a failed command step.
pub type CommandFailure = (&'static str, String, u8);

#[derive(Debug, Clone)]
pub struct CommandResult {
    pub exit_code: u8,
    pub output: String,
}

#[derive(Debug, Serialize)]
struct CommandOutcome {
    command: String,
    status: String,
    error_class: Option<String>,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<Value>,
}

impl CommandResult {
    pub fn success(command: &str, message: impl Into<String>) -> Self {
        Self::success_with_data(command, message, None)
    }

    pub fn success_with_data(
        command: &str,
        message: impl Into<String>,
        data: Option<Value>,
    ) -> Self {
        let payload = CommandOutcome {
            command: command.to_string(),
            status: "ok".to_string(),
            error_class: None,
            message: message.into(),
            data,
        };
        Self { exit_code: 0, output: serialize_payload(payload) }
    }

    pub fn failure(
        command: &str,
        error_class: &str,
        message: impl Into<String>,
        exit_code: u8,
    ) -> Self {
        let payload = CommandOutcome {
            command: command.to_string(),
            status: "error".to_string(),
            error_class: Some(error_class.to_string()),
            message: message.into(),
            data: None,
        };
        Self { exit_code, output: serialize_payload(payload) }
    }

    pub fn from_failure(command: &str, (error_class, message, exit_code): CommandFailure) -> Self {
        Self::failure(command, error_class, message, exit_code)
    }
}

fn serialize_payload(payload: CommandOutcome) -> String {
    serde_json::to_string(&payload).unwrap_or_else(|error| {
        format!(
            "{{\"command\":\"unknown\",\"status\":\"error\",\"error_class\":\"serialization\",\"message\":\"{}\"}}",
            error.to_string().replace('\\', "\\\\").replace('"', "\\\"")
        )
    })
}

pub(crate) fn load_config() -> Result<AppConfig, CommandFailure> {
    AppConfig::load(LoadOptions::default()).map_err(|error| {
        ("config_validation", format!("configuration issue: {error}"), EXIT_CONFIG)
    })
}

pub(crate) fn build_runtime() -> Result<Runtime, CommandFailure> {
    tokio::runtime::Builder::new_current_thread().enable_all().build().map_err(|error| {
        ("runtime_init", format!("failed to initialize async runtime: {error}"), EXIT_RUNTIME)
    })
}

/// Connects and brings the schema up to date. Every data command goes through here.
pub(crate) async fn open_database(config: &AppConfig) -> Result<DbPool, CommandFailure> {
    let pool = connect_with_config(&config.database)
        .await
        .map_err(|error| ("db_connectivity", error.to_string(), EXIT_DB_CONNECTIVITY))?;
    migrations::run_pending(&pool)
        .await
        .map_err(|error| ("migration", error.to_string(), EXIT_MIGRATION))?;
    Ok(pool)
}

/// Maps core errors through the interface layer, so the payload carries the operator-facing
/// hint, the detail and the correlation id of the run.
pub(crate) fn application_failure(
    correlation_id: &str,
) -> impl Fn(ApplicationError) -> CommandFailure + '_ {
    move |error| {
        let interface = error.into_interface(correlation_id);
        let (class, code) = match &interface {
            InterfaceError::BadRequest { .. } => ("domain_validation", EXIT_VALIDATION),
            InterfaceError::ServiceUnavailable { .. } => ("persistence", EXIT_PERSISTENCE),
            InterfaceError::Internal { .. } => ("internal", EXIT_RUNTIME),
        };
        let message =
            format!("{} ({interface}; correlation_id={correlation_id})", interface.user_message());
        (class, message, code)
    }
}

pub(crate) fn to_data<T: Serialize>(value: &T) -> Result<Value, CommandFailure> {
    serde_json::to_value(value)
        .map_err(|error| ("serialization", error.to_string(), EXIT_VALIDATION))
}
