//! CLI error types
//!
//! Every CLI error ends the process with a non-zero status after being
//! printed as `{"status":"error","code":...,"message":...}`.

use std::io;

use thiserror::Error;

use crate::config::ConfigError;
use crate::executor::StoreError;
use crate::pipeline::GatewayError;
use crate::schema::SchemaError;
use crate::validator::ValidationError;

/// CLI result type
pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Gateway(#[from] GatewayError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Model client setup failed: {0}")]
    Model(String),

    #[error("I/O error: {0}")]
    Io(String),

    #[error("Invalid input: {0}")]
    Input(String),

    #[error("Server failed: {0}")]
    Server(String),
}

impl CliError {
    pub fn code(&self) -> &'static str {
        match self {
            CliError::Config(e) => e.code(),
            CliError::Schema(e) => e.code(),
            CliError::Store(e) => e.code(),
            CliError::Gateway(e) => e.code(),
            CliError::Validation(e) => e.code(),
            CliError::Model(_) => "ASKDB_CLI_MODEL",
            CliError::Io(_) => "ASKDB_CLI_IO",
            CliError::Input(_) => "ASKDB_CLI_INPUT",
            CliError::Server(_) => "ASKDB_CLI_SERVER",
        }
    }
}

impl From<io::Error> for CliError {
    fn from(e: io::Error) -> Self {
        CliError::Io(e.to_string())
    }
}

impl From<serde_json::Error> for CliError {
    fn from(e: serde_json::Error) -> Self {
        CliError::Input(format!("JSON error: {}", e))
    }
}
