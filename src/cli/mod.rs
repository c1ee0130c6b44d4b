//! CLI module for askdb
//!
//! - serve: start the HTTP server
//! - ask: one question through the full pipeline
//! - explain / validate: inspect a candidate from stdin
//! - classify / schema / prompt: show what the pipeline would use

mod args;
mod commands;
mod errors;
mod io;

pub use args::{Cli, Command};
pub use commands::{build_gateway, run, run_command};
pub use errors::{CliError, CliResult};
pub use io::{read_request, write_error, write_response};
