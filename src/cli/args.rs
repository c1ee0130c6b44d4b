//! CLI argument definitions using clap
//!
//! Commands:
//! - askdb serve --config <path> [--port <p>]
//! - askdb ask --config <path> <question...>
//! - askdb explain [--config <path>]   (candidate JSON on stdin)
//! - askdb validate [--config <path>]  (candidate JSON on stdin)
//! - askdb classify <text...>
//! - askdb schema --config <path>
//! - askdb prompt --config <path> <question...>

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// askdb - ask a document store questions in plain language
#[derive(Parser, Debug)]
#[command(name = "askdb")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, PartialEq)]
pub enum Command {
    /// Start the HTTP server
    Serve {
        #[arg(long, default_value = "./askdb.json")]
        config: PathBuf,

        /// Overrides http.port from the config file
        #[arg(long)]
        port: Option<u16>,
    },

    /// Answer one question and exit
    Ask {
        #[arg(long, default_value = "./askdb.json")]
        config: PathBuf,

        #[arg(required = true, num_args = 1..)]
        question: Vec<String>,
    },

    /// Explain a candidate read from stdin without executing it
    Explain {
        /// Built-in defaults when omitted
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Run the safety gate on a candidate read from stdin
    Validate {
        /// Built-in defaults when omitted
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Print the intent of some text
    Classify {
        #[arg(required = true, num_args = 1..)]
        text: Vec<String>,
    },

    /// Print the schema registry
    Schema {
        #[arg(long, default_value = "./askdb.json")]
        config: PathBuf,
    },

    /// Print the prompt that would be sent to the model
    Prompt {
        #[arg(long, default_value = "./askdb.json")]
        config: PathBuf,

        #[arg(required = true, num_args = 1..)]
        question: Vec<String>,
    },
}

impl Cli {
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
