//! CLI command implementations
//!
//! Startup order for commands that need the full pipeline:
//! config → schema registry → document store → model client → audit log.
//! A missing data directory is not fatal; the store starts empty.

use std::path::Path;
use std::sync::Arc;

use serde_json::{json, Value};

use crate::config::Config;
use crate::executor::{MemoryStore, QueryExecutor};
use crate::http_server::HttpServer;
use crate::observability::{
    log_event_with_fields, AuditLog, Event, FileAuditLog, Logger, MemoryAuditLog, Severity,
};
use crate::pipeline::QueryGateway;
use crate::proposal::{OllamaClient, PromptBuilder, QueryProposer};
use crate::query::classify;
use crate::schema::{SchemaLoader, SchemaRegistry};

use super::args::{Cli, Command};
use super::errors::{CliError, CliResult};
use super::io::{read_request, write_response};

/// Parse arguments and run the selected command
pub fn run() -> CliResult<()> {
    let cli = Cli::parse_args();
    run_command(cli.command)
}

pub fn run_command(cmd: Command) -> CliResult<()> {
    match cmd {
        Command::Serve { config, port } => serve(&config, port),
        Command::Ask { config, question } => ask(&config, &question.join(" ")),
        Command::Explain { config } => explain(config.as_deref()),
        Command::Validate { config } => validate(config.as_deref()),
        Command::Classify { text } => classify_text(&text.join(" ")),
        Command::Schema { config } => schema(&config),
        Command::Prompt { config, question } => prompt(&config, &question.join(" ")),
    }
}

/// Loads config for the long-running server, honoring `log_level`
fn load_server_config(path: &Path) -> CliResult<Config> {
    let config = Config::load(path)?;
    Logger::set_min_severity(config.log_severity().unwrap_or(Severity::Info));
    log_event_with_fields(Event::ConfigLoaded, &[("path", &path.display().to_string())]);
    Ok(config)
}

/// Loads config for a one-shot command. Stdout carries the command's
/// JSON result, so only errors are logged.
fn load_oneshot_config(path: Option<&Path>) -> CliResult<Config> {
    Logger::set_min_severity(Severity::Error);
    match path {
        Some(p) => Ok(Config::load(p)?),
        None => Ok(Config::default()),
    }
}

fn load_schema(config: &Config) -> CliResult<Arc<SchemaRegistry>> {
    let registry = SchemaLoader::load_or_builtin(config.schema_path().as_deref())?;
    let count = registry.collections().len().to_string();
    log_event_with_fields(Event::SchemaLoaded, &[("collections", &count)]);
    Ok(Arc::new(registry))
}

fn open_store(data_dir: &Path) -> CliResult<MemoryStore> {
    let dir = data_dir.display().to_string();
    if !data_dir.is_dir() {
        log_event_with_fields(Event::StoreMissing, &[("data_dir", &dir)]);
        return Ok(MemoryStore::new());
    }

    let store = MemoryStore::load_dir(data_dir)?;
    let names = store.collection_names()?.join(",");
    log_event_with_fields(Event::StoreLoaded, &[("collections", &names), ("data_dir", &dir)]);
    Ok(store)
}

/// Wires every component described by `config` into a gateway
pub fn build_gateway(config: &Config) -> CliResult<QueryGateway> {
    let schema = load_schema(config)?;
    let store = open_store(config.data_path())?;

    let client =
        OllamaClient::from_config(&config.model).map_err(|e| CliError::Model(e.to_string()))?;
    let proposer = QueryProposer::new(Arc::new(client), schema.clone(), config.model.timeout());

    let audit: Arc<dyn AuditLog> = match config.audit_path() {
        Some(path) => Arc::new(FileAuditLog::open(&path)?),
        None => Arc::new(MemoryAuditLog::new()),
    };

    Ok(
        QueryGateway::new(proposer, QueryExecutor::new(Arc::new(store)), schema)
            .with_strict_collections(config.strict_collections)
            .with_audit_log(audit),
    )
}

fn runtime() -> CliResult<tokio::runtime::Runtime> {
    tokio::runtime::Runtime::new()
        .map_err(|e| CliError::Server(format!("Failed to create tokio runtime: {}", e)))
}

/// Start the HTTP server
pub fn serve(config_path: &Path, port: Option<u16>) -> CliResult<()> {
    let mut config = load_server_config(config_path)?;
    if let Some(port) = port {
        config.http.port = port;
    }

    let gateway = build_gateway(&config)?;
    let server = HttpServer::new(config.http.clone(), gateway);

    runtime()?.block_on(async {
        server
            .start()
            .await
            .map_err(|e| CliError::Server(format!("HTTP server failed: {}", e)))
    })
}

/// Answer one question through the full pipeline
pub fn ask(config_path: &Path, question: &str) -> CliResult<()> {
    let config = load_oneshot_config(Some(config_path))?;
    let gateway = build_gateway(&config)?;

    let response = runtime()?.block_on(gateway.ask(question))?;
    write_response(serde_json::to_value(response)?)
}

/// Explain a candidate from stdin
pub fn explain(config_path: Option<&Path>) -> CliResult<()> {
    let config = load_oneshot_config(config_path)?;
    let gateway = build_gateway(&config)?;

    let candidate = read_request()?;
    write_response(serde_json::to_value(gateway.inspect(&candidate))?)
}

/// Run the safety gate on a candidate from stdin.
///
/// A rejection is reported as an error so the exit status reflects it.
pub fn validate(config_path: Option<&Path>) -> CliResult<()> {
    let config = load_oneshot_config(config_path)?;
    let candidate = read_request()?;
    write_response(validate_candidate(&config, &candidate)?)
}

fn validate_candidate(config: &Config, candidate: &Value) -> CliResult<Value> {
    let gateway = build_gateway(config)?;
    let safe = gateway.validate_value(candidate)?;
    Ok(json!({
        "accepted": true,
        "query": safe.candidate().to_value(),
    }))
}

pub fn classify_text(text: &str) -> CliResult<()> {
    write_response(json!({ "intent": classify(text) }))
}

/// Print the schema registry
pub fn schema(config_path: &Path) -> CliResult<()> {
    let config = load_oneshot_config(Some(config_path))?;
    let registry = load_schema(&config)?;
    write_response(serde_json::to_value(registry.as_ref())?)
}

/// Print the prompt for a question
pub fn prompt(config_path: &Path, question: &str) -> CliResult<()> {
    let config = load_oneshot_config(Some(config_path))?;
    let registry = load_schema(&config)?;
    let intent = classify(question);

    write_response(json!({
        "intent": intent,
        "prompt": PromptBuilder::new(&registry).build(question, intent),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn config_in(dir: &TempDir) -> Config {
        Config {
            data_dir: dir.path().join("data").display().to_string(),
            audit_log: Some(dir.path().join("audit.jsonl").display().to_string()),
            ..Config::default()
        }
    }

    #[test]
    fn test_build_gateway_with_missing_data_dir() {
        let dir = TempDir::new().unwrap();
        let config = config_in(&dir);

        let gateway = build_gateway(&config).unwrap();
        assert!(gateway.schema().contains("students"));
        assert!(dir.path().join("audit.jsonl").exists());
    }

    #[test]
    fn test_build_gateway_loads_collections() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("data")).unwrap();
        fs::write(dir.path().join("data/students.json"), r#"[{"name": "Asha"}]"#).unwrap();

        let gateway = build_gateway(&config_in(&dir)).unwrap();
        let report = gateway.inspect(&json!({
            "query_type": "find",
            "collection": "students",
            "query": {"name": "Asha"}
        }));
        assert!(report.validation.accepted);
    }

    #[test]
    fn test_build_gateway_rejects_bad_data_file() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("data")).unwrap();
        fs::write(dir.path().join("data/students.json"), "{}").unwrap();

        let err = build_gateway(&config_in(&dir)).unwrap_err();
        assert_eq!(err.code(), "ASKDB_STORE_MALFORMED");
    }

    #[test]
    fn test_validate_candidate() {
        let dir = TempDir::new().unwrap();
        let config = config_in(&dir);
        let accepted = validate_candidate(
            &config,
            &json!({"query_type": "count", "collection": "orders", "query": {}}),
        )
        .unwrap();
        assert_eq!(accepted["accepted"], true);

        let err = validate_candidate(
            &config,
            &json!({"query_type": "find", "collection": "orders", "query": {"$where": "1"}}),
        )
        .unwrap_err();
        assert_eq!(err.code(), "ASKDB_FORBIDDEN_OPERATOR");
    }

    #[test]
    fn test_validate_candidate_writes_audit_file() {
        let dir = TempDir::new().unwrap();
        let config = config_in(&dir);

        validate_candidate(
            &config,
            &json!({"query_type": "find", "collection": "orders", "query": {"$where": "1"}}),
        )
        .unwrap_err();
        validate_candidate(
            &config,
            &json!({"query_type": "count", "collection": "orders", "query": {}}),
        )
        .unwrap();

        let contents = fs::read_to_string(dir.path().join("audit.jsonl")).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("REJECTED"));
        assert!(lines[0].contains("ASKDB_FORBIDDEN_OPERATOR"));
        assert!(lines[1].contains("ACCEPTED"));
    }

    #[test]
    fn test_missing_config_file() {
        let err = ask(Path::new("/nonexistent/askdb.json"), "count orders").unwrap_err();
        assert_eq!(err.code(), "ASKDB_CONFIG_READ");
    }
}
