//! Audit trail of safety-gate decisions
//!
//! Every candidate that reaches the validator produces exactly one record,
//! accepted or rejected. The file log is append-only, one JSON record per
//! line. The memory log is bounded and serves `/observability/audit`.

use std::collections::VecDeque;
use std::fmt;
use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, SyncSender};
use std::sync::Mutex;
use std::thread::{self, JoinHandle};

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::query::QueryCandidate;

use super::{log_event_with_fields, Event};

/// Gate decision
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AuditOutcome {
    Accepted,
    Rejected,
}

impl AuditOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditOutcome::Accepted => "ACCEPTED",
            AuditOutcome::Rejected => "REJECTED",
        }
    }
}

impl fmt::Display for AuditOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single audit record
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuditRecord {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    /// Hex SHA-256 of the candidate JSON with keys sorted
    pub fingerprint: String,
    pub collection: String,
    pub query_type: String,
    pub outcome: AuditOutcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl AuditRecord {
    pub fn for_candidate(candidate: &QueryCandidate, outcome: AuditOutcome) -> Self {
        Self::for_value(&candidate.to_value(), outcome)
    }

    /// Record for raw candidate JSON that may not decode
    pub fn for_value(value: &Value, outcome: AuditOutcome) -> Self {
        let text = |key: &str| {
            value
                .get(key)
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string()
        };

        Self {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            fingerprint: fingerprint(value),
            collection: text("collection"),
            query_type: text("query_type"),
            outcome,
            code: None,
            reason: None,
        }
    }

    pub fn with_reason(mut self, code: impl Into<String>, reason: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self.reason = Some(reason.into());
        self
    }

    /// One JSON line, no trailing newline
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| format!("{{\"id\":\"{}\"}}", self.id))
    }
}

/// SHA-256 over the key-sorted serialization of `value`
pub fn fingerprint(value: &Value) -> String {
    let canonical = canonicalize(value).to_string();
    let digest = Sha256::digest(canonical.as_bytes());
    digest.iter().map(|b| format!("{:02x}", b)).collect()
}

fn canonicalize(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            let mut sorted = Map::new();
            for key in keys {
                sorted.insert(key.clone(), canonicalize(&map[key.as_str()]));
            }
            Value::Object(sorted)
        }
        Value::Array(items) => Value::Array(items.iter().map(canonicalize).collect()),
        other => other.clone(),
    }
}

/// Records kept by a `MemoryAuditLog` unless configured otherwise
pub const MEMORY_AUDIT_CAPACITY: usize = 1024;

/// Pending lines a `FileAuditLog` accepts before `append` waits for the writer
const WRITER_QUEUE_DEPTH: usize = 1024;

fn poisoned() -> io::Error {
    io::Error::new(io::ErrorKind::Other, "Lock poisoned")
}

fn writer_gone() -> io::Error {
    io::Error::new(io::ErrorKind::BrokenPipe, "Audit writer stopped")
}

pub trait AuditLog: Send + Sync {
    fn append(&self, record: &AuditRecord) -> io::Result<()>;

    /// Up to `limit` most recent records, oldest first. Logs that keep
    /// nothing in memory return none.
    fn recent(&self, _limit: usize) -> Vec<AuditRecord> {
        Vec::new()
    }
}

enum WriterMessage {
    Line(String),
    Sync(SyncSender<io::Result<()>>),
}

/// Append-only JSON-lines audit file.
///
/// Lines are written and fsynced on a dedicated writer thread, so `append`
/// never blocks on the disk. `sync` waits until every earlier record is
/// durable; dropping the log drains the queue first.
pub struct FileAuditLog {
    path: PathBuf,
    sender: Option<SyncSender<WriterMessage>>,
    worker: Option<JoinHandle<()>>,
}

impl FileAuditLog {
    pub fn open(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new().create(true).append(true).open(&path)?;

        let (sender, receiver) = mpsc::sync_channel(WRITER_QUEUE_DEPTH);
        let worker = thread::Builder::new()
            .name("askdb-audit".to_string())
            .spawn(move || write_loop(BufWriter::new(file), receiver))?;

        Ok(Self {
            path,
            sender: Some(sender),
            worker: Some(worker),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Blocks until every record appended so far is on disk
    pub fn sync(&self) -> io::Result<()> {
        let (reply, done) = mpsc::sync_channel(1);
        self.send(WriterMessage::Sync(reply))?;
        done.recv().map_err(|_| writer_gone())?
    }

    fn send(&self, message: WriterMessage) -> io::Result<()> {
        self.sender
            .as_ref()
            .ok_or_else(writer_gone)?
            .send(message)
            .map_err(|_| writer_gone())
    }
}

fn write_loop(mut writer: BufWriter<File>, receiver: Receiver<WriterMessage>) {
    for message in receiver {
        match message {
            WriterMessage::Line(line) => {
                if let Err(e) = write_durable(&mut writer, &line) {
                    log_event_with_fields(Event::AuditWriteFailed, &[("reason", &e.to_string())]);
                }
            }
            WriterMessage::Sync(reply) => {
                let result = writer.flush().and_then(|_| writer.get_ref().sync_all());
                let _ = reply.send(result);
            }
        }
    }
}

fn write_durable(writer: &mut BufWriter<File>, line: &str) -> io::Result<()> {
    writeln!(writer, "{}", line)?;
    writer.flush()?;
    writer.get_ref().sync_all()
}

impl AuditLog for FileAuditLog {
    /// Queues the record for the writer thread
    fn append(&self, record: &AuditRecord) -> io::Result<()> {
        self.send(WriterMessage::Line(record.to_json()))
    }
}

impl Drop for FileAuditLog {
    fn drop(&mut self) {
        self.sender.take();
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

/// In-memory audit log holding the newest `capacity` records
#[derive(Debug)]
pub struct MemoryAuditLog {
    capacity: usize,
    records: Mutex<VecDeque<AuditRecord>>,
}

impl Default for MemoryAuditLog {
    fn default() -> Self {
        Self::with_capacity(MEMORY_AUDIT_CAPACITY)
    }
}

impl MemoryAuditLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Oldest records are dropped once `capacity` is reached
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            records: Mutex::new(VecDeque::with_capacity(capacity.min(MEMORY_AUDIT_CAPACITY))),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Copy of every retained record; empty if the lock is poisoned
    pub fn records(&self) -> Vec<AuditRecord> {
        self.recent(self.capacity)
    }

    pub fn len(&self) -> usize {
        self.records.lock().map(|r| r.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl AuditLog for MemoryAuditLog {
    fn append(&self, record: &AuditRecord) -> io::Result<()> {
        let mut records = self.records.lock().map_err(|_| poisoned())?;
        while records.len() >= self.capacity {
            records.pop_front();
        }
        records.push_back(record.clone());
        Ok(())
    }

    fn recent(&self, limit: usize) -> Vec<AuditRecord> {
        self.records
            .lock()
            .map(|records| {
                let skip = records.len().saturating_sub(limit);
                records.iter().skip(skip).cloned().collect()
            })
            .unwrap_or_default()
    }
}
