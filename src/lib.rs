//! askdb - natural-language questions over a read-only document store
//!
//! A question is classified, turned into a structured query by a language
//! model, checked against a read-only allow-list and only then executed.
//! Any candidate query can also be explained as SQL-like text, a risk tier
//! and optimization advice.

pub mod cli;
pub mod config;
pub mod executor;
pub mod explain;
pub mod http_server;
pub mod observability;
pub mod pipeline;
pub mod proposal;
pub mod query;
pub mod schema;
pub mod validator;
