//! Query proposal for askdb
//!
//! Builds a constrained prompt from the schema registry, sends it to a
//! `ModelClient` and decodes the reply into a `QueryCandidate`.
//!
//! The model boundary is tagged: `ProposalOutcome` distinguishes a
//! candidate from a parse failure, a timeout and an unreachable endpoint.
//! Nothing here checks safety.

mod adapter;
mod client;
mod decode;
mod errors;
mod ollama;
mod prompt;

pub use adapter::QueryProposer;
pub use client::{ModelClient, ModelFailure, ModelFuture, ModelRequest};
pub use decode::{decode_reply, ProposalOutcome};
pub use errors::{GenerationError, GenerationResult};
pub use ollama::OllamaClient;
pub use prompt::PromptBuilder;
