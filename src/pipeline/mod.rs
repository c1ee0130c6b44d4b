//! Request orchestration
//!
//! `QueryGateway` owns the control flow for one question:
//!
//! 1. classify the question's intent
//! 2. ask the model for a candidate
//! 3. pass the candidate through the safety gate
//! 4. execute the validated query
//!
//! Any stage failure ends the request with that stage's error. A rejected
//! candidate is never replaced by a default query.

mod errors;
mod gateway;
mod response;

pub use errors::{GatewayError, GatewayResult};
pub use gateway::QueryGateway;
pub use response::{GatewayResponse, InspectReport, ValidationVerdict};
