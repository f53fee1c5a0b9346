//! Chat layer: canned QA, PII guard, the rule-based responder, and the
//! delegated LLM client.

pub mod canned;
pub mod llm;
pub mod pii;
pub mod responder;
pub mod rules;

pub use canned::CannedQa;
pub use llm::{LlmClient, LlmError};
pub use pii::{PII_REFUSAL, contains_pii};
pub use responder::{ChatResponder, QaPair, RATE_LIMITED_REPLY};
