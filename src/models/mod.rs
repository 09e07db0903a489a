//! Data models for the link import pipeline.

mod link;
mod outcome;

pub use link::{LinkEcho, LinkPayload, LinkRecord};
pub use outcome::{ImportOutcome, ImportSummary};
