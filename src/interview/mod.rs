//! Mom Test interview engine.
//!
//! An `InterviewSession` walks a respondent through each founder problem:
//! resonance rating, story, value-prop pitch, optional price test, follow-up
//! intent, and an LLM summary at the close of every problem.

pub mod config;
pub mod export;
pub mod host;
pub mod machine;
pub mod record;
pub mod routes;
pub mod script;
pub mod state;
pub mod summary;

#[cfg(test)]
pub(crate) mod test_support;

pub use config::{FounderInputs, SessionConfig};
pub use export::{InterviewStats, TranscriptDocument, export};
pub use host::{SessionHost, TurnOutcome};
pub use machine::InterviewSession;
pub use record::{ResponseKind, ResponseLog, ResponsePayload, ResponseRecord};
pub use routes::{InterviewRouteState, interview_routes};
pub use script::{ScriptCatalog, ScriptKey};
pub use state::Stage;
pub use summary::{LlmSummarizer, Summarizer, SummaryConfig};
