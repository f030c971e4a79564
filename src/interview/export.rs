//! Transcript export and interview statistics.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use super::config::SessionConfig;
use super::machine::InterviewSession;
use super::record::{ResponseKind, ResponseRecord};

/// Serializable snapshot of a session for the founder.
#[derive(Debug, Clone, Serialize)]
pub struct TranscriptDocument {
    pub session_id: Uuid,
    pub config: SessionConfig,
    pub responses: Vec<ResponseRecord>,
    /// When the document was produced, not when the interview ended.
    pub completed_at: DateTime<Utc>,
}

impl TranscriptDocument {
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Suggested file name, e.g. `interview_<id>.json`.
    pub fn file_name(&self) -> String {
        format!("interview_{}.json", self.session_id)
    }
}

/// Snapshot the session. Safe to call at any point; read-only.
pub fn export(session: &InterviewSession) -> TranscriptDocument {
    TranscriptDocument {
        session_id: session.session_id(),
        config: session.config().clone(),
        responses: session.responses().all().to_vec(),
        completed_at: Utc::now(),
    }
}

/// Counts and time span of a session's recorded answers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InterviewStats {
    pub session_id: Uuid,
    pub total_problems: usize,
    pub total_responses: usize,
    /// Problems that received a resonance rating.
    pub problem_responses: usize,
    pub summaries: usize,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
}

impl InterviewStats {
    pub fn from_session(session: &InterviewSession) -> Self {
        let log = session.responses();
        Self {
            session_id: session.session_id(),
            total_problems: session.config().problems().len(),
            total_responses: log.len(),
            problem_responses: log.total_for_kind(ResponseKind::ProblemResonance),
            summaries: log.total_for_kind(ResponseKind::InterviewSummary),
            start_time: log.first_timestamp(),
            end_time: log.last_timestamp(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interview::test_support::{StubSummarizer, founder_inputs, session};

    #[tokio::test]
    async fn export_before_start_is_empty() {
        let s = session(founder_inputs(&["P1"], "sign up"), StubSummarizer::ok("s"));
        let doc = export(&s);
        assert_eq!(doc.session_id, s.session_id());
        assert!(doc.responses.is_empty());

        let value = serde_json::to_value(&doc).unwrap();
        assert_eq!(value["config"]["problem_domain"], "hydration");
        assert!(value["responses"].as_array().unwrap().is_empty());
        assert!(value["completed_at"].is_string());
    }

    #[tokio::test]
    async fn repeated_export_differs_only_in_timestamp() {
        let mut s = session(founder_inputs(&["P1"], "sign up"), StubSummarizer::ok("s"));
        s.start_interview();
        for input in ["ctx", "ok", "4", "story"] {
            s.advance(input).await;
        }

        let first = serde_json::to_value(export(&s)).unwrap();
        let second = serde_json::to_value(export(&s)).unwrap();
        assert_eq!(first["session_id"], second["session_id"]);
        assert_eq!(first["config"], second["config"]);
        assert_eq!(first["responses"], second["responses"]);
        assert_eq!(first["responses"].as_array().unwrap().len(), 2);
        assert_eq!(first["responses"][0]["type"], "problem_resonance");
        assert_eq!(first["responses"][1]["type"], "problem_explanation");
    }

    #[tokio::test]
    async fn export_renders_pretty_json() {
        let s = session(founder_inputs(&["P1"], "sign up"), StubSummarizer::ok("s"));
        let doc = export(&s);
        let json = doc.to_json_pretty().unwrap();
        assert!(json.contains("\n  \"session_id\""));
        assert_eq!(doc.file_name(), format!("interview_{}.json", s.session_id()));
    }

    #[tokio::test]
    async fn stats_track_progress() {
        let mut s = session(founder_inputs(&["P1", "P2"], "sign up"), StubSummarizer::ok("s"));
        let empty = s.stats();
        assert_eq!(empty.total_problems, 2);
        assert_eq!(empty.total_responses, 0);
        assert!(empty.start_time.is_none());

        s.start_interview();
        for input in ["ctx", "ok", "4", "story", "pitch", "intent", "close"] {
            s.advance(input).await;
        }
        let stats = s.stats();
        assert_eq!(stats.problem_responses, 1);
        assert_eq!(stats.summaries, 1);
        assert_eq!(stats.total_responses, 5);
        assert!(stats.start_time.unwrap() <= stats.end_time.unwrap());
    }
}
