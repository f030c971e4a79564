//! SessionHost: owns concurrent interview sessions keyed by id.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::{Mutex, RwLock};
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::HostError;

use super::config::SessionConfig;
use super::export::{InterviewStats, TranscriptDocument, export};
use super::machine::InterviewSession;
use super::script::ScriptCatalog;
use super::state::Stage;
use super::summary::{Summarizer, SummaryConfig};

/// Reply to one respondent turn.
#[derive(Debug, Clone, Serialize)]
pub struct TurnOutcome {
    pub message: String,
    pub stage: Option<Stage>,
    pub complete: bool,
}

/// Holds every live session. Turns on one session are serialized by that
/// session's mutex; different sessions proceed independently.
pub struct SessionHost {
    script: Arc<ScriptCatalog>,
    summarizer: Arc<dyn Summarizer>,
    summary_timeout: Duration,
    sessions: RwLock<HashMap<Uuid, Arc<Mutex<InterviewSession>>>>,
}

impl SessionHost {
    pub fn new(script: Arc<ScriptCatalog>, summarizer: Arc<dyn Summarizer>) -> Self {
        Self {
            script,
            summarizer,
            summary_timeout: SummaryConfig::default().timeout,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    pub fn with_summary_timeout(mut self, timeout: Duration) -> Self {
        self.summary_timeout = timeout;
        self
    }

    /// Register a new session for a validated config.
    pub async fn create(&self, config: SessionConfig) -> Uuid {
        let session = InterviewSession::new(
            Arc::new(config),
            Arc::clone(&self.script),
            Arc::clone(&self.summarizer),
        )
        .with_summary_timeout(self.summary_timeout);
        let id = session.session_id();
        self.sessions
            .write()
            .await
            .insert(id, Arc::new(Mutex::new(session)));
        info!(session_id = %id, "Interview session created");
        id
    }

    async fn get(&self, id: Uuid) -> Result<Arc<Mutex<InterviewSession>>, HostError> {
        self.sessions
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or(HostError::NotFound { id })
    }

    /// Start (or restart) the interview and return its opening text.
    /// A completed interview cannot be restarted.
    pub async fn start(&self, id: Uuid) -> Result<String, HostError> {
        let session = self.get(id).await?;
        let mut session = session.lock().await;
        if session.is_complete() {
            warn!(session_id = %id, "Start requested for a completed interview");
            return Err(HostError::InterviewComplete { id });
        }
        Ok(session.start_interview())
    }

    /// Run one respondent turn.
    pub async fn advance(&self, id: Uuid, input: &str) -> Result<TurnOutcome, HostError> {
        let session = self.get(id).await?;
        let mut session = session.lock().await;
        if session.is_complete() {
            warn!(session_id = %id, "Turn submitted to a completed interview");
            return Err(HostError::InterviewComplete { id });
        }
        let message = session.advance(input).await;
        Ok(TurnOutcome {
            message,
            stage: session.stage(),
            complete: session.is_complete(),
        })
    }

    pub async fn export(&self, id: Uuid) -> Result<TranscriptDocument, HostError> {
        let session = self.get(id).await?;
        let session = session.lock().await;
        Ok(export(&session))
    }

    pub async fn stats(&self, id: Uuid) -> Result<InterviewStats, HostError> {
        let session = self.get(id).await?;
        let session = session.lock().await;
        Ok(session.stats())
    }

    /// Drop a session. Returns whether it existed.
    pub async fn remove(&self, id: Uuid) -> bool {
        let removed = self.sessions.write().await.remove(&id).is_some();
        if removed {
            info!(session_id = %id, "Interview session removed");
        }
        removed
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interview::test_support::{StubSummarizer, founder_inputs, test_script};

    fn host() -> SessionHost {
        SessionHost::new(Arc::new(test_script()), Arc::new(StubSummarizer::ok("sum")))
    }

    fn config(problems: &[&str]) -> SessionConfig {
        SessionConfig::try_from(founder_inputs(problems, "sign up")).unwrap()
    }

    #[tokio::test]
    async fn create_start_and_advance() {
        let host = host();
        let id = host.create(config(&["P1"])).await;
        assert_eq!(host.len().await, 1);

        assert_eq!(host.start(id).await.unwrap(), "INTRO\n\nCONTEXT hydration");
        let outcome = host.advance(id, "ctx").await.unwrap();
        assert_eq!(outcome.message, "PSI");
        assert_eq!(outcome.stage, Some(Stage::ProblemIntro));
        assert!(!outcome.complete);
    }

    #[tokio::test]
    async fn unknown_session_is_not_found() {
        let host = host();
        let id = Uuid::new_v4();
        assert!(matches!(host.start(id).await, Err(HostError::NotFound { .. })));
        assert!(matches!(host.advance(id, "x").await, Err(HostError::NotFound { .. })));
        assert!(matches!(host.export(id).await, Err(HostError::NotFound { .. })));
        assert!(!host.remove(id).await);
    }

    #[tokio::test]
    async fn completed_session_rejects_turns() {
        let host = host();
        let id = host.create(config(&["P1"])).await;
        host.start(id).await.unwrap();
        let mut last = None;
        for input in ["ctx", "ok", "1", "meh", "no", "sure"] {
            last = Some(host.advance(id, input).await.unwrap());
        }
        let last = last.unwrap();
        assert!(last.complete);
        assert_eq!(last.stage, Some(Stage::Complete));

        assert!(matches!(
            host.advance(id, "again").await,
            Err(HostError::InterviewComplete { .. })
        ));
        assert!(matches!(
            host.start(id).await,
            Err(HostError::InterviewComplete { .. })
        ));
        let stats = host.stats(id).await.unwrap();
        assert_eq!(stats.problem_responses, 1);
        assert_eq!(stats.summaries, 1);
        assert_eq!(host.export(id).await.unwrap().responses.len(), stats.total_responses);
    }

    #[tokio::test]
    async fn sessions_are_independent() {
        let host = Arc::new(host());
        let a = host.create(config(&["A1"])).await;
        let b = host.create(config(&["B1"])).await;
        host.start(a).await.unwrap();
        host.start(b).await.unwrap();

        let (ra, rb) = tokio::join!(
            async {
                host.advance(a, "ctx").await.unwrap();
                host.advance(a, "ok").await.unwrap()
            },
            async {
                host.advance(b, "ctx").await.unwrap();
                host.advance(b, "ok").await.unwrap()
            }
        );
        assert_eq!(ra.message, "RESONANCE A1");
        assert_eq!(rb.message, "RESONANCE B1");

        assert!(host.remove(a).await);
        assert_eq!(host.len().await, 1);
    }
}
