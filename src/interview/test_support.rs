//! Shared fixtures for interview unit tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::error::LlmError;
use crate::llm::{ChatMessage, FragmentStream};

use super::config::{FounderInputs, SessionConfig};
use super::machine::InterviewSession;
use super::script::ScriptCatalog;
use super::summary::Summarizer;

#[derive(Clone, Copy)]
enum Behavior {
    Reply(&'static str),
    Fail,
    Hang,
}

/// Summarizer that replies, fails, or never finishes, and counts calls.
#[derive(Clone)]
pub struct StubSummarizer {
    behavior: Behavior,
    calls: Arc<AtomicUsize>,
    last_transcript: Arc<Mutex<Vec<ChatMessage>>>,
}

impl StubSummarizer {
    fn with(behavior: Behavior) -> Self {
        Self {
            behavior,
            calls: Arc::new(AtomicUsize::new(0)),
            last_transcript: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn ok(reply: &'static str) -> Self {
        Self::with(Behavior::Reply(reply))
    }

    pub fn failing() -> Self {
        Self::with(Behavior::Fail)
    }

    pub fn hanging() -> Self {
        Self::with(Behavior::Hang)
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_transcript(&self) -> Vec<ChatMessage> {
        self.last_transcript.lock().unwrap().clone()
    }
}

#[async_trait]
impl Summarizer for StubSummarizer {
    async fn summarize(
        &self,
        transcript: &[ChatMessage],
        _instruction: &str,
    ) -> Result<FragmentStream, LlmError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_transcript.lock().unwrap() = transcript.to_vec();
        match self.behavior {
            Behavior::Reply(text) => {
                // Split in two to exercise fragment concatenation.
                let mid = text
                    .char_indices()
                    .nth(text.chars().count() / 2)
                    .map_or(text.len(), |(i, _)| i);
                let (a, b) = text.split_at(mid);
                let fragments: Vec<Result<String, LlmError>> =
                    vec![Ok(a.to_string()), Ok(b.to_string())];
                Ok(Box::pin(futures::stream::iter(fragments)))
            }
            Behavior::Fail => Err(LlmError::RequestFailed {
                provider: "stub".to_string(),
                reason: "backend down".to_string(),
            }),
            Behavior::Hang => Ok(Box::pin(
                futures::stream::pending::<Result<String, LlmError>>(),
            )),
        }
    }
}

pub fn founder_inputs(problems: &[&str], target_action: &str) -> FounderInputs {
    FounderInputs {
        problem_domain: Some("hydration".to_string()),
        problems: problems.iter().map(|p| p.to_string()).collect(),
        value_prop: Some("a reminder app".to_string()),
        target_action: Some(target_action.to_string()),
        follow_up_action: Some("join the beta".to_string()),
        ..Default::default()
    }
}

/// Script whose texts are short markers, so replies can be compared exactly.
pub fn test_script() -> ScriptCatalog {
    ScriptCatalog::from_value(&serde_json::json!({
        "intro": "INTRO",
        "context_question": "CONTEXT {domain}",
        "problem_statement_intro": "PSI",
        "problem_validation": {
            "resonance_prompt": "RESONANCE {problem_statement}",
            "explanation_prompt": "EXPLAIN",
            "action_prompt": "ACTION"
        },
        "value_prop_test": {
            "pitch_prompt": "PITCH {value_prop} / {target_action}",
            "price_prompt": "PRICE"
        },
        "intent_prompt": "INTENT {follow_up_action}",
        "closing": "CLOSING"
    }))
    .unwrap()
}

pub fn session(inputs: FounderInputs, summarizer: StubSummarizer) -> InterviewSession {
    InterviewSession::new(
        Arc::new(SessionConfig::try_from(inputs).unwrap()),
        Arc::new(test_script()),
        Arc::new(summarizer),
    )
}
