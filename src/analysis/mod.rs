//! Post-interview analysis: turns an exported transcript into founder-facing
//! insights and a written report.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::LlmError;
use crate::interview::TranscriptDocument;
use crate::llm::{ChatMessage, CompletionRequest, LlmProvider};

/// Sampling settings for analysis requests.
#[derive(Debug, Clone)]
pub struct AnalyzerConfig {
    pub temperature: f32,
    pub max_tokens: u32,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            temperature: 0.7,
            max_tokens: 1500,
        }
    }
}

/// Structured reading of one interview.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterviewAnalysis {
    pub session_id: Uuid,
    pub analysis_timestamp: DateTime<Utc>,
    pub key_insights: String,
    pub validation_signals: String,
    pub next_steps: String,
    pub risks: String,
}

impl InterviewAnalysis {
    /// Split a reply into its four sections on blank lines. Missing
    /// sections are left empty; anything past the fourth is dropped.
    pub fn from_reply(session_id: Uuid, reply: &str) -> Self {
        let mut sections = reply
            .trim()
            .split("\n\n")
            .map(str::trim)
            .filter(|s| !s.is_empty());
        let mut next = || sections.next().unwrap_or_default().to_string();
        Self {
            session_id,
            analysis_timestamp: Utc::now(),
            key_insights: next(),
            validation_signals: next(),
            next_steps: next(),
            risks: next(),
        }
    }
}

/// Runs analysis and report prompts against an LLM.
pub struct Analyzer {
    llm: Arc<dyn LlmProvider>,
    config: AnalyzerConfig,
}

impl Analyzer {
    pub fn new(llm: Arc<dyn LlmProvider>, config: AnalyzerConfig) -> Self {
        Self { llm, config }
    }

    pub async fn analyze(&self, doc: &TranscriptDocument) -> Result<InterviewAnalysis, LlmError> {
        let prompt = analysis_prompt(doc)?;
        debug!(session_id = %doc.session_id, responses = doc.responses.len(), "Analyzing interview");

        let reply = self
            .ask(
                "You are an expert startup researcher analyzing user interview responses.",
                prompt,
            )
            .await?;

        let analysis = InterviewAnalysis::from_reply(doc.session_id, &reply);
        info!(session_id = %doc.session_id, "Interview analysis complete");
        Ok(analysis)
    }

    /// Write a research report from a finished analysis.
    pub async fn generate_report(&self, analysis: &InterviewAnalysis) -> Result<String, LlmError> {
        let prompt = format!(
            "Create a professional research report based on this analysis:\n\n{}\n\n\
             Include:\n\
             1. Executive Summary\n\
             2. Methodology\n\
             3. Key Findings\n\
             4. Recommendations\n\
             5. Next Steps",
            serde_json::to_string_pretty(analysis)?
        );
        self.ask(
            "You are a professional research analyst creating a startup research report.",
            prompt,
        )
        .await
    }

    async fn ask(&self, system: &str, prompt: String) -> Result<String, LlmError> {
        let request = CompletionRequest::new(vec![
            ChatMessage::system(system),
            ChatMessage::user(prompt),
        ])
        .with_temperature(self.config.temperature)
        .with_max_tokens(self.config.max_tokens);

        let response = self.llm.complete(request).await?;
        Ok(response.content.trim().to_string())
    }
}

fn analysis_prompt(doc: &TranscriptDocument) -> Result<String, LlmError> {
    let config = &doc.config;
    let problems = config
        .problems()
        .iter()
        .map(|p| format!("- {p}"))
        .collect::<Vec<_>>()
        .join("\n");

    Ok(format!(
        "Analyze these user interview responses for a startup idea:\n\n\
         Problem domain: {}\n\
         Problems tested:\n{}\n\
         Value proposition: {}\n\
         Target action: {}\n\n\
         Interview Responses:\n{}\n\n\
         Please provide, as four paragraphs separated by blank lines:\n\
         1. Key insights about the problem and solution\n\
         2. Validation signals (positive and negative)\n\
         3. Suggested next steps for the founder\n\
         4. Potential risks or concerns",
        config.problem_domain(),
        problems,
        config.value_prop(),
        config.target_action(),
        serde_json::to_string_pretty(&doc.responses)?,
    ))
}
