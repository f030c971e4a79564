//! Summarizer seam: turns a problem's transcript into a founder-facing
//! paragraph, delivered as a stream of fragments.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;

use crate::error::LlmError;
use crate::llm::{ChatMessage, CompletionRequest, FragmentStream, LlmProvider};

/// Trailing instruction appended to the transcript when summarizing.
pub const SUMMARY_INSTRUCTION: &str = "Based on this interview, summarize the key problems, \
     actions taken, and reactions to the solution in one founder-friendly paragraph.";

/// Something that can summarize an interview transcript.
#[async_trait]
pub trait Summarizer: Send + Sync {
    /// Start a summary. The returned stream is single-use.
    async fn summarize(
        &self,
        transcript: &[ChatMessage],
        instruction: &str,
    ) -> Result<FragmentStream, LlmError>;
}

/// Sampling settings for summary requests.
#[derive(Debug, Clone)]
pub struct SummaryConfig {
    pub temperature: f32,
    pub max_tokens: u32,
    /// Upper bound for producing the whole summary.
    pub timeout: Duration,
}

impl Default for SummaryConfig {
    fn default() -> Self {
        Self {
            temperature: 0.7,
            max_tokens: 500,
            timeout: Duration::from_secs(60),
        }
    }
}

/// `Summarizer` backed by a streaming LLM completion.
pub struct LlmSummarizer {
    llm: Arc<dyn LlmProvider>,
    config: SummaryConfig,
}

impl LlmSummarizer {
    pub fn new(llm: Arc<dyn LlmProvider>, config: SummaryConfig) -> Self {
        Self { llm, config }
    }
}

#[async_trait]
impl Summarizer for LlmSummarizer {
    async fn summarize(
        &self,
        transcript: &[ChatMessage],
        instruction: &str,
    ) -> Result<FragmentStream, LlmError> {
        let mut messages = transcript.to_vec();
        messages.push(ChatMessage::user(instruction));
        let request = CompletionRequest::new(messages)
            .with_max_tokens(self.config.max_tokens)
            .with_temperature(self.config.temperature);
        self.llm.complete_stream(request).await
    }
}

/// Run a summary to completion and return the concatenated, trimmed text.
///
/// An error while opening or anywhere in the stream, or running past
/// `timeout`, fails the whole summary.
pub async fn collect_summary(
    summarizer: &dyn Summarizer,
    transcript: &[ChatMessage],
    timeout: Duration,
) -> Result<String, LlmError> {
    let run = async {
        let mut stream = summarizer.summarize(transcript, SUMMARY_INSTRUCTION).await?;
        let mut text = String::new();
        while let Some(fragment) = stream.next().await {
            text.push_str(&fragment?);
        }
        Ok::<_, LlmError>(text.trim().to_string())
    };

    tokio::time::timeout(timeout, run)
        .await
        .map_err(|_| LlmError::Timeout {
            provider: "summarizer".to_string(),
            timeout,
        })?
}
