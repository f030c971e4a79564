//! OpenAI chat-completions provider over `reqwest`.

use std::collections::VecDeque;
use std::time::Duration;

use async_trait::async_trait;
use futures::{Stream, StreamExt};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use crate::error::LlmError;
use crate::llm::provider::{
    ChatMessage, CompletionRequest, CompletionResponse, FinishReason, FragmentStream, LlmProvider,
};
use crate::llm::sse::SseProcessor;

const PROVIDER: &str = "openai";
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Chat-completions client. Works with any OpenAI-compatible base URL.
pub struct OpenAiProvider {
    client: reqwest::Client,
    api_key: SecretString,
    project_id: Option<String>,
    base_url: String,
    model: String,
}

#[derive(Debug, Serialize)]
struct ChatRequestBody<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct ChatResponseBody {
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Usage {
    prompt_tokens: u32,
    completion_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ChunkBody {
    choices: Vec<ChunkChoice>,
}

#[derive(Debug, Deserialize)]
struct ChunkChoice {
    delta: ChunkDelta,
}

#[derive(Debug, Deserialize)]
struct ChunkDelta {
    #[serde(default)]
    content: Option<String>,
}

impl OpenAiProvider {
    pub fn new(
        api_key: SecretString,
        project_id: Option<String>,
        base_url: impl Into<String>,
        model: impl Into<String>,
    ) -> Result<Self, LlmError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("mombot/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(CONNECT_TIMEOUT)
            .build()
            .map_err(|e| LlmError::RequestFailed {
                provider: PROVIDER.to_string(),
                reason: format!("Failed to create HTTP client: {e}"),
            })?;

        Ok(Self {
            client,
            api_key,
            project_id,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
        })
    }

    async fn send(
        &self,
        request: &CompletionRequest,
        stream: bool,
    ) -> Result<reqwest::Response, LlmError> {
        let body = ChatRequestBody {
            model: &self.model,
            messages: &request.messages,
            max_tokens: request.max_tokens,
            temperature: request.temperature,
            stream,
        };

        let mut builder = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(self.api_key.expose_secret())
            .json(&body);
        if let Some(ref project) = self.project_id {
            builder = builder.header("OpenAI-Project", project);
        }

        let response = builder.send().await.map_err(|e| LlmError::RequestFailed {
            provider: PROVIDER.to_string(),
            reason: e.to_string(),
        })?;

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(LlmError::AuthFailed {
                provider: PROVIDER.to_string(),
            });
        }
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(LlmError::RequestFailed {
                provider: PROVIDER.to_string(),
                reason: format!("{status}: {text}"),
            });
        }

        Ok(response)
    }
}

#[async_trait]
impl LlmProvider for OpenAiProvider {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        let response = self.send(&request, false).await?;
        let body: ChatResponseBody =
            response
                .json()
                .await
                .map_err(|e| LlmError::InvalidResponse {
                    provider: PROVIDER.to_string(),
                    reason: e.to_string(),
                })?;

        let choice = body
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| LlmError::InvalidResponse {
                provider: PROVIDER.to_string(),
                reason: "response contained no choices".to_string(),
            })?;
        let (input_tokens, output_tokens) = body
            .usage
            .map(|u| (u.prompt_tokens, u.completion_tokens))
            .unwrap_or_default();

        Ok(CompletionResponse {
            content: choice.message.content.unwrap_or_default(),
            input_tokens,
            output_tokens,
            finish_reason: FinishReason::from_api(choice.finish_reason.as_deref()),
        })
    }

    async fn complete_stream(
        &self,
        request: CompletionRequest,
    ) -> Result<FragmentStream, LlmError> {
        let response = self.send(&request, true).await?;
        tracing::debug!(model = %self.model, "Streaming completion started");
        Ok(fragment_stream(response.bytes_stream()))
    }
}

struct StreamState<S> {
    bytes: std::pin::Pin<Box<S>>,
    sse: SseProcessor,
    pending: VecDeque<String>,
    done: bool,
}

/// Turn a raw SSE byte stream into content fragments, ending at `[DONE]`.
///
/// Any transport or decode error is yielded once and ends the stream.
pub(crate) fn fragment_stream<S, B, E>(bytes: S) -> FragmentStream
where
    S: Stream<Item = Result<B, E>> + Send + 'static,
    B: AsRef<[u8]> + Send + 'static,
    E: std::fmt::Display + Send + 'static,
{
    let state = StreamState {
        bytes: Box::pin(bytes),
        sse: SseProcessor::new(),
        pending: VecDeque::new(),
        done: false,
    };

    let stream = futures::stream::unfold(state, |mut st| async move {
        loop {
            if let Some(fragment) = st.pending.pop_front() {
                return Some((Ok(fragment), st));
            }
            if st.done {
                return None;
            }

            while let Some(event) = st.sse.next_event() {
                let event = match event {
                    Ok(event) => event,
                    Err(e) => {
                        st.done = true;
                        return Some((Err(interrupted(format!("invalid UTF-8: {e}"))), st));
                    }
                };
                if event.data.trim() == "[DONE]" {
                    st.done = true;
                    break;
                }
                match serde_json::from_str::<ChunkBody>(&event.data) {
                    Ok(chunk) => {
                        if let Some(text) = chunk
                            .choices
                            .into_iter()
                            .next()
                            .and_then(|c| c.delta.content)
                            .filter(|t| !t.is_empty())
                        {
                            st.pending.push_back(text);
                        }
                    }
                    Err(e) => {
                        st.done = true;
                        return Some((
                            Err(LlmError::InvalidResponse {
                                provider: PROVIDER.to_string(),
                                reason: format!("bad stream chunk: {e}"),
                            }),
                            st,
                        ));
                    }
                }
            }

            if !st.pending.is_empty() || st.done {
                continue;
            }

            match st.bytes.next().await {
                Some(Ok(chunk)) => st.sse.push(chunk.as_ref()),
                Some(Err(e)) => {
                    st.done = true;
                    return Some((Err(interrupted(e.to_string())), st));
                }
                None => st.done = true,
            }
        }
    });

    Box::pin(stream)
}

fn interrupted(reason: String) -> LlmError {
    LlmError::StreamInterrupted {
        provider: PROVIDER.to_string(),
        reason,
    }
}
