//! The interview engine: one `InterviewSession` per respondent conversation.
//!
//! Each call to `advance` takes the respondent's reply, runs the stage
//! transition function until a stage that needs fresh input is reached, and
//! returns the text to show. Stages without a prompt of their own for the
//! current configuration fall through within the same call.
//!
//! A turn is computed on a draft copy of the mutable state and committed only
//! once it completes. Errors and dropped futures therefore leave the session
//! exactly as it was before the call.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::error::InterviewError;
use crate::llm::ChatMessage;

use super::config::{DEFAULT_FOLLOW_UP_ACTION, SessionConfig};
use super::export::InterviewStats;
use super::record::{ResponseLog, ResponsePayload, ResponseRecord};
use super::script::{ScriptCatalog, ScriptKey};
use super::state::{Stage, TurnState};
use super::summary::{Summarizer, SummaryConfig, collect_summary};

/// Reply for any internal failure during a turn.
pub const APOLOGY: &str =
    "I apologize, but I'm having trouble processing your response. Could you please try again?";

/// Re-prompt for an unusable resonance rating.
pub const CLARIFICATION: &str = "Could you please give a number from 1 to 5 to show how much \
     this resonates with your experience?";

/// Returned by `start_interview` when there is nothing to ask about.
pub const NO_PROBLEMS: &str =
    "No problems provided by the founder. Please go back and add at least one.";

/// Final reply once every problem has been covered.
pub const FINAL_MESSAGE: &str = "That's all for now. Thanks so much for your time and thoughtful \
     answers. You've really helped the founder understand which problems matter most.";

/// Ratings at or above this get the follow-up action question.
pub const RESONANCE_THRESHOLD: u8 = 3;

/// Result of one application of the transition function.
enum Flow {
    /// Stop and show this text; the next stage waits for input.
    Yield(String),
    /// Nothing to ask here; keep going in the same turn.
    FallThrough,
}

/// Working copy of a turn, committed only on success.
struct Draft {
    state: TurnState,
    pending: Vec<ResponseRecord>,
}

impl Draft {
    fn record(&mut self, payload: ResponsePayload) {
        self.pending
            .push(ResponseRecord::new(self.state.problem_index, payload));
    }

    fn say(&mut self, text: String) -> Flow {
        self.state
            .transcript
            .push(ChatMessage::assistant(text.as_str()));
        Flow::Yield(text)
    }
}

/// One respondent's interview.
pub struct InterviewSession {
    session_id: Uuid,
    config: Arc<SessionConfig>,
    script: Arc<ScriptCatalog>,
    summarizer: Arc<dyn Summarizer>,
    summary_timeout: Duration,
    /// `None` until `start_interview` succeeds.
    state: Option<TurnState>,
    responses: ResponseLog,
}

impl InterviewSession {
    pub fn new(
        config: Arc<SessionConfig>,
        script: Arc<ScriptCatalog>,
        summarizer: Arc<dyn Summarizer>,
    ) -> Self {
        Self::with_id(Uuid::new_v4(), config, script, summarizer)
    }

    pub fn with_id(
        session_id: Uuid,
        config: Arc<SessionConfig>,
        script: Arc<ScriptCatalog>,
        summarizer: Arc<dyn Summarizer>,
    ) -> Self {
        Self {
            session_id,
            config,
            script,
            summarizer,
            summary_timeout: SummaryConfig::default().timeout,
            state: None,
            responses: ResponseLog::new(),
        }
    }

    pub fn with_summary_timeout(mut self, timeout: Duration) -> Self {
        self.summary_timeout = timeout;
        self
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Current stage, or `None` before the interview has started.
    pub fn stage(&self) -> Option<Stage> {
        self.state.as_ref().map(|s| s.stage)
    }

    pub fn is_started(&self) -> bool {
        self.state.is_some()
    }

    pub fn problem_index(&self) -> usize {
        self.state.as_ref().map_or(0, |s| s.problem_index)
    }

    /// Problem under discussion; `None` before start and after completion.
    pub fn current_problem(&self) -> Option<&str> {
        let state = self.state.as_ref()?;
        self.config
            .problems()
            .get(state.problem_index)
            .map(String::as_str)
    }

    /// Progress label such as `"2 of 3"`.
    pub fn current_problem_number(&self) -> String {
        let total = self.config.problems().len();
        format!("{} of {}", (self.problem_index() + 1).min(total), total)
    }

    pub fn is_complete(&self) -> bool {
        self.state
            .as_ref()
            .is_some_and(|s| s.problem_index >= self.config.problems().len())
    }

    pub fn resonance_score(&self) -> Option<u8> {
        self.state.as_ref().and_then(|s| s.resonance_score)
    }

    pub fn last_user_response(&self) -> &str {
        self.state
            .as_ref()
            .map_or("", |s| s.last_user_response.as_str())
    }

    /// Messages of the current problem segment.
    pub fn transcript(&self) -> &[ChatMessage] {
        self.state.as_ref().map_or(&[], |s| s.transcript.as_slice())
    }

    pub fn responses(&self) -> &ResponseLog {
        &self.responses
    }

    pub fn stats(&self) -> InterviewStats {
        InterviewStats::from_session(self)
    }

    /// Begin the interview and return the opening message.
    ///
    /// Calling it again mid-interview re-asks the opening questions for the
    /// current problem; the problem index and recorded responses are kept.
    /// Once complete it changes nothing and repeats `FINAL_MESSAGE`.
    pub fn start_interview(&mut self) -> String {
        if self.config.problems().is_empty() {
            warn!(session_id = %self.session_id, "Cannot start interview without problems");
            return NO_PROBLEMS.to_string();
        }

        if self.is_complete() {
            warn!(session_id = %self.session_id, "start called on a completed interview");
            return FINAL_MESSAGE.to_string();
        }

        let opening = self.script.render(ScriptKey::Intro, &[]).and_then(|intro| {
            let question = self.script.render(
                ScriptKey::ContextQuestion,
                &[("domain", self.config.problem_domain())],
            )?;
            Ok(format!("{intro}\n\n{question}"))
        });

        match opening {
            Ok(text) => {
                let mut state = TurnState::new(&self.config.system_prompt());
                state.problem_index = self.problem_index();
                info!(
                    session_id = %self.session_id,
                    problems = self.config.problems().len(),
                    problem_index = state.problem_index,
                    "Interview started"
                );
                self.state = Some(state);
                text
            }
            Err(e) => {
                error!(session_id = %self.session_id, error = %e, "Failed to start interview");
                APOLOGY.to_string()
            }
        }
    }

    /// Process one respondent reply and return the next text to show.
    ///
    /// Never fails: internal errors produce `APOLOGY` with state unchanged.
    /// Calling this after completion is a caller error; it changes nothing
    /// and repeats `FINAL_MESSAGE`.
    pub async fn advance(&mut self, user_input: &str) -> String {
        let Some(current) = self.state.as_ref() else {
            let e = InterviewError::NotStarted;
            error!(session_id = %self.session_id, error = %e, "Turn rejected");
            return APOLOGY.to_string();
        };

        if current.stage.is_terminal() {
            warn!(session_id = %self.session_id, "advance called on a completed interview");
            return FINAL_MESSAGE.to_string();
        }

        let mut draft = Draft {
            state: current.clone(),
            pending: Vec::new(),
        };
        draft.state.transcript.push(ChatMessage::user(user_input));
        draft.state.last_user_response = user_input.trim().to_string();

        let from = draft.state.stage;
        match self.run_turn(&mut draft).await {
            Ok(reply) => {
                debug!(
                    session_id = %self.session_id,
                    from = %from,
                    to = %draft.state.stage,
                    recorded = draft.pending.len(),
                    "Turn complete"
                );
                for record in draft.pending {
                    self.responses.append(record);
                }
                self.state = Some(draft.state);
                reply
            }
            Err(e) => {
                error!(session_id = %self.session_id, stage = %from, error = %e, "Turn failed");
                APOLOGY.to_string()
            }
        }
    }

    async fn run_turn(&self, draft: &mut Draft) -> Result<String, InterviewError> {
        loop {
            match self.step(draft).await? {
                Flow::Yield(text) => return Ok(text),
                Flow::FallThrough => {
                    debug!(session_id = %self.session_id, stage = %draft.state.stage, "Falling through");
                }
            }
        }
    }

    /// The transition function: one stage's effect and successor.
    async fn step(&self, draft: &mut Draft) -> Result<Flow, InterviewError> {
        let answer = draft.state.last_user_response.clone();

        match draft.state.stage {
            Stage::DomainQuestion => {
                let text = self.script.render(ScriptKey::ProblemStatementIntro, &[])?;
                draft.state.move_to(Stage::ProblemIntro);
                Ok(draft.say(text))
            }

            Stage::ProblemIntro => {
                let problem = self.problem(draft.state.problem_index)?;
                let text = self
                    .script
                    .render(ScriptKey::ResonancePrompt, &[("problem_statement", problem)])?;
                draft.state.move_to(Stage::ProblemResonance);
                Ok(draft.say(text))
            }

            Stage::ProblemResonance => {
                let Some(score) = parse_rating(&answer) else {
                    warn!(session_id = %self.session_id, input = %answer, "Rating out of range, asking again");
                    return Ok(draft.say(CLARIFICATION.to_string()));
                };
                let problem = self.problem(draft.state.problem_index)?.to_string();
                draft.state.resonance_score = Some(score);
                draft.record(ResponsePayload::ProblemResonance {
                    problem,
                    resonance_score: score,
                });
                let text = self.script.render(ScriptKey::ExplanationPrompt, &[])?;
                draft.state.move_to(Stage::ProblemExplanation);
                Ok(draft.say(text))
            }

            Stage::ProblemExplanation => {
                draft.record(ResponsePayload::ProblemExplanation { text: answer });
                let score = draft.state.resonance_score.take().ok_or(
                    InterviewError::MissingResonanceScore {
                        problem_index: draft.state.problem_index,
                    },
                )?;
                draft.state.move_to(Stage::ValueProp);
                if score >= RESONANCE_THRESHOLD {
                    let text = self.script.render(ScriptKey::ActionPrompt, &[])?;
                    Ok(draft.say(text))
                } else {
                    Ok(Flow::FallThrough)
                }
            }

            Stage::ValueProp => {
                draft.record(ResponsePayload::ValuePropInterest {
                    value_prop: self.config.value_prop().to_string(),
                    action: self.config.target_action().to_string(),
                    response: answer,
                });
                let text = self.script.render(
                    ScriptKey::PitchPrompt,
                    &[
                        ("value_prop", self.config.value_prop()),
                        ("target_action", self.config.target_action()),
                    ],
                )?;
                draft.state.move_to(Stage::PriceTest);
                Ok(draft.say(text))
            }

            Stage::PriceTest => {
                draft.state.move_to(Stage::Intent);
                if self.config.target_is_purchase() {
                    draft.record(ResponsePayload::PriceSensitivity { response: answer });
                    let text = self.script.render(ScriptKey::PricePrompt, &[])?;
                    Ok(draft.say(text))
                } else {
                    Ok(Flow::FallThrough)
                }
            }

            Stage::Intent => {
                draft.record(ResponsePayload::OptInIntent { response: answer });
                let follow_up = self
                    .config
                    .follow_up_action()
                    .unwrap_or(DEFAULT_FOLLOW_UP_ACTION);
                let text = self
                    .script
                    .render(ScriptKey::IntentPrompt, &[("follow_up_action", follow_up)])?;
                draft.state.move_to(Stage::Closing);
                Ok(draft.say(text))
            }

            Stage::Closing => self.close_problem(draft).await,

            Stage::Complete => Ok(Flow::Yield(FINAL_MESSAGE.to_string())),
        }
    }

    /// Summarize the finished problem and move to the next one or finish.
    async fn close_problem(&self, draft: &mut Draft) -> Result<Flow, InterviewError> {
        let closing = self.script.render(ScriptKey::Closing, &[])?;
        draft
            .state
            .transcript
            .push(ChatMessage::assistant(closing.as_str()));

        let summary = self.summarize(&draft.state.transcript, draft.state.problem_index).await;
        draft.record(ResponsePayload::InterviewSummary { summary });

        draft.state.problem_index += 1;
        draft.state.resonance_score = None;
        let total = self.config.problems().len();

        if draft.state.problem_index < total {
            let transition = format!(
                "Thanks for that. Let's look at the next one, this is {} of {}.",
                draft.state.problem_index + 1,
                total
            );
            let intro = self.script.render(ScriptKey::ProblemStatementIntro, &[])?;

            draft.state.transcript = vec![ChatMessage::system(self.config.system_prompt())];
            draft
                .state
                .transcript
                .push(ChatMessage::assistant(transition.as_str()));
            draft
                .state
                .transcript
                .push(ChatMessage::assistant(intro.as_str()));
            draft.state.move_to(Stage::ProblemIntro);

            info!(
                session_id = %self.session_id,
                problem_index = draft.state.problem_index,
                total,
                "Moving to next problem"
            );
            Ok(Flow::Yield(format!("{closing}\n\n{transition}\n\n{intro}")))
        } else {
            draft
                .state
                .transcript
                .push(ChatMessage::assistant(FINAL_MESSAGE));
            draft.state.move_to(Stage::Complete);
            info!(session_id = %self.session_id, total, "Interview complete");
            Ok(Flow::Yield(format!("{closing}\n\n{FINAL_MESSAGE}")))
        }
    }

    /// Produce the problem summary, or an empty string if it cannot be had.
    async fn summarize(&self, transcript: &[ChatMessage], problem_index: usize) -> String {
        match collect_summary(self.summarizer.as_ref(), transcript, self.summary_timeout).await {
            Ok(summary) => {
                info!(
                    session_id = %self.session_id,
                    problem_index,
                    chars = summary.len(),
                    "Problem summary recorded"
                );
                summary
            }
            Err(e) => {
                error!(
                    session_id = %self.session_id,
                    problem_index,
                    error = %e,
                    "Summary unavailable, continuing without it"
                );
                String::new()
            }
        }
    }

    fn problem(&self, index: usize) -> Result<&str, InterviewError> {
        let problems = self.config.problems();
        problems
            .get(index)
            .map(String::as_str)
            .ok_or(InterviewError::ProblemOutOfRange {
                index,
                total: problems.len(),
            })
    }
}

/// A usable rating is an integer from 1 to 5.
fn parse_rating(input: &str) -> Option<u8> {
    input
        .trim()
        .parse::<i64>()
        .ok()
        .filter(|n| (1..=5).contains(n))
        .and_then(|n| u8::try_from(n).ok())
}
