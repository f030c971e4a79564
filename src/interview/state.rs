//! Interview stages and the mutable per-turn state they gate.

use serde::{Deserialize, Serialize};

use crate::llm::ChatMessage;

/// The stages of one problem's interview segment.
///
/// DomainQuestion → ProblemIntro → ProblemResonance → ProblemExplanation →
/// ValueProp → PriceTest → Intent → Closing, then back to ProblemIntro for the
/// next problem or on to Complete.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    DomainQuestion,
    ProblemIntro,
    ProblemResonance,
    ProblemExplanation,
    ValueProp,
    PriceTest,
    Intent,
    Closing,
    Complete,
}

impl Stage {
    /// Check if a transition from `self` to `target` is valid.
    ///
    /// ProblemResonance may stay put (re-prompt), and Closing either loops
    /// back for the next problem or finishes.
    pub fn can_transition_to(&self, target: Stage) -> bool {
        use Stage::*;
        matches!(
            (self, target),
            (DomainQuestion, ProblemIntro)
                | (ProblemIntro, ProblemResonance)
                | (ProblemResonance, ProblemResonance)
                | (ProblemResonance, ProblemExplanation)
                | (ProblemExplanation, ValueProp)
                | (ValueProp, PriceTest)
                | (PriceTest, Intent)
                | (Intent, Closing)
                | (Closing, ProblemIntro)
                | (Closing, Complete)
        )
    }

    /// Whether this stage is terminal (interview is done).
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Complete)
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::DomainQuestion => "domain_question",
            Self::ProblemIntro => "problem_intro",
            Self::ProblemResonance => "problem_resonance",
            Self::ProblemExplanation => "problem_explanation",
            Self::ValueProp => "value_prop",
            Self::PriceTest => "price_test",
            Self::Intent => "intent",
            Self::Closing => "closing",
            Self::Complete => "complete",
        };
        write!(f, "{s}")
    }
}

/// Mutable interview state, replaced wholesale at the end of each turn.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TurnState {
    pub stage: Stage,
    /// Index of the problem under discussion; equals the problem count once
    /// the interview is complete.
    pub problem_index: usize,
    /// Set by a valid rating, consumed by ProblemExplanation.
    pub resonance_score: Option<u8>,
    pub last_user_response: String,
    /// Messages for the current problem's segment, starting with the system
    /// instruction.
    pub transcript: Vec<ChatMessage>,
}

impl TurnState {
    pub fn new(system_prompt: &str) -> Self {
        Self {
            stage: Stage::DomainQuestion,
            problem_index: 0,
            resonance_score: None,
            last_user_response: String::new(),
            transcript: vec![ChatMessage::system(system_prompt)],
        }
    }

    /// Move to `target`, logging transitions the stage graph does not allow.
    pub fn move_to(&mut self, target: Stage) {
        if !self.stage.can_transition_to(target) {
            tracing::warn!(from = %self.stage, to = %target, "Unexpected stage transition");
        }
        self.stage = target;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_transitions() {
        use Stage::*;
        let transitions = [
            (DomainQuestion, ProblemIntro),
            (ProblemIntro, ProblemResonance),
            (ProblemResonance, ProblemResonance),
            (ProblemResonance, ProblemExplanation),
            (ProblemExplanation, ValueProp),
            (ValueProp, PriceTest),
            (PriceTest, Intent),
            (Intent, Closing),
            (Closing, ProblemIntro),
            (Closing, Complete),
        ];
        for (from, to) in transitions {
            assert!(from.can_transition_to(to), "{from} should transition to {to}");
        }
    }

    #[test]
    fn invalid_transitions() {
        use Stage::*;
        // Skip stages
        assert!(!DomainQuestion.can_transition_to(ProblemResonance));
        assert!(!ValueProp.can_transition_to(Intent));
        // Go backward
        assert!(!ProblemExplanation.can_transition_to(ProblemResonance));
        // Terminal is absorbing
        assert!(!Complete.can_transition_to(ProblemIntro));
        assert!(!Complete.can_transition_to(Complete));
    }

    #[test]
    fn only_complete_is_terminal() {
        assert!(Stage::Complete.is_terminal());
        assert!(!Stage::Closing.is_terminal());
        assert!(!Stage::DomainQuestion.is_terminal());
    }

    #[test]
    fn display_matches_serde() {
        use Stage::*;
        let stages = [
            DomainQuestion,
            ProblemIntro,
            ProblemResonance,
            ProblemExplanation,
            ValueProp,
            PriceTest,
            Intent,
            Closing,
            Complete,
        ];
        for stage in stages {
            let json = serde_json::to_string(&stage).unwrap();
            assert_eq!(format!("\"{stage}\""), json, "Display and serde should match for {stage:?}");
        }
    }

    #[test]
    fn new_state_starts_at_domain_question() {
        let state = TurnState::new("system");
        assert_eq!(state.stage, Stage::DomainQuestion);
        assert_eq!(state.problem_index, 0);
        assert!(state.resonance_score.is_none());
        assert_eq!(state.transcript, vec![ChatMessage::system("system")]);
    }
}
