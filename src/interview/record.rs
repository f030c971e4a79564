//! Structured answers and the append-only log that holds them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Kind of a recorded answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseKind {
    ProblemResonance,
    ProblemExplanation,
    ValuePropInterest,
    PriceSensitivity,
    OptInIntent,
    InterviewSummary,
}

/// Kind-specific fields of a record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ResponsePayload {
    ProblemResonance {
        problem: String,
        resonance_score: u8,
    },
    ProblemExplanation {
        text: String,
    },
    ValuePropInterest {
        value_prop: String,
        action: String,
        response: String,
    },
    PriceSensitivity {
        response: String,
    },
    OptInIntent {
        response: String,
    },
    /// Empty when the summarizer was unavailable.
    InterviewSummary {
        summary: String,
    },
}

impl ResponsePayload {
    pub fn kind(&self) -> ResponseKind {
        match self {
            Self::ProblemResonance { .. } => ResponseKind::ProblemResonance,
            Self::ProblemExplanation { .. } => ResponseKind::ProblemExplanation,
            Self::ValuePropInterest { .. } => ResponseKind::ValuePropInterest,
            Self::PriceSensitivity { .. } => ResponseKind::PriceSensitivity,
            Self::OptInIntent { .. } => ResponseKind::OptInIntent,
            Self::InterviewSummary { .. } => ResponseKind::InterviewSummary,
        }
    }
}

/// One recorded answer. Never edited once appended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseRecord {
    #[serde(flatten)]
    pub payload: ResponsePayload,
    /// Problem the answer belongs to.
    pub problem_index: usize,
    pub timestamp: DateTime<Utc>,
}

impl ResponseRecord {
    pub fn new(problem_index: usize, payload: ResponsePayload) -> Self {
        Self {
            payload,
            problem_index,
            timestamp: Utc::now(),
        }
    }

    pub fn kind(&self) -> ResponseKind {
        self.payload.kind()
    }
}

/// Append-only, ordered record of answers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResponseLog {
    records: Vec<ResponseRecord>,
}

impl ResponseLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, record: ResponseRecord) {
        self.records.push(record);
    }

    pub fn all(&self) -> &[ResponseRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn total_for_kind(&self, kind: ResponseKind) -> usize {
        self.records.iter().filter(|r| r.kind() == kind).count()
    }

    pub fn first_timestamp(&self) -> Option<DateTime<Utc>> {
        self.records.first().map(|r| r.timestamp)
    }

    pub fn last_timestamp(&self) -> Option<DateTime<Utc>> {
        self.records.last().map(|r| r.timestamp)
    }

    /// Records belonging to one problem, in order.
    pub fn for_problem(&self, problem_index: usize) -> impl Iterator<Item = &ResponseRecord> {
        self.records
            .iter()
            .filter(move |r| r.problem_index == problem_index)
    }
}
