//! Founder configuration: raw inputs and the validated `SessionConfig`.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Follow-up action offered when the founder leaves it blank.
pub const DEFAULT_FOLLOW_UP_ACTION: &str = "get early access";

/// Founder inputs as submitted (form post or JSON file).
///
/// Every field is optional here so that validation can report exactly which
/// ones are missing.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FounderInputs {
    #[serde(default)]
    pub problem_domain: Option<String>,
    #[serde(default)]
    pub problems: Vec<String>,
    #[serde(default)]
    pub value_prop: Option<String>,
    #[serde(default)]
    pub target_action: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub follow_up_action: Option<String>,
    #[serde(default)]
    pub is_paid_service: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pricing_model: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub price_points: Vec<Decimal>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub pricing_questions: Vec<String>,
}

/// Validated, immutable founder configuration shared by a session.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionConfig {
    problem_domain: String,
    problems: Vec<String>,
    value_prop: String,
    target_action: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    follow_up_action: Option<String>,
    is_paid_service: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pricing_model: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    price_points: Vec<Decimal>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pricing_questions: Vec<String>,
}

fn required(value: Option<String>, key: &str, hint: &str) -> Result<String, ConfigError> {
    match value.map(|v| v.trim().to_string()) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(ConfigError::MissingRequired {
            key: key.to_string(),
            hint: hint.to_string(),
        }),
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl TryFrom<FounderInputs> for SessionConfig {
    type Error = ConfigError;

    fn try_from(inputs: FounderInputs) -> Result<Self, Self::Error> {
        let problem_domain = required(
            inputs.problem_domain,
            "problem_domain",
            "Describe the space the founder is exploring.",
        )?;

        if inputs.problems.is_empty() {
            return Err(ConfigError::MissingRequired {
                key: "problems".to_string(),
                hint: "Add at least one problem statement.".to_string(),
            });
        }
        let mut problems = Vec::with_capacity(inputs.problems.len());
        for (i, problem) in inputs.problems.into_iter().enumerate() {
            let problem = problem.trim().to_string();
            if problem.is_empty() {
                return Err(ConfigError::InvalidValue {
                    key: format!("problems[{i}]"),
                    message: "problem statement is blank".to_string(),
                });
            }
            problems.push(problem);
        }

        let value_prop = required(
            inputs.value_prop,
            "value_prop",
            "State the value proposition to pitch.",
        )?;
        let target_action = required(
            inputs.target_action,
            "target_action",
            "Say what the respondent should do, e.g. \"sign up\" or \"buy now\".",
        )?;

        if inputs.is_paid_service {
            if inputs.price_points.is_empty() {
                return Err(ConfigError::MissingRequired {
                    key: "price_points".to_string(),
                    hint: "Paid services need at least one price point.".to_string(),
                });
            }
            if let Some(bad) = inputs.price_points.iter().find(|p| **p <= Decimal::ZERO) {
                return Err(ConfigError::InvalidValue {
                    key: "price_points".to_string(),
                    message: format!("price point {bad} must be positive"),
                });
            }
        }

        Ok(Self {
            problem_domain,
            problems,
            value_prop,
            target_action,
            follow_up_action: non_blank(inputs.follow_up_action),
            is_paid_service: inputs.is_paid_service,
            pricing_model: non_blank(inputs.pricing_model),
            price_points: inputs.price_points,
            pricing_questions: inputs
                .pricing_questions
                .into_iter()
                .map(|q| q.trim().to_string())
                .filter(|q| !q.is_empty())
                .collect(),
        })
    }
}

impl SessionConfig {
    /// Parse and validate founder inputs from JSON.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let inputs: FounderInputs =
            serde_json::from_str(json).map_err(|e| ConfigError::ParseError(e.to_string()))?;
        Self::try_from(inputs)
    }

    pub fn problem_domain(&self) -> &str {
        &self.problem_domain
    }

    pub fn problems(&self) -> &[String] {
        &self.problems
    }

    pub fn value_prop(&self) -> &str {
        &self.value_prop
    }

    pub fn target_action(&self) -> &str {
        &self.target_action
    }

    pub fn follow_up_action(&self) -> Option<&str> {
        self.follow_up_action.as_deref()
    }

    pub fn is_paid_service(&self) -> bool {
        self.is_paid_service
    }

    pub fn pricing_model(&self) -> Option<&str> {
        self.pricing_model.as_deref()
    }

    pub fn price_points(&self) -> &[Decimal] {
        &self.price_points
    }

    pub fn pricing_questions(&self) -> &[String] {
        &self.pricing_questions
    }

    /// Whether the target action is a purchase, which enables the price test.
    pub fn target_is_purchase(&self) -> bool {
        self.target_action.to_lowercase().contains("buy")
    }

    /// System instruction that opens every transcript segment.
    pub fn system_prompt(&self) -> String {
        let mut prompt = format!(
            "You are an AI research assistant conducting user interviews using The Mom Test.\n\n\
             Your role:\n\
             - Ask about past behavior\n\
             - Avoid hypotheticals\n\
             - Focus on specific experiences\n\
             - Dig deeper when needed\n\n\
             The founder is working on a solution in this space:\n{}\n\n\
             Problems to test:\n{}\n\n\
             Value prop:\n{}\n\n\
             Target action:\n{}\n\n\
             Follow-up action:\n{}",
            self.problem_domain,
            bullet_list(&self.problems),
            self.value_prop,
            self.target_action,
            self.follow_up_action.as_deref().unwrap_or("N/A"),
        );

        if self.is_paid_service {
            let prices: Vec<String> = self
                .price_points
                .iter()
                .map(|p| format!("${:.2}", p))
                .collect();
            prompt.push_str(&format!(
                "\n\nThis is a paid service. Pricing model: {}\n\
                 Price points to test:\n{}\n\n\
                 Pricing questions:\n{}\n\n\
                 Tips:\n\
                 - Ask about current spend\n\
                 - Understand their budget\n\
                 - Gauge reactions to price points\n\
                 - Explore decision-making process",
                self.pricing_model.as_deref().unwrap_or("unspecified"),
                bullet_list(&prices),
                bullet_list(&self.pricing_questions),
            ));
        }

        prompt
    }

    /// Founder-facing read-back of the configuration.
    pub fn reflection(&self) -> String {
        let mut text = format!(
            "Got it. So you're exploring {} and want to test these problems:\n{}\n\
             You'll pitch: {}\n\
             and ask interviewees to {}.",
            self.problem_domain,
            bullet_list(&self.problems),
            self.value_prop,
            self.target_action,
        );
        if let Some(ref follow_up) = self.follow_up_action {
            text.push_str(&format!("\nInterested people will be invited to {follow_up}."));
        }
        if self.is_paid_service {
            let prices: Vec<String> = self.price_points.iter().map(|p| format!("${:.2}", p)).collect();
            text.push_str(&format!("\nYou'll test these price points: {}.", prices.join(", ")));
        }
        text.push_str("\nIs that correct?");
        text
    }
}

fn bullet_list(items: &[String]) -> String {
    items
        .iter()
        .map(|item| format!("- {item}"))
        .collect::<Vec<_>>()
        .join("\n")
}
