//! Interview script catalog: prompt templates keyed by stage name.
//!
//! Scripts are JSON objects; nested sections are addressed with dotted keys
//! (`problem_validation.resonance_prompt`). Every key the interview uses must
//! be present when the catalog is built, so a bad script is rejected before
//! any session starts rather than mid-conversation.

use std::collections::HashMap;
use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;

use crate::error::{ConfigError, InterviewError};

static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{([A-Za-z_]+)\}").expect("placeholder regex is valid"));

/// Template names used by the interview.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScriptKey {
    Intro,
    ContextQuestion,
    ProblemStatementIntro,
    ResonancePrompt,
    ExplanationPrompt,
    ActionPrompt,
    PitchPrompt,
    PricePrompt,
    IntentPrompt,
    Closing,
}

impl ScriptKey {
    pub const ALL: [ScriptKey; 10] = [
        ScriptKey::Intro,
        ScriptKey::ContextQuestion,
        ScriptKey::ProblemStatementIntro,
        ScriptKey::ResonancePrompt,
        ScriptKey::ExplanationPrompt,
        ScriptKey::ActionPrompt,
        ScriptKey::PitchPrompt,
        ScriptKey::PricePrompt,
        ScriptKey::IntentPrompt,
        ScriptKey::Closing,
    ];

    /// Dotted path of the key inside the script JSON.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Intro => "intro",
            Self::ContextQuestion => "context_question",
            Self::ProblemStatementIntro => "problem_statement_intro",
            Self::ResonancePrompt => "problem_validation.resonance_prompt",
            Self::ExplanationPrompt => "problem_validation.explanation_prompt",
            Self::ActionPrompt => "problem_validation.action_prompt",
            Self::PitchPrompt => "value_prop_test.pitch_prompt",
            Self::PricePrompt => "value_prop_test.price_prompt",
            Self::IntentPrompt => "intent_prompt",
            Self::Closing => "closing",
        }
    }

    /// Placeholders the template may contain.
    pub fn placeholders(&self) -> &'static [&'static str] {
        match self {
            Self::ContextQuestion => &["domain"],
            Self::ResonancePrompt => &["problem_statement"],
            Self::PitchPrompt => &["value_prop", "target_action"],
            Self::IntentPrompt => &["follow_up_action"],
            _ => &[],
        }
    }
}

impl std::fmt::Display for ScriptKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

const BUILTIN: [(ScriptKey, &str); 10] = [
    (
        ScriptKey::Intro,
        "Hi! Thanks for taking a few minutes to chat. I'm helping a founder learn about real \
         experiences, so there are no right or wrong answers. Stories about what actually \
         happened are the most useful thing you can share.",
    ),
    (
        ScriptKey::ContextQuestion,
        "To start, can you tell me a bit about how {domain} shows up in your life or work?",
    ),
    (
        ScriptKey::ProblemStatementIntro,
        "Thanks. I'm going to describe a problem some people have mentioned, and I'd love to \
         hear whether it matches your experience. Ready?",
    ),
    (
        ScriptKey::ResonancePrompt,
        "Here it is: \"{problem_statement}\". On a scale of 1 to 5, how much does this resonate \
         with your own experience? (1 = not at all, 5 = all the time)",
    ),
    (
        ScriptKey::ExplanationPrompt,
        "Can you tell me about the last time this happened? What was going on?",
    ),
    (
        ScriptKey::ActionPrompt,
        "What, if anything, have you tried to solve it? What did that cost you in time or money?",
    ),
    (
        ScriptKey::PitchPrompt,
        "Imagine there was {value_prop}. Would you {target_action}? Why or why not?",
    ),
    (
        ScriptKey::PricePrompt,
        "What would you expect to pay for something like that, and how do you pay for similar \
         things today?",
    ),
    (
        ScriptKey::IntentPrompt,
        "If the founder follows up, would you like to {follow_up_action}?",
    ),
    (
        ScriptKey::Closing,
        "That's really helpful, thank you for being so open about it.",
    ),
];

/// Validated, read-only collection of prompt templates.
#[derive(Debug, Clone)]
pub struct ScriptCatalog {
    templates: HashMap<ScriptKey, String>,
}

impl ScriptCatalog {
    /// The script shipped with MomBot.
    pub fn builtin() -> Self {
        Self {
            templates: BUILTIN
                .iter()
                .map(|(key, text)| (*key, (*text).to_string()))
                .collect(),
        }
    }

    /// Build a catalog from a parsed script document.
    pub fn from_value(value: &serde_json::Value) -> Result<Self, ConfigError> {
        let mut templates = HashMap::new();
        let mut missing = Vec::new();

        for key in ScriptKey::ALL {
            let found = key
                .as_str()
                .split('.')
                .try_fold(value, |node, segment| node.get(segment))
                .and_then(|node| node.as_str());
            match found {
                Some(text) if !text.trim().is_empty() => {
                    check_placeholders(key, text)?;
                    templates.insert(key, text.to_string());
                }
                _ => missing.push(key.as_str().to_string()),
            }
        }

        if !missing.is_empty() {
            return Err(ConfigError::MissingTemplates(missing));
        }

        Ok(Self { templates })
    }

    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let value: serde_json::Value =
            serde_json::from_str(json).map_err(|e| ConfigError::ParseError(e.to_string()))?;
        Self::from_value(&value)
    }

    /// Load a script file from disk.
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        let catalog = Self::from_json_str(&json)?;
        tracing::info!(path = %path.display(), "Loaded interview script");
        Ok(catalog)
    }

    /// Raw template text.
    pub fn get(&self, key: ScriptKey) -> Option<&str> {
        self.templates.get(&key).map(String::as_str)
    }

    /// Render a template, substituting `{name}` placeholders.
    pub fn render(&self, key: ScriptKey, vars: &[(&str, &str)]) -> Result<String, InterviewError> {
        let template = self.get(key).ok_or_else(|| InterviewError::Template {
            key: key.as_str().to_string(),
        })?;
        // Single pass: substituted values are never rescanned for placeholders.
        let rendered = PLACEHOLDER.replace_all(template, |caps: &regex::Captures<'_>| {
            vars.iter()
                .find(|(name, _)| *name == &caps[1])
                .map_or_else(|| caps[0].to_string(), |(_, value)| (*value).to_string())
        });
        Ok(rendered.into_owned())
    }
}

impl Default for ScriptCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

fn check_placeholders(key: ScriptKey, text: &str) -> Result<(), ConfigError> {
    for caps in PLACEHOLDER.captures_iter(text) {
        let name = &caps[1];
        if !key.placeholders().contains(&name) {
            return Err(ConfigError::UnknownPlaceholder {
                key: key.as_str().to_string(),
                placeholder: name.to_string(),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn script_json() -> serde_json::Value {
        serde_json::json!({
            "intro": "Hello.",
            "context_question": "Tell me about {domain}.",
            "problem_statement_intro": "Next problem.",
            "problem_validation": {
                "resonance_prompt": "Rate \"{problem_statement}\" 1-5.",
                "explanation_prompt": "Tell me more.",
                "action_prompt": "What did you do?"
            },
            "value_prop_test": {
                "pitch_prompt": "{value_prop}: would you {target_action}?",
                "price_prompt": "What would you pay?"
            },
            "intent_prompt": "Want to {follow_up_action}?",
            "closing": "Thanks!"
        })
    }

    #[test]
    fn builtin_has_every_key_with_valid_placeholders() {
        let catalog = ScriptCatalog::builtin();
        for key in ScriptKey::ALL {
            let text = catalog.get(key).unwrap();
            check_placeholders(key, text).unwrap();
        }
    }

    #[test]
    fn loads_nested_sections() {
        let catalog = ScriptCatalog::from_value(&script_json()).unwrap();
        assert_eq!(catalog.get(ScriptKey::ActionPrompt), Some("What did you do?"));
        assert_eq!(catalog.get(ScriptKey::PricePrompt), Some("What would you pay?"));
    }

    #[test]
    fn reports_all_missing_keys() {
        let mut value = script_json();
        value.as_object_mut().unwrap().remove("closing");
        value["value_prop_test"]
            .as_object_mut()
            .unwrap()
            .remove("price_prompt");

        let err = ScriptCatalog::from_value(&value).unwrap_err();
        match err {
            ConfigError::MissingTemplates(keys) => {
                assert_eq!(keys, vec!["value_prop_test.price_prompt", "closing"]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn non_string_template_counts_as_missing() {
        let mut value = script_json();
        value["intro"] = serde_json::json!(42);
        let err = ScriptCatalog::from_value(&value).unwrap_err();
        assert!(err.to_string().contains("intro"));
    }

    #[test]
    fn rejects_unknown_placeholder() {
        let mut value = script_json();
        value["closing"] = serde_json::json!("Bye {name}!");
        let err = ScriptCatalog::from_value(&value).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::UnknownPlaceholder { ref key, ref placeholder }
                if key == "closing" && placeholder == "name"
        ));
    }

    #[test]
    fn render_substitutes_placeholders() {
        let catalog = ScriptCatalog::from_value(&script_json()).unwrap();
        let text = catalog
            .render(
                ScriptKey::PitchPrompt,
                &[("value_prop", "A water tracker"), ("target_action", "sign up")],
            )
            .unwrap();
        assert_eq!(text, "A water tracker: would you sign up?");
    }

    #[test]
    fn render_leaves_braces_inside_values_alone() {
        let mut value = script_json();
        value["value_prop_test"]["pitch_prompt"] =
            serde_json::json!("PITCH {value_prop} / {target_action}");
        let catalog = ScriptCatalog::from_value(&value).unwrap();
        let text = catalog
            .render(
                ScriptKey::PitchPrompt,
                &[("value_prop", "save {target_action}"), ("target_action", "sign up")],
            )
            .unwrap();
        assert_eq!(text, "PITCH save {target_action} / sign up");
    }

    #[test]
    fn render_without_vars_returns_template() {
        let catalog = ScriptCatalog::builtin();
        let text = catalog.render(ScriptKey::Closing, &[]).unwrap();
        assert_eq!(text, catalog.get(ScriptKey::Closing).unwrap());
    }

    #[test]
    fn from_path_reads_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{}", script_json()).unwrap();
        let catalog = ScriptCatalog::from_path(file.path()).unwrap();
        assert_eq!(catalog.get(ScriptKey::Intro), Some("Hello."));
    }

    #[test]
    fn from_path_missing_file_is_io_error() {
        let err = ScriptCatalog::from_path(Path::new("/nonexistent/script.json")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
