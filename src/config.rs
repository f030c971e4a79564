//! Application configuration, read from the environment.

use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use secrecy::SecretString;
use tracing::info;

use crate::error::{ConfigError, Result};
use crate::interview::{ScriptCatalog, SessionConfig, SummaryConfig};
use crate::llm::{DEFAULT_BASE_URL, LlmConfig, LlmProvider, create_provider};

/// Runtime settings for the MomBot binary.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub llm: LlmConfig,
    pub temperature: f32,
    pub max_tokens: u32,
    pub summary_timeout: Duration,
    /// Founder inputs JSON.
    pub founder_inputs: Option<PathBuf>,
    /// Interview script JSON; the built-in script is used when unset.
    pub script: Option<PathBuf>,
    /// Serve the REST API on this port when set.
    pub http_port: Option<u16>,
    /// Write finished transcripts here when set.
    pub export_dir: Option<PathBuf>,
    /// Also log to a daily rolling file here when set.
    pub log_dir: Option<PathBuf>,
}

impl AppConfig {
    pub fn from_env() -> std::result::Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> std::result::Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let api_key = get("OPENAI_API_KEY")
            .ok_or_else(|| ConfigError::MissingEnvVar("OPENAI_API_KEY".to_string()))?;

        let llm = LlmConfig {
            api_key: SecretString::from(api_key),
            project_id: get("OPENAI_PROJECT_ID"),
            base_url: get("OPENAI_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            model: get("MOMBOT_MODEL").unwrap_or_else(|| "gpt-4".to_string()),
        };

        let defaults = SummaryConfig::default();
        let temperature: f32 = parse(&get, "MOMBOT_TEMPERATURE")?.unwrap_or(defaults.temperature);
        if !(0.0..=2.0).contains(&temperature) {
            return Err(ConfigError::InvalidValue {
                key: "MOMBOT_TEMPERATURE".to_string(),
                message: format!("{temperature} is outside 0.0..=2.0"),
            });
        }

        let max_tokens: u32 = parse(&get, "MOMBOT_MAX_TOKENS")?.unwrap_or(defaults.max_tokens);
        let summary_timeout = parse::<u64>(&get, "MOMBOT_SUMMARY_TIMEOUT_SECS")?
            .map(Duration::from_secs)
            .unwrap_or(defaults.timeout);

        Ok(Self {
            llm,
            temperature,
            max_tokens,
            summary_timeout,
            founder_inputs: get("MOMBOT_FOUNDER_INPUTS").map(PathBuf::from),
            script: get("MOMBOT_SCRIPT").map(PathBuf::from),
            http_port: parse(&get, "MOMBOT_HTTP_PORT")?,
            export_dir: get("MOMBOT_EXPORT_DIR").map(PathBuf::from),
            log_dir: get("MOMBOT_LOG_DIR").map(PathBuf::from),
        })
    }

    pub fn summary_config(&self) -> SummaryConfig {
        SummaryConfig {
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            timeout: self.summary_timeout,
        }
    }

    /// Read and validate the founder inputs file.
    pub fn load_session_config(&self) -> Result<SessionConfig> {
        let path = self
            .founder_inputs
            .as_ref()
            .ok_or_else(|| ConfigError::MissingEnvVar("MOMBOT_FOUNDER_INPUTS".to_string()))?;
        let json = std::fs::read_to_string(path).map_err(ConfigError::from)?;
        let config = SessionConfig::from_json(&json)?;
        info!(path = %path.display(), problems = config.problems().len(), "Loaded founder inputs");
        Ok(config)
    }

    /// The configured script file, or the built-in script.
    pub fn load_script(&self) -> Result<ScriptCatalog> {
        match &self.script {
            Some(path) => Ok(ScriptCatalog::from_path(path)?),
            None => Ok(ScriptCatalog::builtin()),
        }
    }

    pub fn llm_provider(&self) -> Result<Arc<dyn LlmProvider>> {
        Ok(create_provider(&self.llm)?)
    }
}

fn parse<T>(
    get: &impl Fn(&str) -> Option<String>,
    key: &str,
) -> std::result::Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    get(key)
        .map(|raw| {
            raw.parse::<T>().map_err(|e| ConfigError::InvalidValue {
                key: key.to_string(),
                message: format!("{raw:?}: {e}"),
            })
        })
        .transpose()
}
