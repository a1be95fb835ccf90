#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use std::{
    sync::{Arc, Mutex, OnceLock},
    time::Duration,
};

use anyhow::Result;
use postgrest::Postgrest;
use state::InitCell;

use crate::{
    constants::{
        DEFAULT_COMPLETION_TIMEOUT_SECS, DEFAULT_GRANT_TTL_HOURS, DEFAULT_TRIAL_HOURS,
        MAX_CONFIGURED_HOURS,
    },
    prompts::PromptCatalog,
};

/// Supabase credentials loaded from the environment, if available.
#[derive(Clone)]
struct SupabaseEnv {
    /// Fully qualified PostgREST endpoint.
    rest_endpoint: String,
    /// API key used for PostgREST requests.
    api_key:       String,
}

impl SupabaseEnv {
    /// Builds a Supabase credential bundle from environment-provided values.
    fn new(url: String, key: String) -> Self {
        let rest_endpoint = format!("{}/rest/v1", url.trim_end_matches('/'));
        Self {
            rest_endpoint,
            api_key: key,
        }
    }
}

/// OpenAI credentials and optional tuning parameters sourced from the
/// environment.
#[derive(Clone)]
pub struct OpenAiEnv {
    /// Base URL for the OpenAI-compatible API endpoint.
    api_base:    String,
    /// API key used to authenticate OpenAI requests.
    api_key:     String,
    /// Model identifier for chat completions.
    model:       String,
    /// Optional temperature override applied to every call.
    temperature: Option<f32>,
}

impl OpenAiEnv {
    /// Builds a configuration explicitly, bypassing the environment.
    pub fn new(
        api_base: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            api_base:    api_base.into(),
            api_key:     api_key.into(),
            model:       model.into(),
            temperature: None,
        }
    }

    /// Construct an `OpenAiEnv` from environment variables; returns `None` if
    /// the API key is missing.
    fn from_env() -> Option<Self> {
        let api_key = std::env::var("OPENAI_API_KEY").ok()?.trim().to_owned();
        if api_key.is_empty() {
            return None;
        }

        let api_base = std::env::var("OPENAI_ENDPOINT")
            .map(|value| value.trim().to_owned())
            .ok()
            .filter(|value| !value.is_empty())
            .unwrap_or_else(|| "https://api.openai.com/v1".to_string());
        let model = std::env::var("OPENAI_MODEL")
            .map(|value| value.trim().to_owned())
            .ok()
            .filter(|value| !value.is_empty())
            .unwrap_or_else(|| "gpt-4".to_string());
        let temperature = std::env::var("OPENAI_TEMPERATURE")
            .ok()
            .and_then(|s| s.parse::<f32>().ok());

        Some(Self {
            api_base,
            api_key,
            model,
            temperature,
        })
    }

    /// Returns the API base URL used for OpenAI requests.
    pub fn api_base(&self) -> &str {
        &self.api_base
    }

    /// Returns the API key used for OpenAI requests.
    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    /// Returns the model identifier.
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Returns the configured temperature override, if any.
    pub fn temperature(&self) -> Option<f32> {
        self.temperature
    }
}

/// Runtime and prompt configuration shared across the crate.
pub struct ConfigState {
    /// Supabase credentials, if configured.
    supabase:           Option<SupabaseEnv>,
    /// Lazily constructed Supabase PostgREST client.
    postgrest:          InitCell<Postgrest>,
    /// Cached OpenAI configuration, if available.
    openai:             Option<OpenAiEnv>,
    /// Bound imposed on a single completion call.
    completion_timeout: Duration,
    /// Lifetime of a remediation access grant.
    grant_ttl:          chrono::Duration,
    /// Length of the free trial opened at account creation.
    trial_duration:     chrono::Duration,
    /// Prompt templates for both languages.
    prompts:            Arc<PromptCatalog>,
}

impl ConfigState {
    /// Construct a new configuration instance by reading environment and prompt
    /// assets.
    fn new() -> Result<Self> {
        let supabase =
            match (std::env::var("SUPABASE_URL").ok(), std::env::var("SUPABASE_ANON_KEY").ok()) {
                (Some(url), Some(key)) if !url.trim().is_empty() && !key.trim().is_empty() => {
                    Some(SupabaseEnv::new(url, key))
                }
                _ => None,
            };

        Ok(Self {
            supabase,
            postgrest: InitCell::new(),
            openai: OpenAiEnv::from_env(),
            completion_timeout: read_timeout_secs(
                "REMEDIA_COMPLETION_TIMEOUT_SECS",
                DEFAULT_COMPLETION_TIMEOUT_SECS,
            ),
            grant_ttl: read_hours("REMEDIA_GRANT_TTL_HOURS", DEFAULT_GRANT_TTL_HOURS),
            trial_duration: read_hours("REMEDIA_TRIAL_HOURS", DEFAULT_TRIAL_HOURS),
            prompts: Arc::new(PromptCatalog::load()),
        })
    }

    /// Returns the configured PostgREST client if credentials are available.
    pub fn postgrest(&self) -> Option<Postgrest> {
        if let Some(client) = self.postgrest.try_get() {
            return Some(client.clone());
        }

        let creds = self.supabase.as_ref()?;
        let client = Postgrest::new(creds.rest_endpoint.clone())
            .insert_header("apikey", creds.api_key.clone())
            .insert_header("Authorization", format!("Bearer {}", creds.api_key));
        self.postgrest.set(client);
        Some(self.postgrest.get().clone())
    }

    /// Returns the OpenAI configuration, if the API key is present.
    pub fn openai(&self) -> Option<&OpenAiEnv> {
        self.openai.as_ref()
    }

    /// Returns the bound imposed on a single completion call.
    pub fn completion_timeout(&self) -> Duration {
        self.completion_timeout
    }

    /// Returns the lifetime of a remediation access grant.
    pub fn grant_ttl(&self) -> chrono::Duration {
        self.grant_ttl
    }

    /// Returns the free trial length.
    pub fn trial_duration(&self) -> chrono::Duration {
        self.trial_duration
    }

    /// Returns the shared prompt catalog.
    pub fn prompts(&self) -> Arc<PromptCatalog> {
        Arc::clone(&self.prompts)
    }
}

/// Shared configuration handle used throughout the crate.
#[derive(Clone)]
pub struct ConfigHandle(Arc<ConfigState>);

impl std::ops::Deref for ConfigHandle {
    type Target = ConfigState;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// Global storage for the lazily constructed configuration state.
static CONFIG_SLOT: OnceLock<Mutex<Option<Arc<ConfigState>>>> = OnceLock::new();

/// Returns the mutex guarding the global configuration slot.
fn slot() -> &'static Mutex<Option<Arc<ConfigState>>> {
    CONFIG_SLOT.get_or_init(|| Mutex::new(None))
}

/// Ensure the global configuration has been initialized and return a handle.
pub fn ensure_initialized() -> Result<ConfigHandle> {
    let slot = slot();
    let mut guard = slot.lock().expect("config slot poisoned");
    if let Some(cfg) = guard.as_ref() {
        return Ok(ConfigHandle(Arc::clone(cfg)));
    }

    let cfg = Arc::new(ConfigState::new()?);
    *guard = Some(Arc::clone(&cfg));
    Ok(ConfigHandle(cfg))
}

/// Returns the active configuration, initializing it on demand.
pub fn get() -> ConfigHandle {
    ensure_initialized().expect("configuration initialization failed")
}

/// Returns the configured PostgREST client, if Supabase has been configured.
pub fn postgrest_client() -> Option<Postgrest> {
    get().postgrest()
}

/// Parses an environment variable into a `Duration`, falling back to
/// `default_secs` when parsing fails or the variable is missing.
fn read_timeout_secs(env: &str, default_secs: u64) -> Duration {
    std::env::var(env)
        .ok()
        .and_then(|value| value.parse::<u64>().ok())
        .map(Duration::from_secs)
        .unwrap_or_else(|| Duration::from_secs(default_secs))
}

/// Reads a positive hour count from the environment.
fn read_hours(env: &str, default_hours: i64) -> chrono::Duration {
    parse_hours(std::env::var(env).ok().as_deref(), default_hours)
}

/// Hour count in `1..=MAX_CONFIGURED_HOURS`, or `default_hours` for anything
/// else.
fn parse_hours(value: Option<&str>, default_hours: i64) -> chrono::Duration {
    value
        .and_then(|value| value.trim().parse::<i64>().ok())
        .filter(|hours| (1..=MAX_CONFIGURED_HOURS).contains(hours))
        .and_then(chrono::Duration::try_hours)
        .unwrap_or_else(|| chrono::Duration::hours(default_hours))
}
