use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::net::{AddrParseError, SocketAddr};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::index::embeddings::{EmbeddingConfig, EMBEDDING_MODEL, OLLAMA_HOST};
use crate::providers::configs::{
    OpenAiProviderConfig, ProviderConfig, GROQ_HOST, GROQ_MODEL, OPENAI_HOST, OPENAI_MODEL,
};
use crate::providers::factory::ProviderType;
use crate::tools::github::{default_fallback_report, GithubConfig, GITHUB_API, GITHUB_USERNAME};

const ENV_PREFIX: &str = "FOLIO";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing required environment variable: {env_var}")]
    MissingEnvVar { env_var: String },
    #[error("Configuration error: {0}")]
    Other(#[from] config::ConfigError),
}

/// The environment variable that sets a dotted configuration key, e.g. `provider.type`
pub fn to_env_var(field_path: &str) -> String {
    let mut env_var = String::from(ENV_PREFIX);
    for part in field_path.split('.') {
        env_var.push_str("__");
        env_var.push_str(&part.to_uppercase());
    }
    // the prefix itself is joined with a single underscore
    env_var.replacen("FOLIO__", "FOLIO_", 1)
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl ServerSettings {
    pub fn socket_addr(&self) -> Result<SocketAddr, AddrParseError> {
        format!("{}:{}", self.host, self.port).parse()
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "lowercase", tag = "type")]
pub enum ProviderSettings {
    Groq {
        #[serde(default = "default_groq_host")]
        host: String,
        #[serde(default)]
        api_key: Option<String>,
        #[serde(default = "default_groq_model")]
        model: String,
        #[serde(default = "default_groq_temperature")]
        temperature: Option<f32>,
        #[serde(default)]
        max_tokens: Option<i32>,
    },
    OpenAi {
        #[serde(default = "default_openai_host")]
        host: String,
        #[serde(default)]
        api_key: Option<String>,
        #[serde(default = "default_openai_model")]
        model: String,
        #[serde(default)]
        temperature: Option<f32>,
        #[serde(default)]
        max_tokens: Option<i32>,
    },
}

impl Default for ProviderSettings {
    fn default() -> Self {
        ProviderSettings::Groq {
            host: default_groq_host(),
            api_key: None,
            model: default_groq_model(),
            temperature: default_groq_temperature(),
            max_tokens: None,
        }
    }
}

impl ProviderSettings {
    pub fn provider_type(&self) -> ProviderType {
        match self {
            ProviderSettings::Groq { .. } => ProviderType::Groq,
            ProviderSettings::OpenAi { .. } => ProviderType::OpenAi,
        }
    }

    pub fn model(&self) -> &str {
        match self {
            ProviderSettings::Groq { model, .. } | ProviderSettings::OpenAi { model, .. } => model,
        }
    }

    /// Convert to a provider config. An unset key falls back to the backend's usual
    /// environment variable (`GROQ_API_KEY` or `OPENAI_API_KEY`).
    pub fn into_config(self) -> ProviderConfig {
        match self {
            ProviderSettings::Groq {
                host,
                api_key,
                model,
                temperature,
                max_tokens,
            } => ProviderConfig::Groq(OpenAiProviderConfig {
                host,
                api_key: api_key.or_else(|| env_var("GROQ_API_KEY")),
                model,
                temperature,
                max_tokens,
            }),
            ProviderSettings::OpenAi {
                host,
                api_key,
                model,
                temperature,
                max_tokens,
            } => ProviderConfig::OpenAi(OpenAiProviderConfig {
                host,
                api_key: api_key.or_else(|| env_var("OPENAI_API_KEY")),
                model,
                temperature,
                max_tokens,
            }),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AgentSettings {
    #[serde(default = "default_max_rounds")]
    pub max_rounds: usize,
    /// Replaces the built-in system prompt template
    #[serde(default)]
    pub system_prompt_path: Option<PathBuf>,
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self {
            max_rounds: default_max_rounds(),
            system_prompt_path: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contact {
    pub label: String,
    pub value: String,
}

/// Who the assistant talks about
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OwnerProfile {
    pub name: String,
    pub github_username: String,
    pub headline: Option<String>,
    pub education: Option<String>,
    pub contacts: Vec<Contact>,
}

impl Default for OwnerProfile {
    fn default() -> Self {
        Self {
            name: "Harshit Chawla".to_string(),
            github_username: GITHUB_USERNAME.to_string(),
            headline: Some("Aspiring AI/ML Engineer".to_string()),
            education: Some("BCA at GGSIPU".to_string()),
            contacts: vec![
                Contact {
                    label: "LinkedIn".to_string(),
                    value: "[Harshit Chawla](https://linkedin.com/in/harshitchawla4705)"
                        .to_string(),
                },
                Contact {
                    label: "GitHub".to_string(),
                    value: format!(
                        "[{0}](https://github.com/{0})",
                        GITHUB_USERNAME
                    ),
                },
            ],
        }
    }
}

impl OwnerProfile {
    pub fn first_name(&self) -> &str {
        self.name.split_whitespace().next().unwrap_or(&self.name)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct GithubSettings {
    #[serde(default = "default_github_api")]
    pub api_base: String,
    /// Falls back to `GITHUB_TOKEN`
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default = "default_github_timeout")]
    pub timeout_secs: u64,
    /// Served when the live statistics cannot be fetched. Defaults to the stored report for
    /// the built-in owner, or a short notice naming any other user.
    #[serde(default)]
    pub fallback_report: Option<String>,
}

impl Default for GithubSettings {
    fn default() -> Self {
        Self {
            api_base: default_github_api(),
            token: None,
            timeout_secs: default_github_timeout(),
            fallback_report: None,
        }
    }
}

impl GithubSettings {
    pub fn to_config(&self, username: &str) -> GithubConfig {
        GithubConfig {
            api_base: self.api_base.clone(),
            username: username.to_string(),
            token: self.token.clone().or_else(|| env_var("GITHUB_TOKEN")),
            timeout: Duration::from_secs(self.timeout_secs),
            fallback: self
                .fallback_report
                .clone()
                .unwrap_or_else(|| default_fallback_report(username)),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct IndexSettings {
    #[serde(default = "default_store_path")]
    pub store_path: PathBuf,
    #[serde(default = "default_embedding_host")]
    pub embedding_host: String,
    #[serde(default = "default_embedding_model")]
    pub embedding_model: String,
    #[serde(default)]
    pub embedding_api_key: Option<String>,
}

impl Default for IndexSettings {
    fn default() -> Self {
        Self {
            store_path: default_store_path(),
            embedding_host: default_embedding_host(),
            embedding_model: default_embedding_model(),
            embedding_api_key: None,
        }
    }
}

impl IndexSettings {
    pub fn embedding_config(&self) -> EmbeddingConfig {
        EmbeddingConfig {
            host: self.embedding_host.clone(),
            model: self.embedding_model.clone(),
            api_key: self.embedding_api_key.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub provider: ProviderSettings,
    #[serde(default)]
    pub agent: AgentSettings,
    #[serde(default)]
    pub owner: OwnerProfile,
    #[serde(default)]
    pub github: GithubSettings,
    #[serde(default)]
    pub index: IndexSettings,
}

impl Settings {
    /// Defaults, then `folio.toml` in the working directory if present, then `FOLIO_` variables
    pub fn new() -> Result<Self, ConfigError> {
        Self::load(None)
    }

    /// Like [`Settings::new`], but reading the given file, which must exist
    pub fn load(file: Option<&Path>) -> Result<Self, ConfigError> {
        let file_source = match file {
            Some(path) => File::from(path).required(true),
            None => File::with_name("folio").required(false),
        };

        let config = Config::builder()
            .set_default("provider.type", "groq")?
            .add_source(file_source)
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        match config.try_deserialize::<Self>() {
            Ok(settings) => Ok(settings),
            Err(err) => {
                tracing::debug!("Configuration error: {:?}", &err);

                let error_str = err.to_string();
                if error_str.starts_with("missing field") {
                    let field = error_str
                        .trim_start_matches("missing field `")
                        .trim_end_matches('`');
                    Err(ConfigError::MissingEnvVar {
                        env_var: to_env_var(field),
                    })
                } else if let config::ConfigError::NotFound(field) = &err {
                    Err(ConfigError::MissingEnvVar {
                        env_var: to_env_var(field),
                    })
                } else {
                    Err(ConfigError::Other(err))
                }
            }
        }
    }
}

fn env_var(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|value| !value.is_empty())
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_groq_host() -> String {
    GROQ_HOST.to_string()
}

fn default_groq_model() -> String {
    GROQ_MODEL.to_string()
}

fn default_groq_temperature() -> Option<f32> {
    Some(0.4)
}

fn default_openai_host() -> String {
    OPENAI_HOST.to_string()
}

fn default_openai_model() -> String {
    OPENAI_MODEL.to_string()
}

fn default_max_rounds() -> usize {
    crate::agent::DEFAULT_MAX_ROUNDS
}

fn default_github_api() -> String {
    GITHUB_API.to_string()
}

fn default_github_timeout() -> u64 {
    10
}

fn default_store_path() -> PathBuf {
    PathBuf::from("chroma_db").join("index.json")
}

fn default_embedding_host() -> String {
    OLLAMA_HOST.to_string()
}

fn default_embedding_model() -> String {
    EMBEDDING_MODEL.to_string()
}
