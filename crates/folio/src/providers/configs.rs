pub const GROQ_HOST: &str = "https://api.groq.com/openai";
pub const GROQ_MODEL: &str = "openai/gpt-oss-20b";
pub const OPENAI_HOST: &str = "https://api.openai.com";
pub const OPENAI_MODEL: &str = "gpt-4o";

// Unified enum to wrap different provider configurations
#[derive(Debug, Clone)]
pub enum ProviderConfig {
    Groq(OpenAiProviderConfig),
    OpenAi(OpenAiProviderConfig),
}

/// Settings for any backend speaking the OpenAI chat-completions protocol
#[derive(Debug, Clone)]
pub struct OpenAiProviderConfig {
    pub host: String,
    /// Missing credentials are reported when the backend is first called, not at startup
    pub api_key: Option<String>,
    pub model: String,
    pub temperature: Option<f32>,
    pub max_tokens: Option<i32>,
}

impl OpenAiProviderConfig {
    pub fn groq(api_key: Option<String>) -> Self {
        Self {
            host: GROQ_HOST.to_string(),
            api_key,
            model: GROQ_MODEL.to_string(),
            temperature: Some(0.4),
            max_tokens: None,
        }
    }
}
