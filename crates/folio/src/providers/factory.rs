use super::{base::Provider, configs::ProviderConfig, openai::OpenAiProvider};
use anyhow::Result;
use serde::Deserialize;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderType {
    Groq,
    OpenAi,
}

pub fn get_provider(config: ProviderConfig) -> Result<Arc<dyn Provider>> {
    match config {
        ProviderConfig::Groq(groq_config) => Ok(Arc::new(OpenAiProvider::new(groq_config)?)),
        ProviderConfig::OpenAi(openai_config) => {
            Ok(Arc::new(OpenAiProvider::new(openai_config)?))
        }
    }
}
