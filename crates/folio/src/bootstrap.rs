//! Wiring shared by the server and the CLI: settings in, a ready [`Agent`] out
use anyhow::{Context, Result};
use std::sync::Arc;

use crate::agent::Agent;
use crate::configuration::Settings;
use crate::index::embeddings::OpenAiEmbedder;
use crate::index::LocalIndex;
use crate::prompt_template::system_prompt;
use crate::providers::configs::ProviderConfig;
use crate::providers::factory::get_provider;
use crate::tools::github::GithubStats;
use crate::tools::portfolio_registry;

pub fn build_embedder(settings: &Settings) -> Result<Arc<OpenAiEmbedder>> {
    Ok(Arc::new(OpenAiEmbedder::new(
        settings.index.embedding_config(),
    )?))
}

/// Build the portfolio agent. Missing credentials only produce a warning here; the backend
/// reports them when it is first called.
pub fn build_agent(settings: &Settings) -> Result<Agent> {
    let provider_type = settings.provider.provider_type();
    let model = settings.provider.model().to_string();
    let provider_config = settings.provider.clone().into_config();
    let has_key = match &provider_config {
        ProviderConfig::Groq(config) | ProviderConfig::OpenAi(config) => config.api_key.is_some(),
    };
    if !has_key {
        tracing::warn!(
            ?provider_type,
            "no API key configured, chat requests will fail until one is set"
        );
    }
    let provider = get_provider(provider_config)?;

    let index = LocalIndex::open(&settings.index.store_path, build_embedder(settings)?);
    let stats = GithubStats::new(
        settings
            .github
            .to_config(&settings.owner.github_username),
    )?;
    let registry = Arc::new(portfolio_registry(Arc::new(index), stats)?);

    let prompt = system_prompt(
        &settings.owner,
        &registry.describe_all(),
        settings.agent.system_prompt_path.as_deref(),
    )
    .context("Failed to render the system prompt")?;

    tracing::info!(
        ?provider_type,
        model = %model,
        tools = registry.len(),
        "agent ready"
    );
    Ok(Agent::new(provider, registry, prompt).with_max_rounds(settings.agent.max_rounds))
}
