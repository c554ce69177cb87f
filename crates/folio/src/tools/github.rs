use anyhow::{anyhow, Result};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use std::fmt::Display;
use std::time::Duration;

use super::registry::{ToolDeclaration, ToolHandler};
use crate::errors::AgentResult;
use crate::models::tool::Tool;

pub const GET_GITHUB_STATS: &str = "get_github_stats";
pub const GITHUB_API: &str = "https://api.github.com";
pub const GITHUB_USERNAME: &str = "Harshit4705";
pub const GITHUB_TIMEOUT: Duration = Duration::from_secs(10);

const TOP_REPOSITORIES: usize = 5;

/// Served for the default owner whenever the live statistics cannot be fetched
pub const FALLBACK_REPORT: &str = "GitHub User: Harshit4705
Name: Harshit Chawla
Bio: Python Developer
Public Repos: 9
Followers: 0
Following: 0
Total Stars: 9
Profile: https://github.com/Harshit4705

Top Repositories:
  - portfolio-backend (1 ⭐) - Portfolio chatbot API
  - my-ai-portfolio (1 ⭐) - Portfolio website
  - Code-Review-Agent (1 ⭐) - AI code review assistant
  - AI-Researcher (1 ⭐) - AI research paper assistant
  - Aidly (1 ⭐) - Emergency medical AI assistant";

#[derive(Debug, Clone)]
pub struct GithubConfig {
    pub api_base: String,
    pub username: String,
    /// Raises the API rate limit when present
    pub token: Option<String>,
    pub timeout: Duration,
    /// Returned verbatim when the live statistics cannot be fetched
    pub fallback: String,
}

impl Default for GithubConfig {
    fn default() -> Self {
        Self::for_user(GITHUB_USERNAME)
    }
}

impl GithubConfig {
    pub fn for_user(username: &str) -> Self {
        Self {
            api_base: GITHUB_API.to_string(),
            username: username.to_string(),
            token: None,
            timeout: GITHUB_TIMEOUT,
            fallback: default_fallback_report(username),
        }
    }
}

/// The stored report for the default owner; any other user gets a short notice naming them
pub fn default_fallback_report(username: &str) -> String {
    if username == GITHUB_USERNAME {
        FALLBACK_REPORT.to_string()
    } else {
        format!(
            "GitHub User: {0}\nLive GitHub statistics are unavailable right now.\nProfile: https://github.com/{0}",
            username
        )
    }
}

#[derive(Debug, Deserialize)]
struct Profile {
    login: Option<String>,
    name: Option<String>,
    bio: Option<String>,
    public_repos: Option<u64>,
    followers: Option<u64>,
    following: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct Repository {
    name: String,
    #[serde(default)]
    stargazers_count: u64,
}

/// Live GitHub statistics for the portfolio owner. Never fails: any problem reaching the API
/// yields the configured fallback report instead.
#[derive(Clone)]
pub struct GithubStats {
    client: Client,
    config: GithubConfig,
}

impl GithubStats {
    pub fn new(config: GithubConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("folio/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client, config })
    }

    pub fn tool() -> Tool {
        Tool::new(
            GET_GITHUB_STATS,
            format!(
                "Fetch live GitHub statistics (repos, stars, contributions) for the portfolio owner {}.",
                GITHUB_USERNAME
            ),
            json!({
                "type": "object",
                "properties": {}
            }),
        )
    }

    pub fn declaration(self) -> ToolDeclaration {
        let mut tool = Self::tool();
        if self.config.username != GITHUB_USERNAME {
            tool.description = tool.description.replace(GITHUB_USERNAME, &self.config.username);
        }
        ToolDeclaration::new(tool, self)
    }

    /// The live report, or the configured fallback report if it cannot be fetched
    pub async fn report(&self) -> String {
        match self.fetch_report().await {
            Ok(report) => report,
            Err(e) => {
                tracing::warn!(username = %self.config.username, "using fallback GitHub stats: {}", e);
                self.config.fallback.clone()
            }
        }
    }

    async fn fetch_report(&self) -> Result<String> {
        let base = self.config.api_base.trim_end_matches('/');
        let user_url = format!("{}/users/{}", base, self.config.username);
        let repos_url = format!(
            "{}/users/{}/repos?per_page=100&sort=updated",
            base, self.config.username
        );

        let (profile, repositories) = tokio::try_join!(
            self.get::<Profile>(&user_url),
            self.get::<Vec<Repository>>(&repos_url)
        )?;

        Ok(format_report(&profile, repositories))
    }

    async fn get<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        let mut request = self
            .client
            .get(url)
            .header("Accept", "application/vnd.github.v3+json");
        if let Some(token) = &self.config.token {
            request = request.header("Authorization", format!("Bearer {}", token));
        }

        let response = request.send().await?;
        match response.status() {
            status if status.is_success() => Ok(response.json().await?),
            StatusCode::FORBIDDEN | StatusCode::TOO_MANY_REQUESTS => {
                Err(anyhow!("GitHub API rate limited ({})", url))
            }
            status => Err(anyhow!("GitHub API returned {} for {}", status, url)),
        }
    }
}

#[async_trait]
impl ToolHandler for GithubStats {
    async fn execute(&self, _arguments: Value) -> AgentResult<String> {
        Ok(self.report().await)
    }
}

fn display_or_none<T: Display>(value: &Option<T>) -> String {
    value
        .as_ref()
        .map(|v| v.to_string())
        .unwrap_or_else(|| "None".to_string())
}

fn format_report(profile: &Profile, mut repositories: Vec<Repository>) -> String {
    let total_stars: u64 = repositories.iter().map(|r| r.stargazers_count).sum();

    // sort_by is stable, so equally starred repositories keep the API's order
    repositories.sort_by(|a, b| b.stargazers_count.cmp(&a.stargazers_count));
    let top = repositories
        .iter()
        .take(TOP_REPOSITORIES)
        .map(|r| format!("  - {} ({} ⭐)", r.name, r.stargazers_count))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "GitHub User: {}\nName: {}\nBio: {}\nPublic Repos: {}\nFollowers: {}\nFollowing: {}\nTotal Stars: {}\nTop Repositories:\n{}",
        display_or_none(&profile.login),
        display_or_none(&profile.name),
        display_or_none(&profile.bio),
        display_or_none(&profile.public_repos),
        display_or_none(&profile.followers),
        display_or_none(&profile.following),
        total_stars,
        top
    )
}
