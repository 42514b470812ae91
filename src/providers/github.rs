use super::{Provider, RESULTS_PER_SEARCH};
use crate::config::GitHubConfig;
use crate::errors::FailedRequest;
use crate::repo::RepositoryRecord;
use async_trait::async_trait;
use failure::{Error, ResultExt};
use reqwest::header::{ACCEPT, USER_AGENT};
use reqwest::Client;
use serde_derive::Deserialize;
use std::fmt::{self, Debug, Formatter};

const MIME_TYPE: &str = "application/vnd.github.v3+json";

/// Search GitHub for repositories.
#[derive(Clone)]
pub struct GitHub {
    client: Client,
    cfg: GitHubConfig,
}

impl GitHub {
    /// Create a new `GitHub` with the provided config.
    pub fn with_config(cfg: GitHubConfig) -> GitHub {
        GitHub {
            client: Client::new(),
            cfg,
        }
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/search/repositories",
            self.cfg.api_url.trim_end_matches('/')
        )
    }

    async fn send_request(&self, keyword: &str) -> Result<SearchResults, Error> {
        let endpoint = self.endpoint();
        debug!("Sending request to {:?} (q={:?})", endpoint, keyword);

        let per_page = RESULTS_PER_SEARCH.to_string();
        let request = self
            .client
            .get(&endpoint)
            .query(&[("q", keyword), ("per_page", per_page.as_str())])
            .header(USER_AGENT, self.cfg.agent.as_str())
            .header(ACCEPT, MIME_TYPE)
            .build()
            .context("Generated invalid request. This is a bug.")?;

        let response = self
            .client
            .execute(request)
            .await
            .context("Unable to send request")?;

        let status = response.status();
        debug!("Received response ({})", status);

        if log_enabled!(log::Level::Trace) {
            for line in format!("Response Headers {:#?}", response.headers()).lines() {
                trace!("{}", line);
            }
        }

        let body = response
            .text()
            .await
            .context("Unable to read the response body")?;

        if log_enabled!(log::Level::Trace) {
            trace!("Body:");
            for line in body.lines() {
                trace!("{}", line);
            }
        }

        if !status.is_success() {
            warn!("Request failed with {}", status);

            let err = FailedRequest {
                status,
                url: endpoint,
            };

            return Err(err.into());
        }

        let got = serde_json::from_str(&body).context("Unable to deserialize response")?;
        Ok(got)
    }
}

#[async_trait]
impl Provider for GitHub {
    fn name(&self) -> &str {
        "github"
    }

    async fn search(&self, keyword: &str) -> Result<Vec<RepositoryRecord>, Error> {
        let results = self.send_request(keyword).await?;

        debug!(
            "{} repos matched {:?}, received {}",
            results.total_count,
            keyword,
            results.items.len()
        );

        Ok(results.items.into_iter().map(convert_repo).collect())
    }
}

impl Debug for GitHub {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        f.debug_struct("GitHub")
            .field("api_url", &self.cfg.api_url)
            .finish()
    }
}

fn convert_repo(raw: RawRepo) -> RepositoryRecord {
    RepositoryRecord {
        name: raw.name,
        description: raw.description,
        stars: raw.stargazers_count,
        url: raw.html_url,
    }
}

/// The body of a `/search/repositories` response. Only `items` is required.
#[derive(Debug, Clone, Deserialize)]
struct SearchResults {
    #[serde(default)]
    total_count: u64,
    items: Vec<RawRepo>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct RawRepo {
    name: String,
    description: Option<String>,
    stargazers_count: u64,
    html_url: String,
}
