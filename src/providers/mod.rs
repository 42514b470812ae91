use crate::repo::RepositoryRecord;
use async_trait::async_trait;
use failure::Error;

mod github;

pub use self::github::GitHub;

/// The number of results requested from a provider for each search.
pub const RESULTS_PER_SEARCH: usize = 20;

/// Something which can turn a keyword into a list of repositories.
#[async_trait]
pub trait Provider: Send + Sync {
    fn name(&self) -> &str;

    /// Run a single search, returning at most [`RESULTS_PER_SEARCH`] results
    /// in the order the provider ranked them.
    async fn search(&self, keyword: &str) -> Result<Vec<RepositoryRecord>, Error>;
}
