use crate::errors::RelayError;
use crate::providers::Provider;
use crate::repo::RepositoryRecord;
use crate::store::Store;
use serde_derive::{Deserialize, Serialize};
use std::fmt::{self, Debug, Formatter};
use std::sync::Arc;

/// The number of records served per page.
pub const PAGE_SIZE: u64 = 10;

/// The message returned after a successful search.
pub const STORED_MESSAGE: &str = "Repos fetched & stored";

/// The body of a search request.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SearchRequest {
    #[serde(default)]
    pub keyword: Option<String>,
}

impl SearchRequest {
    pub fn new<S: Into<String>>(keyword: S) -> SearchRequest {
        SearchRequest {
            keyword: Some(keyword.into()),
        }
    }

    fn keyword(&self) -> Result<&str, RelayError> {
        match self.keyword.as_ref() {
            Some(kw) if !kw.is_empty() => Ok(kw),
            _ => Err(RelayError::Validation(String::from("Keyword required"))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResponse {
    pub message: String,
    pub repos: Vec<RepositoryRecord>,
}

/// The query parameters for reading a page of results.
///
/// The page is kept as raw text so anything which isn't a positive number
/// can fall back to the first page.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct PageQuery {
    #[serde(default)]
    pub page: Option<String>,
}

impl PageQuery {
    pub fn new(page: u64) -> PageQuery {
        PageQuery {
            page: Some(page.to_string()),
        }
    }

    /// The 1-based page number.
    ///
    /// Numbers too big for a `u64` saturate, so they still land past the end
    /// of the results instead of wrapping back to the first page.
    pub fn page(&self) -> u64 {
        self.page
            .as_ref()
            .and_then(|raw| parse_page(raw.trim()))
            .filter(|&page| page > 0)
            .unwrap_or(1)
    }

    pub fn offset(&self) -> u64 {
        (self.page() - 1).saturating_mul(PAGE_SIZE)
    }
}

fn parse_page(raw: &str) -> Option<u64> {
    match raw.parse::<u64>() {
        Ok(page) => Some(page),
        Err(_) if !raw.is_empty() && raw.bytes().all(|b| b.is_ascii_digit()) => Some(u64::MAX),
        Err(_) => None,
    }
}

/// Searches a [`Provider`] and keeps the latest results in a [`Store`].
#[derive(Clone)]
pub struct Relay {
    provider: Arc<dyn Provider>,
    store: Arc<dyn Store>,
}

impl Relay {
    pub fn new(provider: Arc<dyn Provider>, store: Arc<dyn Store>) -> Relay {
        Relay { provider, store }
    }

    /// Search for a keyword and replace everything in the store with the
    /// results.
    ///
    /// The old results are deleted before the new ones are inserted, and the
    /// two steps aren't transactional. If the insert fails the store is left
    /// empty.
    pub async fn search_and_store(
        &self,
        req: &SearchRequest,
    ) -> Result<SearchResponse, RelayError> {
        let keyword = req.keyword()?;

        info!("Searching {} for {:?}", self.provider.name(), keyword);
        let repos = self.provider.search(keyword).await.map_err(|e| {
            warn!("Searching {} failed, {}", self.provider.name(), e);
            RelayError::upstream(&e)
        })?;
        info!("Found {} repos", repos.len());

        self.store
            .delete_all()
            .await
            .map_err(|e| RelayError::storage(&e))?;
        self.store
            .insert_many(&repos)
            .await
            .map_err(|e| RelayError::storage(&e))?;

        Ok(SearchResponse {
            message: String::from(STORED_MESSAGE),
            repos,
        })
    }

    /// Read a single page of the most recent results.
    pub async fn page(&self, query: &PageQuery) -> Result<Vec<RepositoryRecord>, RelayError> {
        let offset = query.offset();
        debug!("Reading page {} (offset {})", query.page(), offset);

        self.store
            .read(offset, PAGE_SIZE)
            .await
            .map_err(|e| RelayError::storage(&e))
    }
}

impl Debug for Relay {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        f.debug_struct("Relay")
            .field("provider", &self.provider.name())
            .finish()
    }
}
