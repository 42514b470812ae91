use serde_derive::{Deserialize, Serialize};

/// A single search result, as it's stored and served back to clients.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryRecord {
    pub name: String,
    pub description: Option<String>,
    pub stars: u64,
    pub url: String,
}

impl RepositoryRecord {
    pub fn new<N, U>(name: N, description: Option<&str>, stars: u64, url: U) -> RepositoryRecord
    where
        N: Into<String>,
        U: Into<String>,
    {
        RepositoryRecord {
            name: name.into(),
            description: description.map(String::from),
            stars,
            url: url.into(),
        }
    }
}
