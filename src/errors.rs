//! The errors encountered in this crate.

use failure::{Error, Fail};
use reqwest::StatusCode;

/// Everything that can go wrong while handling a request.
///
/// Internal errors are flattened into a message when they cross the boundary
/// of an operation, so callers only ever see one of these three kinds.
#[derive(Debug, Clone, PartialEq, Eq, Fail)]
pub enum RelayError {
    /// The caller gave us something we can't work with.
    #[fail(display = "{}", _0)]
    Validation(String),
    /// The upstream search failed or returned something unusable.
    #[fail(display = "Upstream search failed: {}", _0)]
    Upstream(String),
    /// Reading from or writing to the store failed.
    #[fail(display = "Storage failed: {}", _0)]
    Storage(String),
}

impl RelayError {
    pub fn upstream(err: &Error) -> RelayError {
        RelayError::Upstream(describe(err))
    }

    pub fn storage(err: &Error) -> RelayError {
        RelayError::Storage(describe(err))
    }
}

/// The upstream server responded with a non-successful status code.
#[derive(Debug, Clone, PartialEq, Fail)]
#[fail(display = "Request to {} failed with {}", url, status)]
pub struct FailedRequest {
    pub status: StatusCode,
    pub url: String,
}

/// Render an error and all of its causes on a single line.
pub fn describe(err: &Error) -> String {
    err.iter_chain()
        .map(|cause| cause.to_string())
        .collect::<Vec<_>>()
        .join(": ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use failure::ResultExt;

    #[test]
    fn causes_are_flattened_into_the_message() {
        let inner: Result<(), Error> = Err(failure::err_msg("connection refused"));
        let err: Error = inner
            .context("Unable to send request")
            .unwrap_err()
            .into();

        let got = RelayError::upstream(&err);

        assert_eq!(
            got,
            RelayError::Upstream(String::from(
                "Unable to send request: connection refused"
            ))
        );
    }
}
