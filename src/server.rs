//! The HTTP interface.

use crate::errors::RelayError;
use crate::relay::{PageQuery, Relay, SearchRequest, SearchResponse};
use crate::repo::RepositoryRecord;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use failure::{Error, ResultExt};
use serde_json::json;
use std::future::Future;
use std::net::SocketAddr;

const SEARCH_FAILED: &str = "Failed to fetch repos";
const READ_FAILED: &str = "Failed to fetch repos from DB";
const INVALID_BODY: &str = "Invalid request body";

/// Build the router exposing a [`Relay`].
pub fn router(relay: Relay) -> Router {
    Router::new()
        .route("/api/search", post(search))
        .route("/api/repos", get(repos))
        .with_state(relay)
}

/// Serve the API on `addr` until `shutdown` resolves.
pub async fn serve<F>(relay: Relay, addr: SocketAddr, shutdown: F) -> Result<(), Error>
where
    F: Future<Output = ()> + Send + 'static,
{
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|_| format!("Unable to bind to {}", addr))?;
    info!("Listening on {}", addr);

    axum::serve(listener, router(relay))
        .with_graceful_shutdown(shutdown)
        .await
        .context("The server crashed")?;

    info!("Server stopped");
    Ok(())
}

async fn search(
    State(relay): State<Relay>,
    body: Result<Json<SearchRequest>, JsonRejection>,
) -> Result<Json<SearchResponse>, ApiError> {
    let Json(req) = body.map_err(|rejection| {
        debug!("Rejected a search request, {}", rejection);
        let err = RelayError::Validation(String::from(INVALID_BODY));
        ApiError::new(err, SEARCH_FAILED)
    })?;

    relay
        .search_and_store(&req)
        .await
        .map(Json)
        .map_err(|e| ApiError::new(e, SEARCH_FAILED))
}

async fn repos(
    State(relay): State<Relay>,
    query: Result<Query<PageQuery>, QueryRejection>,
) -> Result<Json<Vec<RepositoryRecord>>, ApiError> {
    let query = match query {
        Ok(Query(query)) => query,
        Err(rejection) => {
            debug!("Unusable page query, falling back to the first page ({})", rejection);
            PageQuery::default()
        }
    };

    relay
        .page(&query)
        .await
        .map(Json)
        .map_err(|e| ApiError::new(e, READ_FAILED))
}

/// A [`RelayError`] plus the generic message shown in place of internal
/// details.
#[derive(Debug)]
struct ApiError {
    inner: RelayError,
    generic: &'static str,
}

impl ApiError {
    fn new(inner: RelayError, generic: &'static str) -> ApiError {
        ApiError { inner, generic }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self.inner {
            RelayError::Validation(msg) => (StatusCode::BAD_REQUEST, msg),
            other => {
                error!("{}", other);
                (StatusCode::INTERNAL_SERVER_ERROR, String::from(self.generic))
            }
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}
