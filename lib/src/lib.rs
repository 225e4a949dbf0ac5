//! Blocking bindings for the Mastodon REST API and the Bluesky XRPC API
//! Provides just the calls the community bots need: reading mentions and
//! timelines, boosting, uploading media and publishing posts

pub mod bluesky;
pub mod mastodon;

use reqwest::blocking::Response;
use thiserror::Error;

pub use bluesky::BlueskyClient;
pub use mastodon::MastodonClient;

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),
    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },
    #[error("Invalid header value")]
    InvalidHeader,
    #[error("Not logged in")]
    NotAuthenticated,
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type ClientResult<T> = Result<T, ClientError>;

/// Turn a non-success response into `ClientError::Api`, keeping the body as message
pub(crate) fn check_status(response: Response) -> ClientResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let message = response.text().unwrap_or_default();
    Err(ClientError::Api {
        status: status.as_u16(),
        message,
    })
}

pub(crate) fn http_client() -> ClientResult<reqwest::blocking::Client> {
    Ok(reqwest::blocking::Client::builder()
        .timeout(std::time::Duration::from_secs(30))
        .build()?)
}
