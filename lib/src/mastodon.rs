use std::path::Path;

use reqwest::blocking::multipart::Form;
use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde::{Deserialize, Serialize};

use crate::{check_status, ClientError, ClientResult};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Account {
    pub id: String,
    pub username: String,
    pub acct: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Status {
    pub id: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub uri: String,
    #[serde(default)]
    pub favourited: Option<bool>,
    #[serde(default)]
    pub reblogged: Option<bool>,
    pub account: Account,
}

impl Status {
    /// Public URL of the status, falling back to its ActivityPub URI
    pub fn link(&self) -> &str {
        self.url.as_deref().unwrap_or(&self.uri)
    }

    pub fn is_favourited(&self) -> bool {
        self.favourited.unwrap_or(false)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub account: Account,
    #[serde(default)]
    pub status: Option<Status>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaAttachment {
    pub id: String,
    #[serde(default)]
    pub url: Option<String>,
}

#[derive(Debug, Serialize)]
struct NewStatus<'a> {
    status: &'a str,
    visibility: &'a str,
    #[serde(skip_serializing_if = "no_media")]
    media_ids: &'a [String],
}

fn no_media(ids: &&[String]) -> bool {
    ids.is_empty()
}

pub struct MastodonClient {
    url: String,
    client: Client,
}

impl MastodonClient {
    pub fn new(url: &str, access_token: &str) -> ClientResult<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", access_token))
                .map_err(|_| ClientError::InvalidHeader)?,
        );

        let client = Client::builder()
            .default_headers(headers)
            .timeout(std::time::Duration::from_secs(30))
            .build()?;

        Ok(Self {
            url: url.trim_end_matches('/').to_string(),
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.url
    }

    /// Fetch the account the access token belongs to
    pub fn verify_credentials(&self) -> ClientResult<Account> {
        let response = self
            .client
            .get(format!("{}/api/v1/accounts/verify_credentials", self.url))
            .send()?;

        Ok(check_status(response)?.json()?)
    }

    /// List notifications, restricted to the given types (e.g. `mention`)
    pub fn notifications(&self, types: &[&str]) -> ClientResult<Vec<Notification>> {
        let query: Vec<(&str, &str)> = types.iter().map(|t| ("types[]", *t)).collect();

        let response = self
            .client
            .get(format!("{}/api/v1/notifications", self.url))
            .query(&query)
            .send()?;

        Ok(check_status(response)?.json()?)
    }

    /// Read the public timeline for a hashtag (without the leading `#`)
    pub fn timeline_hashtag(&self, tag: &str, limit: u32) -> ClientResult<Vec<Status>> {
        let response = self
            .client
            .get(format!("{}/api/v1/timelines/tag/{}", self.url, tag))
            .query(&[("limit", limit)])
            .send()?;

        Ok(check_status(response)?.json()?)
    }

    pub fn reblog(&self, status_id: &str) -> ClientResult<Status> {
        let response = self
            .client
            .post(format!("{}/api/v1/statuses/{}/reblog", self.url, status_id))
            .send()?;

        Ok(check_status(response)?.json()?)
    }

    pub fn favourite(&self, status_id: &str) -> ClientResult<Status> {
        let response = self
            .client
            .post(format!("{}/api/v1/statuses/{}/favourite", self.url, status_id))
            .send()?;

        Ok(check_status(response)?.json()?)
    }

    /// Upload an image file with an optional alt-text description
    pub fn media_post(&self, path: &Path, description: Option<&str>) -> ClientResult<MediaAttachment> {
        let mut form = Form::new().file("file", path)?;
        if let Some(description) = description {
            form = form.text("description", description.to_string());
        }

        let response = self
            .client
            .post(format!("{}/api/v2/media", self.url))
            .multipart(form)
            .send()?;

        Ok(check_status(response)?.json()?)
    }

    /// Publish a status, optionally with previously uploaded media
    pub fn status_post(
        &self,
        text: &str,
        visibility: &str,
        media_ids: &[String],
    ) -> ClientResult<Status> {
        let payload = NewStatus {
            status: text,
            visibility,
            media_ids,
        };

        let response = self
            .client
            .post(format!("{}/api/v1/statuses", self.url))
            .json(&payload)
            .send()?;

        Ok(check_status(response)?.json()?)
    }
}
