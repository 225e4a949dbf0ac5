use chrono::{SecondsFormat, Utc};
use reqwest::blocking::Client;
use reqwest::header::CONTENT_TYPE;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::{check_status, http_client, ClientError, ClientResult};

pub const DEFAULT_SERVICE: &str = "https://bsky.social";

const POST_COLLECTION: &str = "app.bsky.feed.post";
const REPOST_COLLECTION: &str = "app.bsky.feed.repost";

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Session {
    access_jwt: String,
    did: String,
    handle: String,
}

/// Reference to a record by URI and content hash
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrongRef {
    pub uri: String,
    pub cid: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Author {
    pub did: String,
    pub handle: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostView {
    pub uri: String,
    pub cid: String,
    pub author: Author,
    #[serde(default)]
    pub record: Value,
}

impl PostView {
    /// Text of the underlying `app.bsky.feed.post` record
    pub fn text(&self) -> &str {
        self.record
            .get("text")
            .and_then(Value::as_str)
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedViewPost {
    pub post: PostView,
}

#[derive(Debug, Deserialize)]
struct TimelineResponse {
    feed: Vec<FeedViewPost>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub uri: String,
    pub cid: String,
    pub author: Author,
    pub reason: String,
    #[serde(default)]
    pub is_read: bool,
}

#[derive(Debug, Deserialize)]
struct NotificationsResponse {
    notifications: Vec<Notification>,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    posts: Vec<PostView>,
}

#[derive(Debug, Deserialize)]
struct BlobResponse {
    blob: Value,
}

#[derive(Debug, Deserialize)]
struct ResolveHandleResponse {
    did: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ByteSlice {
    pub byte_start: usize,
    pub byte_end: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "$type")]
pub enum FacetFeature {
    #[serde(rename = "app.bsky.richtext.facet#mention")]
    Mention { did: String },
    #[serde(rename = "app.bsky.richtext.facet#link")]
    Link { uri: String },
    #[serde(rename = "app.bsky.richtext.facet#tag")]
    Tag { tag: String },
}

/// Rich-text annotation over a UTF-8 byte range of the post text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Facet {
    pub index: ByteSlice,
    pub features: Vec<FacetFeature>,
}

/// Link card shown under a post (`app.bsky.embed.external`)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct External {
    pub uri: String,
    pub title: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumb: Option<Value>,
}

fn now_iso() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn post_record(text: &str, facets: &[Facet], external: Option<&External>, created_at: &str) -> Value {
    let mut record = json!({
        "$type": POST_COLLECTION,
        "text": text,
        "createdAt": created_at,
    });

    if !facets.is_empty() {
        record["facets"] = json!(facets);
    }

    if let Some(external) = external {
        record["embed"] = json!({
            "$type": "app.bsky.embed.external",
            "external": external,
        });
    }

    record
}

pub struct BlueskyClient {
    service: String,
    client: Client,
    session: Option<Session>,
}

impl BlueskyClient {
    pub fn new(service: &str) -> ClientResult<Self> {
        Ok(Self {
            service: service.trim_end_matches('/').to_string(),
            client: http_client()?,
            session: None,
        })
    }

    /// Create a session with an identifier (handle or email) and app password
    pub fn login(&mut self, identifier: &str, password: &str) -> ClientResult<()> {
        let response = self
            .client
            .post(self.xrpc("com.atproto.server.createSession"))
            .json(&json!({ "identifier": identifier, "password": password }))
            .send()?;

        self.session = Some(check_status(response)?.json()?);
        Ok(())
    }

    pub fn did(&self) -> Option<&str> {
        self.session.as_ref().map(|s| s.did.as_str())
    }

    pub fn handle(&self) -> Option<&str> {
        self.session.as_ref().map(|s| s.handle.as_str())
    }

    fn xrpc(&self, method: &str) -> String {
        format!("{}/xrpc/{}", self.service, method)
    }

    fn session(&self) -> ClientResult<&Session> {
        self.session.as_ref().ok_or(ClientError::NotAuthenticated)
    }

    fn get(&self, method: &str) -> ClientResult<reqwest::blocking::RequestBuilder> {
        let session = self.session()?;
        Ok(self
            .client
            .get(self.xrpc(method))
            .bearer_auth(&session.access_jwt))
    }

    fn post(&self, method: &str) -> ClientResult<reqwest::blocking::RequestBuilder> {
        let session = self.session()?;
        Ok(self
            .client
            .post(self.xrpc(method))
            .bearer_auth(&session.access_jwt))
    }

    pub fn get_timeline(&self, algorithm: &str, limit: u32) -> ClientResult<Vec<FeedViewPost>> {
        let response = self
            .get("app.bsky.feed.getTimeline")?
            .query(&[("algorithm", algorithm)])
            .query(&[("limit", limit)])
            .send()?;

        let timeline: TimelineResponse = check_status(response)?.json()?;
        Ok(timeline.feed)
    }

    pub fn list_notifications(&self, limit: u32) -> ClientResult<Vec<Notification>> {
        let response = self
            .get("app.bsky.notification.listNotifications")?
            .query(&[("limit", limit)])
            .send()?;

        let body: NotificationsResponse = check_status(response)?.json()?;
        Ok(body.notifications)
    }

    /// Mark every notification up to `seen_at` as read
    pub fn update_seen(&self, seen_at: &str) -> ClientResult<()> {
        let response = self
            .post("app.bsky.notification.updateSeen")?
            .json(&json!({ "seenAt": seen_at }))
            .send()?;

        check_status(response)?;
        Ok(())
    }

    pub fn search_posts(&self, query: &str, tag: &str, sort: &str, limit: u32) -> ClientResult<Vec<PostView>> {
        let response = self
            .get("app.bsky.feed.searchPosts")?
            .query(&[("q", query), ("tag", tag), ("sort", sort)])
            .query(&[("limit", limit)])
            .send()?;

        let body: SearchResponse = check_status(response)?.json()?;
        Ok(body.posts)
    }

    fn create_record(&self, collection: &str, record: Value) -> ClientResult<StrongRef> {
        let repo = self.session()?.did.clone();
        let response = self
            .post("com.atproto.repo.createRecord")?
            .json(&json!({
                "repo": repo,
                "collection": collection,
                "record": record,
            }))
            .send()?;

        Ok(check_status(response)?.json()?)
    }

    pub fn repost(&self, uri: &str, cid: &str) -> ClientResult<StrongRef> {
        let record = json!({
            "$type": REPOST_COLLECTION,
            "subject": { "uri": uri, "cid": cid },
            "createdAt": now_iso(),
        });

        self.create_record(REPOST_COLLECTION, record)
    }

    /// Upload raw bytes; the returned blob ref can be used as an embed thumbnail
    pub fn upload_blob(&self, data: Vec<u8>, mime_type: &str) -> ClientResult<Value> {
        let response = self
            .post("com.atproto.repo.uploadBlob")?
            .header(CONTENT_TYPE, mime_type)
            .body(data)
            .send()?;

        let body: BlobResponse = check_status(response)?.json()?;
        Ok(body.blob)
    }

    pub fn send_post(
        &self,
        text: &str,
        facets: &[Facet],
        external: Option<&External>,
    ) -> ClientResult<StrongRef> {
        let record = post_record(text, facets, external, &now_iso());
        self.create_record(POST_COLLECTION, record)
    }

    /// Resolve a handle (with or without leading `@`) to its DID; needs no session
    pub fn resolve_handle(&self, handle: &str) -> ClientResult<String> {
        let response = self
            .client
            .get(self.xrpc("com.atproto.identity.resolveHandle"))
            .query(&[("handle", handle.trim_start_matches('@'))])
            .send()?;

        let body: ResolveHandleResponse = check_status(response)?.json()?;
        Ok(body.did)
    }

    /// Current time in the format the API expects for `seenAt` and `createdAt`
    pub fn current_time_iso(&self) -> String {
        now_iso()
    }
}
