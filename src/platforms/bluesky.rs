use std::collections::HashSet;
use std::fs;
use std::thread;
use std::time::Duration;

use social_clients::bluesky::{ByteSlice, External, Facet, FacetFeature, Notification, PostView};
use social_clients::BlueskyClient;

use crate::config::{Config, Platform};
use crate::domain::{Attachment, FacetKind, PostText};
use crate::errors::BotResult;
use crate::platforms::traits::{BoostReport, SocialPlatform};
use crate::sources::images::mime_type;

const FETCH_LIMIT: u32 = 50;
const TIMELINE_ALGORITHM: &str = "reverse-chronological";

pub struct BlueskyPlatform {
    client: BlueskyClient,
    pause: Duration,
}

impl BlueskyPlatform {
    pub fn login(config: &Config) -> BotResult<Self> {
        let username = Config::require(&config.username, "USERNAME")?;
        let password = Config::require(&config.password, "PASSWORD")?;

        let mut client = BlueskyClient::new(&config.api_base_url)?;
        tracing::info!(service = %config.api_base_url, username, "Logging in");
        client.login(username, password)?;
        tracing::info!(
            handle = client.handle().unwrap_or(username),
            did = client.did().unwrap_or_default(),
            "Logged in"
        );

        Ok(Self {
            client,
            pause: Duration::from_millis(100),
        })
    }

    /// CIDs already on our own timeline, reposted or written by us
    fn timeline_cids(&self) -> BotResult<HashSet<String>> {
        Ok(self
            .client
            .get_timeline(TIMELINE_ALGORITHM, FETCH_LIMIT)?
            .into_iter()
            .map(|item| item.post.cid)
            .collect())
    }

    fn repost(&self, uri: &str, cid: &str, report: &mut BoostReport) {
        match self.client.repost(uri, cid) {
            Ok(_) => {
                tracing::info!(uri, "Reposted");
                report.boosted += 1;
            }
            Err(e) => {
                tracing::warn!(uri, error = %e, "Repost failed");
                report.failed += 1;
            }
        }
    }

    /// External embed for the card; the thumbnail is dropped when the upload fails
    fn external(&self, attachment: &Attachment) -> External {
        let thumb = fs::read(&attachment.image_path)
            .map_err(|e| e.to_string())
            .and_then(|bytes| {
                self.client
                    .upload_blob(bytes, mime_type(&attachment.image_path))
                    .map_err(|e| e.to_string())
            });

        let thumb = match thumb {
            Ok(blob) => Some(blob),
            Err(e) => {
                tracing::warn!(path = %attachment.image_path.display(), error = %e, "Thumbnail upload failed, posting card without image");
                None
            }
        };

        External {
            uri: attachment.card.uri.clone(),
            title: attachment.card.title.clone(),
            description: attachment.card.description.clone(),
            thumb,
        }
    }
}

pub fn to_facets(post: &PostText) -> Vec<Facet> {
    post.facets()
        .iter()
        .map(|facet| Facet {
            index: ByteSlice {
                byte_start: facet.start,
                byte_end: facet.end,
            },
            features: vec![match &facet.kind {
                FacetKind::Mention { did } => FacetFeature::Mention { did: did.clone() },
                FacetKind::Link { uri } => FacetFeature::Link { uri: uri.clone() },
                FacetKind::Tag { tag } => FacetFeature::Tag { tag: tag.clone() },
            }],
        })
        .collect()
}

/// Mentions whose post is not on our timeline yet
pub fn mentions_to_repost<'a>(
    notifications: &'a [Notification],
    seen: &HashSet<String>,
) -> Vec<&'a Notification> {
    notifications
        .iter()
        .filter(|n| n.reason == "mention")
        .filter(|n| !seen.contains(&n.cid))
        .collect()
}

/// Lowercased hashtags in a post, without `#` or trailing punctuation
pub fn hashtags(text: &str) -> HashSet<String> {
    text.split_whitespace()
        .filter(|word| word.starts_with('#'))
        .map(|word| {
            word.trim_start_matches('#')
                .trim_end_matches(|c: char| !c.is_alphanumeric() && c != '_')
                .to_lowercase()
        })
        .filter(|tag| !tag.is_empty())
        .collect()
}

pub fn carries_tag(post: &PostView, tag: &str) -> bool {
    hashtags(post.text()).contains(&tag.trim_start_matches('#').to_lowercase())
}

impl SocialPlatform for BlueskyPlatform {
    fn platform(&self) -> Platform {
        Platform::Bluesky
    }

    fn resolve_mention(&self, handle: &str) -> Option<String> {
        match self.client.resolve_handle(handle) {
            Ok(did) => Some(did),
            Err(e) => {
                tracing::warn!(handle, error = %e, "Handle could not be resolved, posting without mention");
                None
            }
        }
    }

    fn publish(&self, post: &PostText, attachment: Option<Attachment>) -> BotResult<()> {
        let facets = to_facets(post);
        let external = attachment.map(|a| self.external(&a));

        let posted = self.client.send_post(post.as_str(), &facets, external.as_ref())?;
        tracing::info!(uri = %posted.uri, "Posted 🎉");
        Ok(())
    }

    fn boost_mentions(&self) -> BotResult<BoostReport> {
        let seen_at = self.client.current_time_iso();
        let notifications = self.client.list_notifications(FETCH_LIMIT)?;
        let seen = self.timeline_cids()?;

        let mentions = mentions_to_repost(&notifications, &seen);
        let mut report = BoostReport {
            skipped: notifications.len() - mentions.len(),
            ..BoostReport::default()
        };

        tracing::info!(count = mentions.len(), "Reposting mentions");
        for mention in mentions {
            self.repost(&mention.uri, &mention.cid, &mut report);
        }

        self.client.update_seen(&seen_at)?;
        Ok(report)
    }

    /// Search always reads a single page of 50 posts per tag
    fn boost_tags(&self, tags: &[String], _limit: u32) -> BotResult<BoostReport> {
        let mut seen = self.timeline_cids()?;
        let mut report = BoostReport::default();

        for tag in tags {
            let tag = tag.trim_start_matches('#').to_lowercase();
            tracing::info!(tag = %tag, "Searching posts");

            let posts = match self.client.search_posts(&tag, &tag, "top", FETCH_LIMIT) {
                Ok(posts) => posts,
                Err(e) => {
                    tracing::warn!(tag = %tag, error = %e, "Search failed, going to the next tag");
                    continue;
                }
            };

            for post in posts {
                if !carries_tag(&post, &tag) || seen.contains(&post.cid) {
                    report.skipped += 1;
                    continue;
                }
                self.repost(&post.uri, &post.cid, &mut report);
                seen.insert(post.cid);
                thread::sleep(self.pause);
            }
        }

        Ok(report)
    }
}
