use std::thread;
use std::time::Duration;

use social_clients::mastodon::{Account, Status};
use social_clients::MastodonClient;
use url::Url;

use crate::config::{Config, Platform, Visibility};
use crate::domain::{Attachment, PostText};
use crate::errors::BotResult;
use crate::platforms::traits::{BoostReport, SocialPlatform};

pub struct MastodonPlatform {
    client: MastodonClient,
    account: Account,
    visibility: Visibility,
    ignore_servers: Vec<String>,
    pause: Duration,
    error_pause: Duration,
}

impl MastodonPlatform {
    /// Authenticate with the access token and fetch the bot's own account
    pub fn login(config: &Config) -> BotResult<Self> {
        let token = Config::require(&config.access_token, "ACCESS_TOKEN")?;
        let client = MastodonClient::new(&config.api_base_url, token)?;

        tracing::info!(instance = %config.api_base_url, "Logging in");
        let account = client.verify_credentials()?;
        tracing::info!(acct = %account.acct, "Fetched account data");

        Ok(Self {
            client,
            account,
            visibility: config.visibility,
            ignore_servers: config.ignore_servers.clone(),
            pause: Duration::from_millis(100),
            error_pause: Duration::from_secs(30),
        })
    }

    fn boost(&self, status: &Status, report: &mut BoostReport) {
        tracing::info!(
            author = %status.account.username,
            url = %status.link(),
            "Boosting toot"
        );

        let result = self
            .client
            .reblog(&status.id)
            .and_then(|_| self.client.favourite(&status.id));

        match result {
            Ok(_) => report.boosted += 1,
            Err(e) => {
                tracing::warn!(url = %status.link(), error = %e, "Boosting did not work, going to the next toot");
                report.failed += 1;
            }
        }
    }

    fn post_with_media(&self, text: &str, attachment: &Attachment) -> BotResult<()> {
        let description = attachment.alt.as_deref().or(Some(attachment.card.title.as_str()));
        let media = self.client.media_post(&attachment.image_path, description)?;
        self.client
            .status_post(text, self.visibility.as_str(), &[media.id])?;
        Ok(())
    }
}

/// Lowercase tag without `#` or surrounding blanks
pub fn normalize_tag(tag: &str) -> String {
    tag.trim_matches(|c: char| c == '#' || c.is_whitespace())
        .to_lowercase()
}

/// A status is boosted once, never the bot's own, never from an ignored server
pub fn is_boostable(status: &Status, own_acct: &str, ignore_servers: &[String]) -> bool {
    if status.is_favourited() || status.account.acct == own_acct {
        return false;
    }

    let host = Url::parse(status.link())
        .ok()
        .and_then(|u| u.host_str().map(str::to_string))
        .unwrap_or_default();

    !ignore_servers.iter().any(|server| server == &host)
}

impl SocialPlatform for MastodonPlatform {
    fn platform(&self) -> Platform {
        Platform::Mastodon
    }

    fn resolve_mention(&self, _handle: &str) -> Option<String> {
        None
    }

    fn publish(&self, post: &PostText, attachment: Option<Attachment>) -> BotResult<()> {
        if let Some(attachment) = attachment {
            tracing::info!("Uploading media to Mastodon");
            match self.post_with_media(post.as_str(), &attachment) {
                Ok(()) => {
                    tracing::info!("Posted with image 🎉");
                    return Ok(());
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Media could not be posted, posting without image");
                }
            }
        }

        self.client
            .status_post(post.as_str(), self.visibility.as_str(), &[])?;
        tracing::info!("Posted 🎉");
        Ok(())
    }

    fn boost_mentions(&self) -> BotResult<BoostReport> {
        let notifications = self.client.notifications(&["mention"])?;
        let mut report = BoostReport::default();

        tracing::info!(count = notifications.len(), "Reading mentions to identify boostable toots");
        for notification in notifications {
            let Some(status) = notification.status else {
                report.skipped += 1;
                continue;
            };

            if is_boostable(&status, &self.account.acct, &[]) {
                self.boost(&status, &mut report);
            } else {
                report.skipped += 1;
            }
        }

        Ok(report)
    }

    fn boost_tags(&self, tags: &[String], limit: u32) -> BotResult<BoostReport> {
        let mut report = BoostReport::default();

        for tag in tags {
            let tag = normalize_tag(tag);
            tracing::info!(tag = %tag, "Reading timeline for new toots");

            let statuses = match self.client.timeline_hashtag(&tag, limit) {
                Ok(statuses) => statuses,
                Err(e) => {
                    tracing::error!(tag = %tag, error = %e, "Network error while fetching statuses");
                    thread::sleep(self.error_pause);
                    continue;
                }
            };
            thread::sleep(self.pause);

            for status in statuses {
                if is_boostable(&status, &self.account.acct, &self.ignore_servers) {
                    self.boost(&status, &mut report);
                } else {
                    report.skipped += 1;
                }
            }
        }

        Ok(report)
    }
}
