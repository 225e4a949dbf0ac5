use chrono::NaiveDate;
use regex::Regex;

use crate::config::{AnniversaryConfig, Platform};
use crate::domain::{AnniversaryEvent, Attachment, LinkCard, PostText};
use crate::errors::BotResult;
use crate::platforms::SocialPlatform;
use crate::sources::{ImageCache, ImageLayout};
use crate::storage::files::load_events;

pub const ANNIVERSARY_TAGS: [&str; 3] = ["amazingwomenintech", "womenalsoknow", "impactthefuture"];

pub const MASTODON_MAX_CHARS: usize = 500;
pub const BLUESKY_MAX_CHARS: usize = 300;

/// An event whose post would be rejected for its length
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LengthIssue {
    pub name: String,
    pub platform: Platform,
    pub length: usize,
    pub limit: usize,
}

impl std::fmt::Display for LengthIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} post for '{}' has {} characters (limit {})",
            self.platform, self.name, self.length, self.limit
        )
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AnniversaryReport {
    pub posted: usize,
    pub failed: usize,
}

pub struct AnniversaryService<'a> {
    platform: &'a dyn SocialPlatform,
    config: &'a AnniversaryConfig,
    images: ImageCache,
    dry_run: bool,
}

impl<'a> AnniversaryService<'a> {
    pub fn new(platform: &'a dyn SocialPlatform, config: &'a AnniversaryConfig, dry_run: bool) -> Self {
        Self {
            platform,
            config,
            images: ImageCache::new(&config.images_dir, ImageLayout::Flat),
            dry_run,
        }
    }

    /// Post every event celebrated on `today`
    pub fn promote(&self, today: NaiveDate) -> BotResult<AnniversaryReport> {
        let events = load_events(&self.config.events_path)?;
        let todays: Vec<&AnniversaryEvent> = events.iter().filter(|e| e.matches_day(today)).collect();

        tracing::info!(
            day = %today.format("%m-%d"),
            events = events.len(),
            matching = todays.len(),
            "Checking anniversaries"
        );

        let mut report = AnniversaryReport::default();
        for event in todays {
            match self.publish_event(event) {
                Ok(()) => report.posted += 1,
                Err(e) => {
                    tracing::error!(name = %event.name, error = %e, "Anniversary post failed");
                    report.failed += 1;
                }
            }
        }

        Ok(report)
    }

    fn publish_event(&self, event: &AnniversaryEvent) -> BotResult<()> {
        tracing::info!(name = %event.name, platform = %self.platform.platform(), "Preparing anniversary post");

        let post = match self.platform.platform() {
            Platform::Mastodon => mastodon_text(event),
            Platform::Bluesky => {
                let did = event
                    .bluesky_handle()
                    .and_then(|handle| self.platform.resolve_mention(handle));
                bluesky_text(event, did.as_deref())
            }
        };
        tracing::info!("Preview your post...\n\n{}", post);

        let attachment = self.attachment(event);
        self.platform.publish(&post, attachment)
    }

    fn attachment(&self, event: &AnniversaryEvent) -> Option<Attachment> {
        let img = event.img.as_deref().filter(|i| !i.trim().is_empty())?;
        let url = image_url(&self.config.image_base_url, img);

        if self.dry_run {
            tracing::info!(url = %url, "[dry run] Image would be attached");
            return None;
        }

        match self.images.fetch(&url) {
            Ok(image_path) => Some(Attachment {
                image_path,
                alt: Some(event.alt_text().to_string()),
                card: LinkCard {
                    uri: url,
                    title: format!("Image of {}", event.name),
                    description: event.alt_text().to_string(),
                },
            }),
            Err(e) => {
                tracing::warn!(url = %url, error = %e, "Image could not be downloaded, posting without it");
                None
            }
        }
    }
}

pub fn image_url(base_url: &str, img: &str) -> String {
    format!("{}/{}", base_url.trim_end_matches('/'), img.trim_start_matches('/'))
}

pub fn mastodon_text(event: &AnniversaryEvent) -> PostText {
    let tags: Vec<String> = ANNIVERSARY_TAGS.iter().map(|t| format!("#{}", t)).collect();

    let mut post = PostText::new();
    post.text(&format!(
        "Let's meet {} ✨\n\n{}\n\n🔗 {}\n\n{}",
        event.name,
        event.description_mastodon,
        event.wiki_link,
        tags.join(" ")
    ));
    post
}

/// Bluesky post; `did` turns the person's handle into a mention
pub fn bluesky_text(event: &AnniversaryEvent, did: Option<&str>) -> PostText {
    let mut post = PostText::new();
    post.text("Let's meet ");
    match (event.bluesky_handle(), did) {
        (Some(handle), Some(did)) => post.mention(handle, did),
        _ => post.text(&event.name),
    };
    post.text(" ⭐️\n\n");

    append_with_hashtags(&mut post, event.description_bluesky.trim());

    post.text("\n\n🔗 ").link(&event.wiki_link, &event.wiki_link);
    post.text("\n\n");
    for (i, tag) in ANNIVERSARY_TAGS.iter().enumerate() {
        if i > 0 {
            post.text(" ");
        }
        post.tag(&format!("#{}", tag), tag);
    }

    post
}

/// Append `text`, turning every inline `#word` into a tag facet
fn append_with_hashtags(post: &mut PostText, text: &str) {
    let Ok(hashtag) = Regex::new(r"#\w+") else {
        post.text(text);
        return;
    };

    let mut last = 0;
    for found in hashtag.find_iter(text) {
        post.text(&text[last..found.start()]);
        post.tag(found.as_str(), &found.as_str()[1..]);
        last = found.end();
    }
    post.text(&text[last..]);
}

/// Every event whose post exceeds a platform's character limit
pub fn check_events(events: &[AnniversaryEvent]) -> Vec<LengthIssue> {
    let mut issues = Vec::new();

    for event in events {
        let mastodon = mastodon_text(event).char_count();
        if mastodon > MASTODON_MAX_CHARS {
            issues.push(LengthIssue {
                name: event.name.clone(),
                platform: Platform::Mastodon,
                length: mastodon,
                limit: MASTODON_MAX_CHARS,
            });
        }

        // Measure with the handle shown, as it is when the DID resolves
        let bluesky = bluesky_text(event, event.bluesky_handle().map(|_| "")).char_count();
        if bluesky > BLUESKY_MAX_CHARS {
            issues.push(LengthIssue {
                name: event.name.clone(),
                platform: Platform::Bluesky,
                length: bluesky,
                limit: BLUESKY_MAX_CHARS,
            });
        }
    }

    issues
}
