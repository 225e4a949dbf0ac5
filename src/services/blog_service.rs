use std::thread;
use std::time::Duration;

use chrono::{Local, NaiveDateTime};

use crate::config::BlogConfig;
use crate::domain::{Attachment, FeedDescriptor, LinkCard, PostEntry, PostText};
use crate::errors::BotResult;
use crate::platforms::SocialPlatform;
use crate::services::feed_walker::{FeedWalker, WalkReport};
use crate::services::summarizer::Summarizer;
use crate::sources::{ImageCache, ImageLayout, RssFetcher};
use crate::storage::{JsonArchiveStore, MetadataFile, TextCursorStore};

const OLD_POST_DAYS: i64 = 730;
const OLD_POST_TAG: &str = "oldiebutgoodie";

/// Entry categories already covered by the base tags
const COMMUNITY_TAGS: [&str; 4] = ["pyladies", "python", "rstats", "rladies"];

/// Who wrote the post, as shown after the title
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Author {
    pub name: String,
    pub handle: Option<String>,
    /// Resolved DID; when set the handle becomes a mention facet
    pub did: Option<String>,
}

pub struct BlogService<'a> {
    platform: &'a dyn SocialPlatform,
    config: &'a BlogConfig,
    summarizer: Option<Box<dyn Summarizer + 'a>>,
    images: ImageCache,
    pause: Duration,
    dry_run: bool,
}

impl<'a> BlogService<'a> {
    pub fn new(platform: &'a dyn SocialPlatform, config: &'a BlogConfig, dry_run: bool) -> Self {
        Self {
            platform,
            config,
            summarizer: None,
            images: ImageCache::new(&config.images_dir, ImageLayout::ByHost),
            pause: Duration::from_secs(1),
            dry_run,
        }
    }

    pub fn with_summarizer(mut self, summarizer: Box<dyn Summarizer + 'a>) -> Self {
        self.summarizer = Some(summarizer);
        self
    }

    /// Promote up to two new blog posts, resuming where the previous run stopped
    pub fn promote(&self) -> BotResult<WalkReport> {
        tracing::info!(
            platform = %self.platform.platform(),
            metadata = %self.config.metadata_path.display(),
            "Promoting blog posts"
        );

        let feeds = MetadataFile::new(&self.config.metadata_path).load_feeds(&self.config.archive_dir)?;

        let walker = FeedWalker::new(
            RssFetcher::new(self.config.process_images),
            JsonArchiveStore::new(),
            TextCursorStore::new(&self.config.counter_path),
        )
        .dry_run(self.dry_run);

        walker.run(&feeds, |feed, entry| {
            let result = self.publish_entry(feed, entry);
            if !self.dry_run {
                thread::sleep(self.pause);
            }
            result
        })
    }

    fn publish_entry(&self, feed: &FeedDescriptor, entry: &PostEntry) -> BotResult<()> {
        tracing::info!(feed = %feed.name, title = %entry.title, link = %entry.link, "Preparing post");

        let handle = feed
            .handle_for(self.platform.platform())
            .map(check_platform_handle)
            .filter(|h| !h.is_empty());
        let did = handle
            .as_deref()
            .and_then(|h| self.platform.resolve_mention(h));
        let author = Author {
            name: feed.name.clone(),
            handle,
            did,
        };

        let summary = self.summary(entry);
        let tags = define_tags(&self.config.base_tags, entry, Local::now().naive_local());
        let post = compose_post(entry, &author, summary.as_deref(), &tags);
        tracing::info!("\n{}", post);

        let attachment = self.attachment(entry);
        self.platform.publish(&post, attachment)
    }

    fn summary(&self, entry: &PostEntry) -> Option<String> {
        let summarizer = self.summarizer.as_ref()?;
        match summarizer.summarize(&entry.title, &entry.summary) {
            Ok(summary) => summary,
            Err(e) => {
                tracing::warn!(link = %entry.link, error = %e, "No summary for this post");
                None
            }
        }
    }

    fn attachment(&self, entry: &PostEntry) -> Option<Attachment> {
        let media = entry.media.as_ref()?;
        if self.dry_run {
            tracing::info!(url = %media.url, "[dry run] Image would be attached");
            return None;
        }

        match self.images.fetch(&media.url) {
            Ok(image_path) => Some(Attachment {
                image_path,
                alt: media.alt.clone(),
                card: LinkCard {
                    uri: entry.link.clone(),
                    title: entry.title.clone(),
                    description: entry.title.clone(),
                },
            }),
            Err(e) => {
                tracing::warn!(url = %media.url, error = %e, "Image could not be downloaded, posting without it");
                None
            }
        }
    }
}

/// Prefix a handle with `@` unless it already has one
pub fn check_platform_handle(handle: &str) -> String {
    let handle = handle.trim();
    if handle.chars().count() > 1 && !handle.starts_with('@') {
        format!("@{}", handle)
    } else {
        handle.to_string()
    }
}

/// Base tags, an age marker for old posts, then the entry's own categories
pub fn define_tags(base_tags: &[String], entry: &PostEntry, now: NaiveDateTime) -> Vec<String> {
    let mut tags: Vec<String> = base_tags.to_vec();

    if (now - entry.published_at(now)).num_days() > OLD_POST_DAYS {
        tags.push(OLD_POST_TAG.to_string());
    }

    for tag in &entry.tags {
        if COMMUNITY_TAGS.contains(&tag.to_lowercase().as_str()) {
            continue;
        }
        let clean = tag.replace([' ', '-'], "").to_lowercase();
        if !clean.is_empty() && !tags.contains(&clean) {
            tags.push(clean);
        }
    }

    tags
}

pub fn compose_post(entry: &PostEntry, author: &Author, summary: Option<&str>, tags: &[String]) -> PostText {
    let mut post = PostText::new();
    post.text(&format!("📝 \"{}\"\n\n👤 {}", entry.title, author.name));

    if let Some(handle) = &author.handle {
        post.text(" (");
        match &author.did {
            Some(did) => post.mention(handle, did),
            None => post.text(handle),
        };
        post.text(")");
    }

    if let Some(summary) = summary {
        post.text("\n\n📖 ").text(summary);
    }

    post.text("\n\n🔗 ").link(&entry.link, &entry.link);

    if !tags.is_empty() {
        post.text("\n\n");
        for (i, tag) in tags.iter().enumerate() {
            if i > 0 {
                post.text(" ");
            }
            post.tag(&format!("#{}", tag), tag);
        }
    }

    post
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Platform;
    use crate::domain::{FacetKind, Media};
    use crate::errors::BotError;
    use crate::platforms::traits::MockSocialPlatform;
    use crate::services::summarizer::MockSummarizer;
    use crate::storage::traits::ArchiveStore;
    use chrono::NaiveDate;
    use mockall::predicate::eq;
    use std::fs;
    use std::io::{Read, Write};
    use std::net::TcpListener;
    use tempfile::TempDir;

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 6, 1)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
    }

    fn entry() -> PostEntry {
        PostEntry::new("Tidy data".to_string(), "https://jane.dev/tidy".to_string())
            .with_published(Some("2025-05-30T10:00:00Z".to_string()))
    }

    fn base() -> Vec<String> {
        vec!["rladies".to_string(), "rstats".to_string()]
    }

    #[test]
    fn test_check_platform_handle() {
        assert_eq!(check_platform_handle("jane.bsky.social"), "@jane.bsky.social");
        assert_eq!(check_platform_handle("@jane@fosstodon.org"), "@jane@fosstodon.org");
        assert_eq!(check_platform_handle("x"), "x");
        assert_eq!(check_platform_handle(""), "");
    }

    #[test]
    fn test_define_tags_recent_post() {
        let entry = entry().with_tags(vec!["R Stats".to_string(), "rstats".to_string(), "data-viz".to_string()]);
        let tags = define_tags(&base(), &entry, now());
        assert_eq!(tags, vec!["rladies", "rstats", "dataviz"]);
    }

    #[test]
    fn test_define_tags_old_post() {
        let entry = entry().with_published(Some("Mon, 01 Jan 2018 00:00:00 +0000".to_string()));
        let tags = define_tags(&[], &entry, now());
        assert_eq!(tags, vec!["oldiebutgoodie"]);
    }

    #[test]
    fn test_compose_post_mastodon_style() {
        let author = Author {
            name: "Jane Doe".to_string(),
            handle: Some("@jane@fosstodon.org".to_string()),
            did: None,
        };
        let post = compose_post(&entry(), &author, None, &base());

        assert_eq!(
            post.as_str(),
            "📝 \"Tidy data\"\n\n👤 Jane Doe (@jane@fosstodon.org)\n\n🔗 https://jane.dev/tidy\n\n#rladies #rstats"
        );
    }

    #[test]
    fn test_compose_post_with_mention_and_summary() {
        let author = Author {
            name: "Jane Doe".to_string(),
            handle: Some("@jane.bsky.social".to_string()),
            did: Some("did:plc:jane".to_string()),
        };
        let post = compose_post(&entry(), &author, Some("Tables made tidy"), &base());
        let text = post.as_str();

        assert!(text.contains("\n\n📖 Tables made tidy\n\n🔗 "));

        let facets = post.facets();
        assert_eq!(facets.len(), 4);
        assert_eq!(&text[facets[0].start..facets[0].end], "@jane.bsky.social");
        assert_eq!(facets[0].kind, FacetKind::Mention { did: "did:plc:jane".to_string() });
        assert_eq!(facets[1].kind, FacetKind::Link { uri: "https://jane.dev/tidy".to_string() });
        assert_eq!(&text[facets[3].start..facets[3].end], "#rstats");
    }

    #[test]
    fn test_compose_post_without_handle_or_tags() {
        let author = Author {
            name: "Jane Doe".to_string(),
            handle: None,
            did: None,
        };
        let post = compose_post(&entry(), &author, None, &[]);
        assert!(post.as_str().ends_with("🔗 https://jane.dev/tidy"));
        assert!(!post.as_str().contains('('));
    }

    const FEED_XML: &str = r#"<?xml version="1.0"?>
<rss version="2.0"><channel>
<title>Jane Doe</title><link>https://jane.dev</link><description>Blog</description>
<item><title>Tidy data</title><link>https://jane.dev/tidy</link><description>Tables, made tidy.</description></item>
</channel></rss>"#;

    fn blog_config(dir: &TempDir) -> BlogConfig {
        BlogConfig {
            archive_dir: dir.path().join("archive"),
            counter_path: dir.path().join("counter.txt"),
            metadata_path: dir.path().join("meta_data.json"),
            images_dir: dir.path().join("images"),
            base_tags: base(),
            process_images: false,
            gen_ai: None,
        }
    }

    fn jane() -> FeedDescriptor {
        FeedDescriptor::new("Jane Doe", vec!["https://jane.dev/index.xml".to_string()])
            .with_handles(None, Some("jane.bsky.social".to_string()))
    }

    /// Serve `body` once over HTTP on a local port and return its URL
    fn serve_once(body: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let url = format!("http://{}/index.xml", listener.local_addr().unwrap());

        std::thread::spawn(move || {
            if let Ok((mut stream, _)) = listener.accept() {
                let mut request = [0u8; 4096];
                let _ = stream.read(&mut request);
                let response = format!(
                    "HTTP/1.1 200 OK\r\nContent-Type: application/rss+xml\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    body.len(),
                    body
                );
                let _ = stream.write_all(response.as_bytes());
            }
        });

        url
    }

    #[test]
    fn test_publish_entry_mentions_author_and_skips_failed_summary() {
        let dir = TempDir::new().unwrap();
        let config = blog_config(&dir);

        let mut platform = MockSocialPlatform::new();
        platform.expect_platform().return_const(Platform::Bluesky);
        platform
            .expect_resolve_mention()
            .with(eq("@jane.bsky.social"))
            .times(1)
            .returning(|_| Some("did:plc:jane".to_string()));
        platform
            .expect_publish()
            .withf(|post, attachment| {
                let text = post.as_str();
                let mention = &post.facets()[0];
                text.starts_with("📝 \"Tidy data\"\n\n👤 Jane Doe (@jane.bsky.social)")
                    && !text.contains("📖")
                    && mention.kind == FacetKind::Mention { did: "did:plc:jane".to_string() }
                    && attachment.is_none()
            })
            .times(1)
            .returning(|_, _| Ok(()));

        let mut summarizer = MockSummarizer::new();
        summarizer
            .expect_summarize()
            .times(1)
            .returning(|_, _| Err(BotError::Summary("HTTP 503".to_string())));

        // Dry run keeps the image out of the post without touching the network
        let service = BlogService::new(&platform, &config, true).with_summarizer(Box::new(summarizer));
        let entry = entry().with_media(Some(Media {
            url: "http://img.youtube.com/vi/abc/hqdefault.jpg".to_string(),
            alt: None,
        }));

        service.publish_entry(&jane(), &entry).unwrap();
        assert!(!config.images_dir.exists());
    }

    #[test]
    fn test_publish_entry_without_handle_never_resolves() {
        let dir = TempDir::new().unwrap();
        let config = blog_config(&dir);

        let mut platform = MockSocialPlatform::new();
        platform.expect_platform().return_const(Platform::Mastodon);
        platform.expect_resolve_mention().never();
        platform
            .expect_publish()
            .withf(|post, _| post.as_str().contains("👤 Jane Doe\n\n🔗 https://jane.dev/tidy"))
            .times(1)
            .returning(|_, _| Ok(()));

        let service = BlogService::new(&platform, &config, false);
        service.publish_entry(&jane(), &entry()).unwrap();
    }

    #[test]
    fn test_promote_posts_new_entry_and_records_it() {
        let dir = TempDir::new().unwrap();
        let config = blog_config(&dir);
        let feed_url = serve_once(FEED_XML);
        fs::write(
            &config.metadata_path,
            format!(
                r#"[{{"name": "Jane Doe", "rss_feed": ["{}"], "mastodon": "", "bluesky": "jane.bsky.social"}}]"#,
                feed_url
            ),
        )
        .unwrap();

        let mut platform = MockSocialPlatform::new();
        platform.expect_platform().return_const(Platform::Bluesky);
        platform
            .expect_resolve_mention()
            .returning(|_| Some("did:plc:jane".to_string()));
        platform
            .expect_publish()
            .withf(|post, _| {
                post.as_str().contains("📖 Tables made tidy\n\n🔗 https://jane.dev/tidy")
                    && post.as_str().ends_with("#rladies #rstats")
            })
            .times(1)
            .returning(|_, _| Ok(()));

        let mut summarizer = MockSummarizer::new();
        summarizer
            .expect_summarize()
            .withf(|title, _| title == "Tidy data")
            .returning(|_, _| Ok(Some("Tables made tidy".to_string())));

        let mut service = BlogService::new(&platform, &config, false).with_summarizer(Box::new(summarizer));
        service.pause = Duration::ZERO;

        let report = service.promote().unwrap();
        assert_eq!(report.posted, 1);
        assert_eq!(report.next_cursor.as_deref(), Some("Jane Doe"));
        assert_eq!(fs::read_to_string(&config.counter_path).unwrap(), "Jane Doe");

        let feed = FeedDescriptor::new("Jane Doe", vec![feed_url]).with_archive_root(&config.archive_dir);
        let archive = JsonArchiveStore::new().load(&feed).unwrap();
        assert!(archive.contains("https://jane.dev/tidy"));
    }
}
