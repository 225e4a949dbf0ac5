use feed_rs::model::Entry;
use feed_rs::parser;
use reqwest::blocking::Client;
use scraper::{Html, Selector};

use crate::domain::{FeedDescriptor, Media, PostEntry};
use crate::errors::FetchError;
use crate::sources::traits::FeedFetcher;

const YOUTUBE_HOST: &str = "www.youtube.com";

pub struct RssFetcher {
    client: Client,
    process_images: bool,
}

impl RssFetcher {
    pub fn new(process_images: bool) -> Self {
        Self {
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(30))
                .build()
                .unwrap_or_else(|_| Client::new()),
            process_images,
        }
    }

    fn fetch_url(&self, url: &str) -> Result<Vec<PostEntry>, FetchError> {
        let response = self.client.get(url).send().map_err(|source| FetchError::Http {
            url: url.to_string(),
            source,
        })?;

        if !response.status().is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: response.status().as_u16(),
            });
        }

        let bytes = response.bytes().map_err(|source| FetchError::Http {
            url: url.to_string(),
            source,
        })?;

        entries_from_bytes(url, &bytes, self.process_images)
    }
}

impl FeedFetcher for RssFetcher {
    fn fetch(&self, feed: &FeedDescriptor) -> Result<Vec<PostEntry>, FetchError> {
        let mut entries = Vec::new();
        let mut last_error = None;
        let mut any_ok = false;

        for url in &feed.rss_feed {
            match self.fetch_url(url) {
                Ok(mut found) => {
                    any_ok = true;
                    entries.append(&mut found);
                }
                Err(e) => {
                    tracing::warn!(feed = %feed.name, error = %e, "Feed URL not available");
                    last_error = Some(e);
                }
            }
        }

        match (any_ok, last_error) {
            (true, _) => Ok(entries),
            (false, Some(e)) => Err(e),
            (false, None) => Err(FetchError::NoSources(feed.name.clone())),
        }
    }
}

/// Parse raw feed bytes into post entries; entries without a link are dropped
pub fn entries_from_bytes(
    url: &str,
    bytes: &[u8],
    process_images: bool,
) -> Result<Vec<PostEntry>, FetchError> {
    let parsed = parser::parse(bytes).map_err(|e| FetchError::Parse {
        url: url.to_string(),
        reason: e.to_string(),
    })?;

    Ok(parsed
        .entries
        .into_iter()
        .filter_map(|entry| to_post_entry(entry, process_images))
        .collect())
}

fn to_post_entry(entry: Entry, process_images: bool) -> Option<PostEntry> {
    let link = entry.links.first()?.href.clone();

    let title = entry
        .title
        .as_ref()
        .map(|t| t.content.trim().to_string())
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| "Untitled".to_string());

    let published = entry.published.or(entry.updated).map(|dt| dt.to_rfc3339());

    let tags: Vec<String> = entry
        .categories
        .iter()
        .map(|c| c.term.trim().to_string())
        .filter(|t| !t.is_empty())
        .collect();

    let summary = entry
        .summary
        .as_ref()
        .map(|s| s.content.clone())
        .or_else(|| entry.content.as_ref().and_then(|c| c.body.clone()))
        .unwrap_or_default();

    let media = if process_images {
        extract_media(&entry, &link, &summary)
    } else {
        None
    };

    Some(
        PostEntry::new(title, link)
            .with_published(published)
            .with_tags(tags)
            .with_summary(summary)
            .with_media(media),
    )
}

/// YouTube thumbnail, then feed media content, then the first `<img>` of the summary
fn extract_media(entry: &Entry, link: &str, summary: &str) -> Option<Media> {
    if link.contains(YOUTUBE_HOST) {
        let video_id = entry.id.trim_start_matches("yt:video:");
        return Some(Media {
            url: format!("http://img.youtube.com/vi/{}/hqdefault.jpg", video_id),
            alt: None,
        });
    }

    let media_url = entry
        .media
        .iter()
        .flat_map(|m| m.content.iter())
        .find_map(|c| c.url.as_ref().map(|u| u.to_string()));
    if let Some(url) = media_url {
        return Some(Media { url, alt: None });
    }

    image_from_html(summary)
}

/// First image source in an HTML fragment, with the first alt text found
pub fn image_from_html(html: &str) -> Option<Media> {
    let document = Html::parse_fragment(html);
    let selector = Selector::parse("img").ok()?;

    let url = document
        .select(&selector)
        .find_map(|img| img.value().attr("src"))?
        .to_string();

    let alt = document
        .select(&selector)
        .find_map(|img| img.value().attr("alt"))
        .map(str::to_string);

    Some(Media { url, alt })
}
