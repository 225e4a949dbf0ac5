use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

/// Image attached to a feed entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Media {
    pub url: String,
    pub alt: Option<String>,
}

/// A single feed item considered for posting
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostEntry {
    pub title: String,
    pub link: String,
    pub published: Option<String>,
    pub tags: Vec<String>,
    pub summary: String,
    pub media: Option<Media>,
}

impl PostEntry {
    pub fn new(title: String, link: String) -> Self {
        Self {
            title,
            link,
            published: None,
            tags: Vec::new(),
            summary: String::new(),
            media: None,
        }
    }

    pub fn with_published(mut self, published: Option<String>) -> Self {
        self.published = published;
        self
    }

    pub fn with_tags(mut self, tags: Vec<String>) -> Self {
        self.tags = tags;
        self
    }

    pub fn with_summary(mut self, summary: String) -> Self {
        self.summary = summary;
        self
    }

    pub fn with_media(mut self, media: Option<Media>) -> Self {
        self.media = media;
        self
    }

    /// Publication time, or `now` when the date is missing or unparseable
    pub fn published_at(&self, now: NaiveDateTime) -> NaiveDateTime {
        match self.published.as_deref().and_then(parse_pub_date) {
            Some(date) => date,
            None => {
                tracing::warn!(
                    link = %self.link,
                    published = ?self.published,
                    "No matching date format found, using current date"
                );
                now
            }
        }
    }
}

/// Parse the date formats blogs put into feeds, normalised to naive UTC
///
/// Accepts RFC 2822 (numeric offsets and zone names such as `GMT`),
/// RFC 3339, `%Y-%m-%dT%H:%M:%S%.f` with an optional trailing `Z`, and
/// plain `%Y-%m-%d` dates.
pub fn parse_pub_date(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();

    if let Ok(date) = DateTime::parse_from_rfc2822(value) {
        return Some(date.with_timezone(&Utc).naive_utc());
    }

    if let Ok(date) = DateTime::parse_from_rfc3339(value) {
        return Some(date.with_timezone(&Utc).naive_utc());
    }

    if let Ok(date) = NaiveDateTime::parse_from_str(value.trim_end_matches('Z'), "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(date);
    }

    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}
