use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A person celebrated on a fixed day of the year
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnniversaryEvent {
    pub name: String,
    /// Day of the year as `MM-DD`
    pub date: String,
    #[serde(default)]
    pub description_mastodon: String,
    #[serde(default)]
    pub description_bluesky: String,
    pub wiki_link: String,
    #[serde(default)]
    pub img: Option<String>,
    #[serde(default)]
    pub alt: Option<String>,
    #[serde(default)]
    pub bluesky: Option<String>,
}

impl AnniversaryEvent {
    pub fn matches_day(&self, today: NaiveDate) -> bool {
        self.date.trim() == today.format("%m-%d").to_string()
    }

    pub fn bluesky_handle(&self) -> Option<&str> {
        self.bluesky.as_deref().map(str::trim).filter(|h| !h.is_empty())
    }

    /// Image alt text, falling back to the person's name
    pub fn alt_text(&self) -> &str {
        self.alt
            .as_deref()
            .filter(|a| !a.trim().is_empty())
            .unwrap_or(&self.name)
    }
}
