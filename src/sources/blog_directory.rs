use reqwest::blocking::Client;
use scraper::{Html, Selector};
use serde_json::Value;

use crate::domain::FeedDescriptor;
use crate::errors::{BotError, BotResult};

/// GitHub directory of per-blog JSON descriptors (awesome-*-blogs layout)
pub struct BlogDirectory {
    client: Client,
    tree_url: String,
    raw_url: String,
}

impl BlogDirectory {
    pub fn new(tree_url: &str, raw_url: &str) -> Self {
        Self {
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(30))
                .build()
                .unwrap_or_else(|_| Client::new()),
            tree_url: tree_url.to_string(),
            raw_url: raw_url.trim_end_matches('/').to_string(),
        }
    }

    /// Raw URLs of every descriptor listed on the tree page
    pub fn descriptor_urls(&self) -> BotResult<Vec<String>> {
        let html = self
            .client
            .get(&self.tree_url)
            .send()?
            .error_for_status()?
            .text()?;

        descriptor_urls_from_page(&html, &self.raw_url)
    }

    pub fn fetch_descriptor(&self, url: &str) -> BotResult<Value> {
        let body = self.client.get(url).send()?.error_for_status()?.text()?;
        Ok(serde_json::from_str(&body)?)
    }
}

/// Read the file listing GitHub embeds as JSON in the page's `react-app` script
pub fn descriptor_urls_from_page(html: &str, raw_url: &str) -> BotResult<Vec<String>> {
    let document = Html::parse_document(html);
    let selector = Selector::parse("react-app script")
        .map_err(|e| BotError::Metadata(format!("invalid selector: {:?}", e)))?;

    let script = document
        .select(&selector)
        .next()
        .ok_or_else(|| BotError::Metadata("no embedded file listing found".to_string()))?;

    let payload: Value = serde_json::from_str(&script.text().collect::<String>())?;
    let items = payload
        .pointer("/payload/tree/items")
        .and_then(Value::as_array)
        .ok_or_else(|| BotError::Metadata("file listing has no tree items".to_string()))?;

    Ok(items
        .iter()
        .filter_map(|item| item.get("path").and_then(Value::as_str))
        .filter_map(|path| path.rsplit('/').next())
        .filter(|file| file.ends_with(".json"))
        .map(|file| format!("{}/{}", raw_url, file))
        .collect())
}

fn non_empty_str(value: Option<&Value>) -> Option<String> {
    value
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Turn a blog descriptor into a feed descriptor; `None` when it names no author
pub fn extract_info(content: &Value) -> Option<FeedDescriptor> {
    let author = content.pointer("/authors/0")?;
    let name = non_empty_str(author.get("name"))?;

    let rss_feed: Vec<String> = non_empty_str(content.get("rss_feed"))
        .or_else(|| non_empty_str(content.get("rss_feed_youtube")))
        .into_iter()
        .collect();

    let social = author.pointer("/social_media/0");
    let mastodon = social.and_then(|s| non_empty_str(s.get("mastodon")));
    let bluesky = social.and_then(|s| non_empty_str(s.get("bluesky")));

    Some(FeedDescriptor::new(&name, rss_feed).with_handles(mastodon, bluesky))
}
