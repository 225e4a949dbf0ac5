use serde_json::Value;

use crate::config::MetadataConfig;
use crate::domain::FeedDescriptor;
use crate::errors::BotResult;
use crate::sources::blog_directory::{extract_info, BlogDirectory};
use crate::storage::MetadataFile;

/// Rebuilds the metadata file from the community's blog directory
pub struct MetadataService<'a> {
    config: &'a MetadataConfig,
    dry_run: bool,
}

impl<'a> MetadataService<'a> {
    pub fn new(config: &'a MetadataConfig, dry_run: bool) -> Self {
        Self { config, dry_run }
    }

    /// Returns the number of descriptors written
    pub fn refresh(&self) -> BotResult<usize> {
        let directory = BlogDirectory::new(&self.config.base_url, &self.config.github_raw_url);

        let urls = directory.descriptor_urls()?;
        if urls.is_empty() {
            tracing::warn!(url = %self.config.base_url, "No descriptor files listed, keeping current metadata");
            return Ok(0);
        }
        tracing::info!(files = urls.len(), "Fetching blog descriptors");

        let feeds = collect_descriptors(&urls, |url| directory.fetch_descriptor(url));

        if self.dry_run {
            tracing::info!(feeds = feeds.len(), "[dry run] Metadata file not written");
            return Ok(feeds.len());
        }

        MetadataFile::new(&self.config.json_file).save(&feeds)?;
        tracing::info!(
            feeds = feeds.len(),
            path = %self.config.json_file.display(),
            "Metadata written"
        );
        Ok(feeds.len())
    }
}

/// Fetch and convert every descriptor, skipping the ones that fail
pub fn collect_descriptors<F>(urls: &[String], fetch: F) -> Vec<FeedDescriptor>
where
    F: Fn(&str) -> BotResult<Value>,
{
    urls.iter()
        .filter_map(|url| match fetch(url) {
            Ok(content) => {
                let info = extract_info(&content);
                if info.is_none() {
                    tracing::warn!(url = %url, "Descriptor names no author, skipping");
                }
                info
            }
            Err(e) => {
                tracing::warn!(url = %url, error = %e, "Descriptor could not be fetched");
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::BotError;
    use serde_json::json;

    #[test]
    fn test_collect_descriptors_skips_failures() {
        let urls = vec![
            "https://raw.example/jane.json".to_string(),
            "https://raw.example/broken.json".to_string(),
            "https://raw.example/anonymous.json".to_string(),
        ];

        let feeds = collect_descriptors(&urls, |url| {
            if url.ends_with("jane.json") {
                Ok(json!({
                    "rss_feed": "https://jane.dev/index.xml",
                    "authors": [{"name": "Jane Doe", "social_media": [{"mastodon": "@jane@fosstodon.org"}]}]
                }))
            } else if url.ends_with("broken.json") {
                Err(BotError::Metadata("HTTP 404".to_string()))
            } else {
                Ok(json!({"rss_feed": "https://anon.dev/feed"}))
            }
        });

        assert_eq!(feeds.len(), 1);
        assert_eq!(feeds[0].name, "Jane Doe");
        assert_eq!(feeds[0].mastodon.as_deref(), Some("@jane@fosstodon.org"));
    }
}
