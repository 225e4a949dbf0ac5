use std::fs;
use std::path::{Path, PathBuf};

use crate::domain::{AnniversaryEvent, FeedDescriptor};
use crate::errors::{BotError, BotResult};

/// JSON list of feed descriptors shared by `fetch-metadata` and `promote-blog`
#[derive(Debug, Clone)]
pub struct MetadataFile {
    path: PathBuf,
}

impl MetadataFile {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load every descriptor that has at least one feed URL, annotated with its archive folder
    pub fn load_feeds(&self, archive_root: &Path) -> BotResult<Vec<FeedDescriptor>> {
        let raw = fs::read_to_string(&self.path).map_err(|e| {
            BotError::Metadata(format!("cannot read {}: {}", self.path.display(), e))
        })?;
        let feeds: Vec<FeedDescriptor> = serde_json::from_str(&raw)?;

        let total = feeds.len();
        let feeds: Vec<FeedDescriptor> = feeds
            .into_iter()
            .filter(FeedDescriptor::has_sources)
            .map(|feed| feed.with_archive_root(archive_root))
            .collect();

        tracing::info!(
            path = %self.path.display(),
            feeds = feeds.len(),
            dropped = total - feeds.len(),
            "Metadata loaded"
        );
        Ok(feeds)
    }

    pub fn save(&self, feeds: &[FeedDescriptor]) -> BotResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(&self.path, serde_json::to_string_pretty(feeds)?)?;
        Ok(())
    }
}

pub fn load_events(path: &Path) -> BotResult<Vec<AnniversaryEvent>> {
    let raw = fs::read_to_string(path)
        .map_err(|e| BotError::Metadata(format!("cannot read {}: {}", path.display(), e)))?;
    Ok(serde_json::from_str(&raw)?)
}
