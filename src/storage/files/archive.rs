use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;

use serde_json::Value;

use crate::domain::{FeedArchive, FeedDescriptor};
use crate::errors::{BotError, BotResult};
use crate::storage::traits::ArchiveStore;

pub const ARCHIVE_FILE_NAME: &str = "archive.json";

/// Stores each feed's archive as `archive.json` inside the feed's archive folder
#[derive(Debug, Clone, Default)]
pub struct JsonArchiveStore;

impl JsonArchiveStore {
    pub fn new() -> Self {
        Self
    }

    fn archive_file(feed: &FeedDescriptor) -> BotResult<PathBuf> {
        feed.archive
            .as_ref()
            .map(|folder| folder.join(ARCHIVE_FILE_NAME))
            .ok_or_else(|| BotError::Config(format!("Feed {} has no archive folder", feed.name)))
    }

    /// Interpret stored JSON, repairing the legacy bare-list layout
    fn parse(feed_name: &str, raw: &[u8]) -> FeedArchive {
        let links = |items: &Vec<Value>| -> Vec<String> {
            items
                .iter()
                .filter_map(|v| v.as_str().map(str::to_string))
                .collect()
        };

        match serde_json::from_slice::<Value>(raw) {
            Ok(Value::Object(map)) => match map.get("link") {
                Some(Value::Array(items)) => FeedArchive::from_links(links(items)),
                _ => {
                    tracing::warn!(feed = feed_name, "Archive has no link list, starting empty");
                    FeedArchive::new()
                }
            },
            Ok(Value::Array(items)) => {
                tracing::info!(feed = feed_name, "Repairing legacy archive layout");
                FeedArchive::from_links(links(&items))
            }
            Ok(_) => {
                tracing::warn!(feed = feed_name, "Unexpected archive contents, starting empty");
                FeedArchive::new()
            }
            Err(e) => {
                tracing::warn!(feed = feed_name, error = %e, "Corrupt archive, starting empty");
                FeedArchive::new()
            }
        }
    }
}

impl ArchiveStore for JsonArchiveStore {
    fn load(&self, feed: &FeedDescriptor) -> BotResult<FeedArchive> {
        let path = Self::archive_file(feed)?;

        match fs::read(&path) {
            Ok(raw) => Ok(Self::parse(&feed.name, &raw)),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                if let Some(folder) = path.parent() {
                    fs::create_dir_all(folder)?;
                }
                Ok(FeedArchive::new())
            }
            Err(e) => Err(e.into()),
        }
    }

    fn save(&self, feed: &FeedDescriptor, archive: &FeedArchive) -> BotResult<()> {
        let path = Self::archive_file(feed)?;
        if let Some(folder) = path.parent() {
            fs::create_dir_all(folder)?;
        }

        fs::write(&path, serde_json::to_string(archive)?)?;
        tracing::info!(feed = %feed.name, links = archive.len(), "Archive updated");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn feed_in(dir: &TempDir) -> FeedDescriptor {
        FeedDescriptor::new("Jane Doe", vec!["https://jane.dev/index.xml".to_string()])
            .with_archive_root(dir.path())
    }

    #[test]
    fn test_missing_archive_is_empty_and_creates_folder() {
        let dir = TempDir::new().unwrap();
        let feed = feed_in(&dir);
        let store = JsonArchiveStore::new();

        let archive = store.load(&feed).unwrap();
        assert!(archive.is_empty());
        assert!(dir.path().join("jane.dev").is_dir());
    }

    #[test]
    fn test_save_then_load() {
        let dir = TempDir::new().unwrap();
        let feed = feed_in(&dir);
        let store = JsonArchiveStore::new();

        let archive = FeedArchive::from_links(vec!["https://jane.dev/post-1".to_string()]);
        store.save(&feed, &archive).unwrap();

        assert_eq!(store.load(&feed).unwrap(), archive);
    }

    #[test]
    fn test_corrupt_archive_is_reset() {
        let dir = TempDir::new().unwrap();
        let feed = feed_in(&dir);
        fs::create_dir_all(feed.archive.as_ref().unwrap()).unwrap();
        fs::write(feed.archive.as_ref().unwrap().join(ARCHIVE_FILE_NAME), "\u{80}garbage").unwrap();

        let archive = JsonArchiveStore::new().load(&feed).unwrap();
        assert!(archive.is_empty());
    }

    #[test]
    fn test_archive_with_invalid_utf8_is_reset() {
        let dir = TempDir::new().unwrap();
        let feed = feed_in(&dir);
        fs::create_dir_all(feed.archive.as_ref().unwrap()).unwrap();
        fs::write(feed.archive.as_ref().unwrap().join(ARCHIVE_FILE_NAME), [0xff, 0xfe, 0x00]).unwrap();

        let archive = JsonArchiveStore::new().load(&feed).unwrap();
        assert!(archive.is_empty());
    }

    #[test]
    fn test_legacy_list_is_repaired() {
        let archive = JsonArchiveStore::parse(
            "legacy",
            br#"["https://jane.dev/1", "https://jane.dev/1", "https://jane.dev/2"]"#,
        );
        assert_eq!(archive.link, vec!["https://jane.dev/1", "https://jane.dev/2"]);
    }

    #[test]
    fn test_object_without_links_is_empty() {
        let archive = JsonArchiveStore::parse("odd", br#"{"other": 1}"#);
        assert!(archive.is_empty());
    }

    #[test]
    fn test_feed_without_archive_folder_errors() {
        let feed = FeedDescriptor::new("Nowhere", vec![]);
        assert!(JsonArchiveStore::new().load(&feed).is_err());
    }
}
