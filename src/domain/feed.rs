use std::path::{Path, PathBuf};

use serde::{Deserialize, Deserializer, Serialize};
use url::Url;

use crate::config::Platform;

/// Hosts serving many unrelated feeds; their archives get one folder per feed name
const SHARED_HOSTS: &[&str] = &["www.youtube.com", "medium.com"];

/// `rss_feed` is stored either as a list (possibly holding `null`) or as `""`
fn deserialize_feed_urls<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::{self, SeqAccess, Visitor};
    use std::fmt;

    struct FeedUrlsVisitor;

    impl<'de> Visitor<'de> for FeedUrlsVisitor {
        type Value = Vec<String>;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("a feed URL, a list of feed URLs or null")
        }

        fn visit_str<E>(self, v: &str) -> Result<Vec<String>, E>
        where
            E: de::Error,
        {
            Ok(non_blank(Some(v.to_string())).into_iter().collect())
        }

        fn visit_unit<E>(self) -> Result<Vec<String>, E> {
            Ok(Vec::new())
        }

        fn visit_none<E>(self) -> Result<Vec<String>, E> {
            Ok(Vec::new())
        }

        fn visit_seq<A>(self, mut seq: A) -> Result<Vec<String>, A::Error>
        where
            A: SeqAccess<'de>,
        {
            let mut urls = Vec::new();
            while let Some(item) = seq.next_element::<Option<String>>()? {
                urls.extend(non_blank(item));
            }
            Ok(urls)
        }
    }

    deserializer.deserialize_any(FeedUrlsVisitor)
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

fn deserialize_handle<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(non_blank(Option::<String>::deserialize(deserializer)?))
}

/// One blog (or channel) to promote, as listed in the metadata file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedDescriptor {
    pub name: String,
    #[serde(default, deserialize_with = "deserialize_feed_urls")]
    pub rss_feed: Vec<String>,
    #[serde(default, deserialize_with = "deserialize_handle", skip_serializing_if = "Option::is_none")]
    pub mastodon: Option<String>,
    #[serde(default, deserialize_with = "deserialize_handle", skip_serializing_if = "Option::is_none")]
    pub bluesky: Option<String>,
    #[serde(skip)]
    pub archive: Option<PathBuf>,
}

impl FeedDescriptor {
    pub fn new(name: &str, rss_feed: Vec<String>) -> Self {
        Self {
            name: name.to_string(),
            rss_feed,
            mastodon: None,
            bluesky: None,
            archive: None,
        }
    }

    pub fn with_handles(mut self, mastodon: Option<String>, bluesky: Option<String>) -> Self {
        self.mastodon = non_blank(mastodon);
        self.bluesky = non_blank(bluesky);
        self
    }

    pub fn has_sources(&self) -> bool {
        !self.rss_feed.is_empty()
    }

    /// Lowercase name with spaces turned into dashes
    pub fn slug(&self) -> String {
        self.name.to_lowercase().replace(' ', "-")
    }

    /// Archive folder for this feed below `root`, derived from the first feed URL's host
    pub fn archive_folder(&self, root: &Path) -> Option<PathBuf> {
        let first = self.rss_feed.first()?;
        let parsed = Url::parse(first).ok()?;
        let host = parsed.host_str()?;

        let folder = root.join(host);
        if SHARED_HOSTS.iter().any(|shared| host.contains(shared)) {
            Some(folder.join(self.slug()))
        } else {
            Some(folder)
        }
    }

    /// Annotate the descriptor with its archive folder
    pub fn with_archive_root(mut self, root: &Path) -> Self {
        self.archive = self.archive_folder(root);
        self
    }

    /// The author's handle on the given platform, if they listed one
    pub fn handle_for(&self, platform: Platform) -> Option<&str> {
        match platform {
            Platform::Mastodon => self.mastodon.as_deref(),
            Platform::Bluesky => self.bluesky.as_deref(),
        }
    }
}
