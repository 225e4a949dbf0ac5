use serde::{Deserialize, Serialize};

/// Links of a feed that were already posted, in posting order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedArchive {
    #[serde(default)]
    pub link: Vec<String>,
}

impl FeedArchive {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build an archive from a raw link list, keeping first occurrences only
    pub fn from_links<I>(links: I) -> Self
    where
        I: IntoIterator<Item = String>,
    {
        let mut archive = Self::new();
        for link in links {
            archive.insert(link);
        }
        archive
    }

    pub fn contains(&self, link: &str) -> bool {
        self.link.iter().any(|l| l == link)
    }

    /// Append a link; returns false if it was already present
    pub fn insert(&mut self, link: String) -> bool {
        if self.contains(&link) {
            return false;
        }
        self.link.push(link);
        true
    }

    pub fn len(&self) -> usize {
        self.link.len()
    }

    pub fn is_empty(&self) -> bool {
        self.link.is_empty()
    }
}
