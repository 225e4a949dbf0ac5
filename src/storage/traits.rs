use crate::domain::{FeedArchive, FeedDescriptor};
use crate::errors::BotResult;

#[cfg_attr(test, mockall::automock)]
pub trait ArchiveStore: Send + Sync {
    /// Links already posted for this feed; a missing or corrupt archive is empty
    fn load(&self, feed: &FeedDescriptor) -> BotResult<FeedArchive>;
    fn save(&self, feed: &FeedDescriptor, archive: &FeedArchive) -> BotResult<()>;
}

#[cfg_attr(test, mockall::automock)]
pub trait CursorStore: Send + Sync {
    /// Name of the feed to resume at, `None` when nothing was stored yet
    fn read(&self) -> BotResult<Option<String>>;
    fn write(&self, feed_name: &str) -> BotResult<()>;
}
