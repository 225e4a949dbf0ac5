use crate::domain::{FeedDescriptor, PostEntry};
use crate::errors::FetchError;

#[cfg_attr(test, mockall::automock)]
pub trait FeedFetcher: Send + Sync {
    /// Entries of every feed URL of the descriptor, in feed order
    fn fetch(&self, feed: &FeedDescriptor) -> Result<Vec<PostEntry>, FetchError>;
}
