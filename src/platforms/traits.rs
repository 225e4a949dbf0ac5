use crate::config::Platform;
use crate::domain::{Attachment, PostText};
use crate::errors::BotResult;

/// Outcome counters of a boosting pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BoostReport {
    pub boosted: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl BoostReport {
    pub fn merge(&mut self, other: BoostReport) {
        self.boosted += other.boosted;
        self.skipped += other.skipped;
        self.failed += other.failed;
    }
}

#[cfg_attr(test, mockall::automock)]
pub trait SocialPlatform {
    fn platform(&self) -> Platform;

    /// DID to mention `handle` with; `None` where mentions are plain text
    fn resolve_mention(&self, handle: &str) -> Option<String>;

    /// Publish a post, attaching the image when given
    fn publish(&self, post: &PostText, attachment: Option<Attachment>) -> BotResult<()>;

    /// Boost every post that mentions the bot and was not boosted yet
    fn boost_mentions(&self) -> BotResult<BoostReport>;

    /// Boost recent posts carrying any of `tags`
    fn boost_tags(&self, tags: &[String], limit: u32) -> BotResult<BoostReport>;
}
