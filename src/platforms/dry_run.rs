use crate::config::Platform;
use crate::domain::{Attachment, PostText};
use crate::errors::BotResult;
use crate::platforms::traits::{BoostReport, SocialPlatform};

/// Logs what would be published instead of talking to the network
pub struct DryRunPlatform {
    platform: Platform,
}

impl DryRunPlatform {
    pub fn new(platform: Platform) -> Self {
        Self { platform }
    }
}

impl SocialPlatform for DryRunPlatform {
    fn platform(&self) -> Platform {
        self.platform
    }

    fn resolve_mention(&self, _handle: &str) -> Option<String> {
        None
    }

    fn publish(&self, post: &PostText, attachment: Option<Attachment>) -> BotResult<()> {
        tracing::info!(
            platform = %self.platform,
            chars = post.char_count(),
            image = ?attachment.map(|a| a.image_path),
            "[dry run] Would post:\n{}",
            post
        );
        Ok(())
    }

    fn boost_mentions(&self) -> BotResult<BoostReport> {
        tracing::info!(platform = %self.platform, "[dry run] No mentions will be boosted");
        Ok(BoostReport::default())
    }

    fn boost_tags(&self, tags: &[String], _limit: u32) -> BotResult<BoostReport> {
        tracing::info!(platform = %self.platform, ?tags, "[dry run] No tagged posts will be boosted");
        Ok(BoostReport::default())
    }
}
