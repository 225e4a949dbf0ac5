use crate::config::TagConfig;
use crate::errors::BotResult;
use crate::platforms::{BoostReport, SocialPlatform};

/// Reshares community posts: mentions of the bot and posts carrying the watched tags
pub struct BoostService<'a> {
    platform: &'a dyn SocialPlatform,
}

impl<'a> BoostService<'a> {
    pub fn new(platform: &'a dyn SocialPlatform) -> Self {
        Self { platform }
    }

    pub fn boost_mentions(&self) -> BotResult<BoostReport> {
        tracing::info!(platform = %self.platform.platform(), "Boosting mentions");
        let report = self.platform.boost_mentions()?;
        log_report("mentions", &report);
        Ok(report)
    }

    pub fn boost_tags(&self, config: &TagConfig) -> BotResult<BoostReport> {
        tracing::info!(
            platform = %self.platform.platform(),
            tags = ?config.tags,
            "Boosting tagged posts"
        );
        let report = self
            .platform
            .boost_tags(&config.tags, config.timeline_depth_limit)?;
        log_report("tags", &report);
        Ok(report)
    }
}

fn log_report(kind: &str, report: &BoostReport) {
    tracing::info!(
        kind,
        boosted = report.boosted,
        skipped = report.skipped,
        failed = report.failed,
        "Boosting finished"
    );
}
