pub mod bluesky;
pub mod dry_run;
pub mod mastodon;
pub mod traits;

pub use bluesky::BlueskyPlatform;
pub use dry_run::DryRunPlatform;
pub use mastodon::MastodonPlatform;
pub use traits::{BoostReport, SocialPlatform};

use crate::config::{Config, Platform};
use crate::errors::BotResult;

/// Log in to the configured platform; a dry run never touches the network
pub fn connect(config: &Config, dry_run: bool) -> BotResult<Box<dyn SocialPlatform>> {
    if dry_run {
        tracing::info!(platform = %config.platform, "Dry run, skipping login");
        return Ok(Box::new(DryRunPlatform::new(config.platform)));
    }

    match config.platform {
        Platform::Mastodon => Ok(Box::new(MastodonPlatform::login(config)?)),
        Platform::Bluesky => Ok(Box::new(BlueskyPlatform::login(config)?)),
    }
}
