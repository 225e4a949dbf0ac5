use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "communitybot")]
#[command(about = "Community bots for Mastodon and Bluesky")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Dry run - log what would be posted, never log in or save state
    #[arg(long, global = true)]
    pub dry_run: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Boost posts that mention the bot
    BoostMentions,

    /// Boost recent posts carrying the tags in TAGS_TO_BOOST
    BoostTags,

    /// Promote new blog posts from the feeds in the metadata file
    PromoteBlog,

    /// Post today's anniversaries from the events file
    PromoteAnniversary,

    /// Rebuild the metadata file from the blog directory on GitHub
    FetchMetadata,

    /// Check that every anniversary post fits the platform length limits
    CheckAnniversaries {
        /// Events file (defaults to EVENTS_FILE or metadata/events.json)
        #[arg(long, env = "EVENTS_FILE")]
        events: Option<PathBuf>,
    },
}
