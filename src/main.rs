use std::path::PathBuf;

use anyhow::{bail, Context};
use chrono::Local;
use clap::Parser;

use communitybot::cli::{Cli, Commands};
use communitybot::config::{AnniversaryConfig, BlogConfig, Config, MetadataConfig, TagConfig};
use communitybot::logging;
use communitybot::platforms::{self, SocialPlatform};
use communitybot::services::{
    check_events, AnniversaryService, BlogService, BoostService, GeminiSummarizer, MetadataService,
};
use communitybot::storage::files::load_events;

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn run() -> anyhow::Result<()> {
    // Before parsing so `.env` values can fill clap's env-backed arguments
    Config::load_dotenv();
    let cli = Cli::parse();
    logging::init("info");

    let dry_run = cli.dry_run;
    match cli.command {
        Commands::BoostMentions => cmd_boost_mentions(dry_run),
        Commands::BoostTags => cmd_boost_tags(dry_run),
        Commands::PromoteBlog => cmd_promote_blog(dry_run),
        Commands::PromoteAnniversary => cmd_promote_anniversary(dry_run),
        Commands::FetchMetadata => cmd_fetch_metadata(dry_run),
        Commands::CheckAnniversaries { events } => cmd_check_anniversaries(events),
    }
}

/// Load the platform settings and log in (or fake it for a dry run)
fn connect(dry_run: bool) -> anyhow::Result<(Config, Box<dyn SocialPlatform>)> {
    let config = Config::from_env().context("Loading configuration")?;

    let title = format!("Initializing {} Bot", config.client_name);
    tracing::info!("{}", title);
    tracing::info!("{}", "=".repeat(title.chars().count()));
    tracing::info!(" > Connecting to {}", config.api_base_url);

    let platform = platforms::connect(&config, dry_run)
        .with_context(|| format!("Logging in to {}", config.platform))?;
    Ok((config, platform))
}

fn cmd_boost_mentions(dry_run: bool) -> anyhow::Result<()> {
    let (_, platform) = connect(dry_run)?;
    let report = BoostService::new(platform.as_ref()).boost_mentions()?;

    println!(
        "Boosted {} mentions ({} skipped, {} failed).",
        report.boosted, report.skipped, report.failed
    );
    Ok(())
}

fn cmd_boost_tags(dry_run: bool) -> anyhow::Result<()> {
    let tags = TagConfig::from_env().context("Loading tags to boost")?;
    let (_, platform) = connect(dry_run)?;
    let report = BoostService::new(platform.as_ref()).boost_tags(&tags)?;

    println!(
        "Boosted {} tagged posts ({} skipped, {} failed).",
        report.boosted, report.skipped, report.failed
    );
    Ok(())
}

fn cmd_promote_blog(dry_run: bool) -> anyhow::Result<()> {
    let (config, platform) = connect(dry_run)?;
    let blog = BlogConfig::from_env(&config.client_name).context("Loading blog settings")?;

    let mut service = BlogService::new(platform.as_ref(), &blog, dry_run);
    if let Some(gen_ai) = &blog.gen_ai {
        tracing::info!(model = %gen_ai.model, "AI summaries enabled");
        service = service.with_summarizer(Box::new(GeminiSummarizer::new(gen_ai)));
    }

    let report = service.promote()?;
    match &report.next_cursor {
        Some(next) => println!(
            "Posted {} blog posts ({} failed, {} feeds skipped). Next run starts at {}.",
            report.posted, report.failed, report.skipped, next
        ),
        None => println!("No feeds configured."),
    }
    Ok(())
}

fn cmd_promote_anniversary(dry_run: bool) -> anyhow::Result<()> {
    let (_, platform) = connect(dry_run)?;
    let anniversaries = AnniversaryConfig::from_env();

    let service = AnniversaryService::new(platform.as_ref(), &anniversaries, dry_run);
    let report = service.promote(Local::now().date_naive())?;

    println!(
        "Posted {} anniversaries ({} failed).",
        report.posted, report.failed
    );
    Ok(())
}

fn cmd_fetch_metadata(dry_run: bool) -> anyhow::Result<()> {
    let config = MetadataConfig::from_env().context("Loading metadata settings")?;
    let written = MetadataService::new(&config, dry_run).refresh()?;

    if dry_run {
        println!("Dry run complete. Would write {} feeds.", written);
    } else {
        println!("Wrote {} feeds to {}.", written, config.json_file.display());
    }
    Ok(())
}

fn cmd_check_anniversaries(events: Option<PathBuf>) -> anyhow::Result<()> {
    let path = events.unwrap_or_else(|| AnniversaryConfig::from_env().events_path);
    let events = load_events(&path).with_context(|| format!("Reading {}", path.display()))?;

    let issues = check_events(&events);
    if !issues.is_empty() {
        for issue in &issues {
            println!("🚨 {}", issue);
        }
        bail!("{} anniversary posts are too long", issues.len());
    }

    println!("All good! 🎉 Checked {} events.", events.len());
    Ok(())
}
