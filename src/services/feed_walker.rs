use crate::domain::{FeedDescriptor, PostEntry};
use crate::errors::BotResult;
use crate::sources::traits::FeedFetcher;
use crate::storage::traits::{ArchiveStore, CursorStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WalkLimits {
    /// Posts per run across all feeds
    pub per_run: usize,
    /// Posts per feed per run
    pub per_feed: usize,
}

impl Default for WalkLimits {
    fn default() -> Self {
        Self {
            per_run: 2,
            per_feed: 1,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WalkReport {
    pub posted: usize,
    pub failed: usize,
    /// Feeds skipped because they could not be read or had nothing new
    pub skipped: usize,
    /// Feed the next run resumes at; `None` when there were no feeds
    pub next_cursor: Option<String>,
}

/// Round-robin walk over the feeds, posting entries not seen before
pub struct FeedWalker<F: FeedFetcher, A: ArchiveStore, C: CursorStore> {
    fetcher: F,
    archives: A,
    cursor: C,
    limits: WalkLimits,
    dry_run: bool,
}

impl<F: FeedFetcher, A: ArchiveStore, C: CursorStore> FeedWalker<F, A, C> {
    pub fn new(fetcher: F, archives: A, cursor: C) -> Self {
        Self {
            fetcher,
            archives,
            cursor,
            limits: WalkLimits::default(),
            dry_run: false,
        }
    }

    pub fn with_limits(mut self, limits: WalkLimits) -> Self {
        self.limits = limits;
        self
    }

    /// In a dry run `publish` still sees every candidate, but archives and cursor stay untouched
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Walk the feeds starting at the stored cursor, calling `publish` for each new entry
    pub fn run<P>(&self, feeds: &[FeedDescriptor], mut publish: P) -> BotResult<WalkReport>
    where
        P: FnMut(&FeedDescriptor, &PostEntry) -> BotResult<()>,
    {
        let mut report = WalkReport::default();
        if feeds.is_empty() {
            tracing::info!("No feeds to walk");
            return Ok(report);
        }

        let cursor = self.cursor.read()?;
        let start = start_index(feeds, cursor.as_deref());
        tracing::info!(start = %feeds[start].name, feeds = feeds.len(), "Resuming feed walk");

        let mut next = &feeds[start];
        for offset in 0..feeds.len() {
            let feed = &feeds[(start + offset) % feeds.len()];
            if report.posted >= self.limits.per_run {
                tracing::info!(next = %feed.name, "Post limit for this run reached");
                next = feed;
                break;
            }
            self.visit(feed, &mut publish, &mut report)?;
        }

        report.next_cursor = Some(next.name.clone());
        if !self.dry_run {
            self.cursor.write(&next.name)?;
        }

        tracing::info!(
            posted = report.posted,
            failed = report.failed,
            skipped = report.skipped,
            next = %next.name,
            "Feed walk finished"
        );
        Ok(report)
    }

    fn visit<P>(&self, feed: &FeedDescriptor, publish: &mut P, report: &mut WalkReport) -> BotResult<()>
    where
        P: FnMut(&FeedDescriptor, &PostEntry) -> BotResult<()>,
    {
        let entries = match self.fetcher.fetch(feed) {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!(feed = %feed.name, error = %e, "Skipping feed");
                report.skipped += 1;
                return Ok(());
            }
        };

        let mut archive = match self.archives.load(feed) {
            Ok(archive) => archive,
            Err(e) => {
                tracing::warn!(feed = %feed.name, error = %e, "Archive unavailable, skipping feed");
                report.skipped += 1;
                return Ok(());
            }
        };

        if entries.len() <= archive.len() {
            tracing::debug!(feed = %feed.name, "Nothing new");
            report.skipped += 1;
            return Ok(());
        }

        let mut posted_here = 0;
        let mut added = false;
        for entry in &entries {
            if archive.contains(&entry.link) {
                continue;
            }
            match publish(feed, entry) {
                Ok(()) => {
                    report.posted += 1;
                    posted_here += 1;
                    added |= archive.insert(entry.link.clone());
                    if posted_here >= self.limits.per_feed || report.posted >= self.limits.per_run {
                        break;
                    }
                }
                Err(e) => {
                    tracing::error!(feed = %feed.name, link = %entry.link, error = %e, "Posting failed");
                    report.failed += 1;
                    break;
                }
            }
        }

        // Already published, so the walk goes on and the cursor still moves
        if added && !self.dry_run {
            if let Err(e) = self.archives.save(feed, &archive) {
                tracing::error!(feed = %feed.name, error = %e, "Archive could not be saved");
            }
        }
        Ok(())
    }
}

fn start_index(feeds: &[FeedDescriptor], cursor: Option<&str>) -> usize {
    cursor
        .and_then(|name| feeds.iter().position(|f| f.name == name))
        .unwrap_or(0)
}
