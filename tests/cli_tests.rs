use std::fs;
use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

const ENV_VARS: [&str; 12] = [
    "PLATFORM",
    "CLIENT_NAME",
    "API_BASE_URL",
    "USERNAME",
    "PASSWORD",
    "ACCESS_TOKEN",
    "TAGS_TO_BOOST",
    "JSON_FILE",
    "COUNTER",
    "ARCHIVE_DIRECTORY",
    "EVENTS_FILE",
    "GEN_AI_SUPPORT",
];

fn bot_cmd(dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("communitybot").unwrap();
    cmd.current_dir(dir);
    for var in ENV_VARS {
        cmd.env_remove(var);
    }
    cmd
}

fn event_json(name: &str, date: &str, description: &str) -> String {
    format!(
        r#"{{"name": "{}", "date": "{}", "description_mastodon": "{}", "description_bluesky": "{}", "wiki_link": "https://en.wikipedia.org/wiki/X", "img": "x.png", "alt": "Portrait"}}"#,
        name, date, description, description
    )
}

#[test]
fn test_help_lists_commands_and_dry_run() {
    let dir = TempDir::new().unwrap();

    bot_cmd(dir.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("boost-mentions"))
        .stdout(predicate::str::contains("boost-tags"))
        .stdout(predicate::str::contains("promote-blog"))
        .stdout(predicate::str::contains("promote-anniversary"))
        .stdout(predicate::str::contains("fetch-metadata"))
        .stdout(predicate::str::contains("check-anniversaries"))
        .stdout(predicate::str::contains("--dry-run"));
}

#[test]
fn test_missing_platform_fails() {
    let dir = TempDir::new().unwrap();

    bot_cmd(dir.path())
        .arg("boost-mentions")
        .arg("--dry-run")
        .assert()
        .failure()
        .stderr(predicate::str::contains("PLATFORM"));
}

#[test]
fn test_unknown_platform_fails() {
    let dir = TempDir::new().unwrap();

    bot_cmd(dir.path())
        .arg("boost-mentions")
        .env("PLATFORM", "myspace")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unsupported platform"));
}

#[test]
fn test_dry_run_boost_mentions_skips_login() {
    let dir = TempDir::new().unwrap();

    bot_cmd(dir.path())
        .arg("boost-mentions")
        .arg("--dry-run")
        .env("PLATFORM", "bluesky")
        .assert()
        .success()
        .stdout(predicate::str::contains("Boosted 0 mentions"));
}

#[test]
fn test_boost_tags_requires_tags() {
    let dir = TempDir::new().unwrap();

    bot_cmd(dir.path())
        .arg("boost-tags")
        .arg("--dry-run")
        .env("PLATFORM", "bluesky")
        .assert()
        .failure()
        .stderr(predicate::str::contains("TAGS_TO_BOOST"));
}

mod promote_blog {
    use super::*;

    #[test]
    fn test_dry_run_without_feeds() {
        let dir = TempDir::new().unwrap();
        let metadata = dir.path().join("meta_data.json");
        fs::write(&metadata, "[]").unwrap();

        bot_cmd(dir.path())
            .arg("promote-blog")
            .arg("--dry-run")
            .env("PLATFORM", "bluesky")
            .env("JSON_FILE", &metadata)
            .assert()
            .success()
            .stdout(predicate::str::contains("No feeds configured"));
    }

    #[test]
    fn test_dry_run_leaves_cursor_untouched() {
        let dir = TempDir::new().unwrap();
        let metadata = dir.path().join("meta_data.json");
        let counter = dir.path().join("counter.txt");
        fs::write(
            &metadata,
            r#"[{"name": "Offline Blog", "rss_feed": ["http://127.0.0.1:9/feed.xml"], "mastodon": "", "bluesky": ""}]"#,
        )
        .unwrap();

        bot_cmd(dir.path())
            .arg("promote-blog")
            .arg("--dry-run")
            .env("PLATFORM", "bluesky")
            .env("JSON_FILE", &metadata)
            .env("COUNTER", &counter)
            .env("ARCHIVE_DIRECTORY", dir.path().join("archive"))
            .assert()
            .success()
            .stdout(predicate::str::contains("Posted 0 blog posts"))
            .stdout(predicate::str::contains("1 feeds skipped"));

        assert!(!counter.exists());
    }

    #[test]
    fn test_missing_metadata_file_fails() {
        let dir = TempDir::new().unwrap();

        bot_cmd(dir.path())
            .arg("promote-blog")
            .arg("--dry-run")
            .env("PLATFORM", "bluesky")
            .env("JSON_FILE", dir.path().join("missing.json"))
            .assert()
            .failure()
            .stderr(predicate::str::contains("missing.json"));
    }
}

mod anniversaries {
    use super::*;

    #[test]
    fn test_check_passes_for_short_posts() {
        let dir = TempDir::new().unwrap();
        let events = dir.path().join("events.json");
        fs::write(&events, format!("[{}]", event_json("Ada Lovelace", "12-10", "First programmer."))).unwrap();

        bot_cmd(dir.path())
            .arg("check-anniversaries")
            .arg("--events")
            .arg(&events)
            .assert()
            .success()
            .stdout(predicate::str::contains("All good"));
    }

    #[test]
    fn test_check_fails_for_long_posts() {
        let dir = TempDir::new().unwrap();
        let events = dir.path().join("events.json");
        let long = "x".repeat(480);
        fs::write(
            &events,
            format!(
                "[{}, {}]",
                event_json("Ada Lovelace", "12-10", "First programmer."),
                event_json("Hedy Lamarr", "11-09", &long)
            ),
        )
        .unwrap();

        bot_cmd(dir.path())
            .arg("check-anniversaries")
            .arg("--events")
            .arg(&events)
            .assert()
            .failure()
            .stdout(predicate::str::contains("Hedy Lamarr"))
            .stdout(predicate::str::contains("Ada Lovelace").not())
            .stderr(predicate::str::contains("too long"));
    }

    #[test]
    fn test_check_reads_events_file_from_env() {
        let dir = TempDir::new().unwrap();
        let events = dir.path().join("from_env.json");
        fs::write(&events, "[]").unwrap();

        bot_cmd(dir.path())
            .arg("check-anniversaries")
            .env("EVENTS_FILE", &events)
            .assert()
            .success()
            .stdout(predicate::str::contains("Checked 0 events"));
    }

    #[test]
    fn test_dry_run_promotes_todays_event() {
        let dir = TempDir::new().unwrap();
        let events = dir.path().join("events.json");
        let today = chrono::Local::now().format("%m-%d").to_string();
        fs::write(
            &events,
            format!(
                "[{}, {}]",
                event_json("Grace Hopper", &today, "Compiler pioneer."),
                event_json("Nobody Today", "02-30", "Never matches.")
            ),
        )
        .unwrap();

        bot_cmd(dir.path())
            .arg("promote-anniversary")
            .arg("--dry-run")
            .env("PLATFORM", "bluesky")
            .env("EVENTS_FILE", &events)
            .assert()
            .success()
            .stdout(predicate::str::contains("Posted 1 anniversaries"));
    }
}
