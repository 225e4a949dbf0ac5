use std::path::PathBuf;

use crate::errors::{BotError, BotResult};

pub const DEFAULT_CLIENT_NAME: &str = "CommunityBot";
pub const DEFAULT_BLUESKY_SERVICE: &str = social_clients::bluesky::DEFAULT_SERVICE;
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_ANNIVERSARY_IMAGE_BASE_URL: &str =
    "https://raw.githubusercontent.com/cosimameyer/illustrations/main/amazing-women";

/// Maximum number of statuses read from a Mastodon hashtag timeline
pub const TIMELINE_DEPTH_LIMIT: u32 = 40;

/// Reads a single variable by name; `std::env::var` in production, a map in tests
pub type Lookup<'a> = &'a dyn Fn(&str) -> Option<String>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    Mastodon,
    Bluesky,
}

impl Platform {
    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Mastodon => "mastodon",
            Platform::Bluesky => "bluesky",
        }
    }
}

impl std::str::FromStr for Platform {
    type Err = BotError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "mastodon" => Ok(Platform::Mastodon),
            "bluesky" | "bsky" => Ok(Platform::Bluesky),
            _ => Err(BotError::UnsupportedPlatform(s.to_string())),
        }
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    Public,
    Unlisted,
    Private,
    Direct,
}

impl Visibility {
    pub fn as_str(&self) -> &'static str {
        match self {
            Visibility::Public => "public",
            Visibility::Unlisted => "unlisted",
            Visibility::Private => "private",
            Visibility::Direct => "direct",
        }
    }
}

impl std::str::FromStr for Visibility {
    type Err = BotError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "public" => Ok(Visibility::Public),
            "unlisted" => Ok(Visibility::Unlisted),
            "private" => Ok(Visibility::Private),
            "direct" => Ok(Visibility::Direct),
            _ => Err(BotError::Config(format!("Unknown visibility: {}", s))),
        }
    }
}

/// Settings shared by every command that talks to a platform
#[derive(Debug, Clone)]
pub struct Config {
    pub platform: Platform,
    pub client_name: String,
    pub api_base_url: String,
    pub username: Option<String>,
    pub password: Option<String>,
    pub access_token: Option<String>,
    pub visibility: Visibility,
    pub ignore_servers: Vec<String>,
}

impl Config {
    /// Get the directory where the executable is located
    fn exe_dir() -> Option<PathBuf> {
        std::env::current_exe()
            .ok()
            .and_then(|p| p.parent().map(|p| p.to_path_buf()))
    }

    /// Load `.env` from the executable's directory, then from the current directory
    pub fn load_dotenv() {
        if let Some(dir) = Self::exe_dir() {
            let env_path = dir.join(".env");
            if env_path.exists() {
                dotenvy::from_path(&env_path).ok();
            }
        }
        dotenvy::dotenv().ok();
    }

    pub fn from_env() -> BotResult<Self> {
        Self::from_lookup(&process_env)
    }

    pub fn from_lookup(lookup: Lookup<'_>) -> BotResult<Self> {
        let platform: Platform = lookup("PLATFORM")
            .ok_or_else(|| BotError::MissingEnvVar("PLATFORM".to_string()))?
            .parse()?;

        let client_name = non_empty(lookup("CLIENT_NAME"))
            .unwrap_or_else(|| DEFAULT_CLIENT_NAME.to_string());

        let api_base_url = match platform {
            Platform::Mastodon => non_empty(lookup("API_BASE_URL"))
                .ok_or_else(|| BotError::MissingEnvVar("API_BASE_URL".to_string()))?,
            Platform::Bluesky => non_empty(lookup("API_BASE_URL"))
                .filter(|url| url.starts_with("http"))
                .unwrap_or_else(|| DEFAULT_BLUESKY_SERVICE.to_string()),
        };

        let visibility = match non_empty(lookup("MASTODON_VISIBILITY")) {
            Some(value) => value.parse()?,
            None => Visibility::Public,
        };

        Ok(Self {
            platform,
            client_name,
            api_base_url,
            username: non_empty(lookup("USERNAME")),
            password: non_empty(lookup("PASSWORD")),
            access_token: non_empty(lookup("ACCESS_TOKEN")),
            visibility,
            ignore_servers: list(lookup("IGNORE_SERVERS")),
        })
    }

    /// Return a credential that is only needed once we actually log in
    pub fn require<'a>(value: &'a Option<String>, name: &str) -> BotResult<&'a str> {
        value
            .as_deref()
            .ok_or_else(|| BotError::MissingEnvVar(name.to_string()))
    }
}

#[derive(Debug, Clone)]
pub struct GenAiConfig {
    pub api_key: String,
    pub model: String,
}

#[derive(Debug, Clone)]
pub struct BlogConfig {
    pub archive_dir: PathBuf,
    pub counter_path: PathBuf,
    pub metadata_path: PathBuf,
    pub images_dir: PathBuf,
    pub base_tags: Vec<String>,
    pub process_images: bool,
    pub gen_ai: Option<GenAiConfig>,
}

impl BlogConfig {
    pub fn from_env(client_name: &str) -> BotResult<Self> {
        Self::from_lookup(&process_env, client_name)
    }

    pub fn from_lookup(lookup: Lookup<'_>, client_name: &str) -> BotResult<Self> {
        let base_tags = match non_empty(lookup("BASE_TAGS")) {
            Some(tags) => list(Some(tags)),
            None => default_tags(client_name),
        };

        let gen_ai = if flag(lookup("GEN_AI_SUPPORT")) {
            let api_key = non_empty(lookup("GEMINI_API_KEY"))
                .ok_or_else(|| BotError::MissingEnvVar("GEMINI_API_KEY".to_string()))?;
            let model = non_empty(lookup("GEMINI_MODEL_NAME"))
                .unwrap_or_else(|| DEFAULT_GEMINI_MODEL.to_string());
            Some(GenAiConfig { api_key, model })
        } else {
            None
        };

        Ok(Self {
            archive_dir: path_or(lookup("ARCHIVE_DIRECTORY"), "archive"),
            counter_path: path_or(lookup("COUNTER"), "metadata/counter.txt"),
            metadata_path: path_or(lookup("JSON_FILE"), "metadata/meta_data.json"),
            images_dir: path_or(lookup("IMAGES"), "images"),
            base_tags,
            process_images: flag(lookup("PROCESS_IMAGES")),
            gen_ai,
        })
    }
}

/// Tags every blog post carries, keyed by the well-known bot names
pub fn default_tags(client_name: &str) -> Vec<String> {
    let tags: &[&str] = match client_name {
        "pyladies_bot" => &["pyladies", "python"],
        "rladies_bot" => &["rladies", "rstats"],
        _ => &[],
    };
    tags.iter().map(|t| t.to_string()).collect()
}

#[derive(Debug, Clone)]
pub struct TagConfig {
    pub tags: Vec<String>,
    pub timeline_depth_limit: u32,
}

impl TagConfig {
    pub fn from_env() -> BotResult<Self> {
        Self::from_lookup(&process_env)
    }

    pub fn from_lookup(lookup: Lookup<'_>) -> BotResult<Self> {
        let tags = list(lookup("TAGS_TO_BOOST"));
        if tags.is_empty() {
            return Err(BotError::MissingEnvVar("TAGS_TO_BOOST".to_string()));
        }

        Ok(Self {
            tags,
            timeline_depth_limit: TIMELINE_DEPTH_LIMIT,
        })
    }
}

#[derive(Debug, Clone)]
pub struct AnniversaryConfig {
    pub events_path: PathBuf,
    pub images_dir: PathBuf,
    pub image_base_url: String,
}

impl AnniversaryConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(&process_env)
    }

    pub fn from_lookup(lookup: Lookup<'_>) -> Self {
        Self {
            events_path: path_or(lookup("EVENTS_FILE"), "metadata/events.json"),
            images_dir: path_or(lookup("IMAGES"), "anniversary_images"),
            image_base_url: non_empty(lookup("ANNIVERSARY_IMAGE_BASE_URL"))
                .unwrap_or_else(|| DEFAULT_ANNIVERSARY_IMAGE_BASE_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct MetadataConfig {
    pub base_url: String,
    pub github_raw_url: String,
    pub json_file: PathBuf,
}

impl MetadataConfig {
    pub fn from_env() -> BotResult<Self> {
        Self::from_lookup(&process_env)
    }

    pub fn from_lookup(lookup: Lookup<'_>) -> BotResult<Self> {
        let base_url = non_empty(lookup("BASE_URL"))
            .ok_or_else(|| BotError::MissingEnvVar("BASE_URL".to_string()))?;
        let github_raw_url = non_empty(lookup("GITHUB_RAW_URL"))
            .ok_or_else(|| BotError::MissingEnvVar("GITHUB_RAW_URL".to_string()))?;

        Ok(Self {
            base_url,
            github_raw_url: github_raw_url.trim_end_matches('/').to_string(),
            json_file: path_or(lookup("JSON_FILE"), "metadata/meta_data.json"),
        })
    }
}

fn process_env(name: &str) -> Option<String> {
    std::env::var(name).ok()
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

fn path_or(value: Option<String>, default: &str) -> PathBuf {
    PathBuf::from(non_empty(value).unwrap_or_else(|| default.to_string()))
}

/// Split a comma separated list, dropping blanks and leading `#`
fn list(value: Option<String>) -> Vec<String> {
    value
        .unwrap_or_default()
        .split(',')
        .map(|item| item.trim().trim_start_matches('#').trim().to_string())
        .filter(|item| !item.is_empty())
        .collect()
}

fn flag(value: Option<String>) -> bool {
    matches!(
        non_empty(value).map(|v| v.to_lowercase()).as_deref(),
        Some("1" | "true" | "yes" | "on")
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_bluesky_defaults() {
        let lookup = lookup_from(&[("PLATFORM", "bluesky"), ("USERNAME", "bot.bsky.social")]);
        let config = Config::from_lookup(&lookup).unwrap();

        assert_eq!(config.platform, Platform::Bluesky);
        assert_eq!(config.client_name, DEFAULT_CLIENT_NAME);
        assert_eq!(config.api_base_url, DEFAULT_BLUESKY_SERVICE);
        assert_eq!(config.username.as_deref(), Some("bot.bsky.social"));
        assert!(config.password.is_none());
        assert_eq!(config.visibility, Visibility::Public);
    }

    #[test]
    fn test_legacy_bluesky_base_url_is_replaced() {
        let lookup = lookup_from(&[("PLATFORM", "bluesky"), ("API_BASE_URL", "bluesky")]);
        let config = Config::from_lookup(&lookup).unwrap();
        assert_eq!(config.api_base_url, DEFAULT_BLUESKY_SERVICE);
    }

    #[test]
    fn test_mastodon_requires_base_url() {
        let lookup = lookup_from(&[("PLATFORM", "mastodon")]);
        let err = Config::from_lookup(&lookup).unwrap_err();
        assert!(matches!(err, BotError::MissingEnvVar(ref v) if v == "API_BASE_URL"));
    }

    #[test]
    fn test_mastodon_config() {
        let lookup = lookup_from(&[
            ("PLATFORM", "Mastodon"),
            ("API_BASE_URL", "https://botsin.space"),
            ("MASTODON_VISIBILITY", "unlisted"),
            ("IGNORE_SERVERS", "spam.example, ,bad.example"),
            ("ACCESS_TOKEN", "abc"),
        ]);
        let config = Config::from_lookup(&lookup).unwrap();

        assert_eq!(config.platform, Platform::Mastodon);
        assert_eq!(config.visibility, Visibility::Unlisted);
        assert_eq!(config.ignore_servers, vec!["spam.example", "bad.example"]);
        assert_eq!(Config::require(&config.access_token, "ACCESS_TOKEN").unwrap(), "abc");
    }

    #[test]
    fn test_unknown_platform() {
        let lookup = lookup_from(&[("PLATFORM", "myspace")]);
        assert!(matches!(
            Config::from_lookup(&lookup),
            Err(BotError::UnsupportedPlatform(_))
        ));
    }

    #[test]
    fn test_missing_credential() {
        let missing: Option<String> = None;
        let err = Config::require(&missing, "PASSWORD").unwrap_err();
        assert_eq!(err.to_string(), "Missing environment variable: PASSWORD");
    }

    #[test]
    fn test_blog_config_default_tags_by_client() {
        let lookup = lookup_from(&[]);
        let config = BlogConfig::from_lookup(&lookup, "rladies_bot").unwrap();
        assert_eq!(config.base_tags, vec!["rladies", "rstats"]);
        assert!(!config.process_images);
        assert!(config.gen_ai.is_none());
        assert_eq!(config.counter_path, PathBuf::from("metadata/counter.txt"));
    }

    #[test]
    fn test_blog_config_overrides() {
        let lookup = lookup_from(&[
            ("BASE_TAGS", "#pyladies, python"),
            ("PROCESS_IMAGES", "true"),
            ("GEN_AI_SUPPORT", "1"),
            ("GEMINI_API_KEY", "key"),
            ("ARCHIVE_DIRECTORY", "/tmp/archive"),
        ]);
        let config = BlogConfig::from_lookup(&lookup, "whatever").unwrap();

        assert_eq!(config.base_tags, vec!["pyladies", "python"]);
        assert!(config.process_images);
        let gen_ai = config.gen_ai.unwrap();
        assert_eq!(gen_ai.model, DEFAULT_GEMINI_MODEL);
        assert_eq!(config.archive_dir, PathBuf::from("/tmp/archive"));
    }

    #[test]
    fn test_gen_ai_requires_key() {
        let lookup = lookup_from(&[("GEN_AI_SUPPORT", "yes")]);
        assert!(BlogConfig::from_lookup(&lookup, "x").is_err());
    }

    #[test]
    fn test_tag_config() {
        let lookup = lookup_from(&[("TAGS_TO_BOOST", "rladies,#rstats")]);
        let config = TagConfig::from_lookup(&lookup).unwrap();
        assert_eq!(config.tags, vec!["rladies", "rstats"]);

        let empty = lookup_from(&[("TAGS_TO_BOOST", " , ")]);
        assert!(TagConfig::from_lookup(&empty).is_err());
    }

    #[test]
    fn test_anniversary_config_trims_base_url() {
        let lookup = lookup_from(&[("ANNIVERSARY_IMAGE_BASE_URL", "https://img.example/women/")]);
        let config = AnniversaryConfig::from_lookup(&lookup);
        assert_eq!(config.image_base_url, "https://img.example/women");
        assert_eq!(config.events_path, PathBuf::from("metadata/events.json"));
    }

    #[test]
    fn test_metadata_config_requires_urls() {
        let lookup = lookup_from(&[("BASE_URL", "https://github.com/x/y/tree/main/blogs")]);
        assert!(MetadataConfig::from_lookup(&lookup).is_err());
    }
}
