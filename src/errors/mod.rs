use thiserror::Error;

#[derive(Error, Debug)]
pub enum BotError {
    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Unsupported platform: {0}")]
    UnsupportedPlatform(String),

    // Feed errors
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    // Network errors
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    // Platform errors from the social_clients library
    #[error("Platform client error: {0}")]
    Client(#[from] social_clients::ClientError),

    // Summaries
    #[error("Summary generation failed: {0}")]
    Summary(String),

    // Storage / parsing errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Metadata parsing failed: {0}")]
    Metadata(String),

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Why a single feed could not be read this run
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("feed {url} unreachable: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("feed {url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("feed {url} could not be parsed: {reason}")]
    Parse { url: String, reason: String },

    #[error("feed {0} has no source URLs")]
    NoSources(String),
}

pub type BotResult<T> = Result<T, BotError>;
