use std::fs;
use std::path::{Path, PathBuf};

use reqwest::blocking::Client;
use reqwest::header::USER_AGENT;
use url::Url;

use crate::errors::{BotError, BotResult};

const BROWSER_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 6.1; WOW64; rv:20.0) Gecko/20100101 Firefox/20.0";

/// How downloaded images are laid out below the cache directory
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageLayout {
    /// `<dir>/<file name>`
    Flat,
    /// `<dir>/<host>/<url path>`
    ByHost,
}

/// Downloads images once and reuses the local copy on later runs
pub struct ImageCache {
    client: Client,
    dir: PathBuf,
    layout: ImageLayout,
}

impl ImageCache {
    pub fn new<P: Into<PathBuf>>(dir: P, layout: ImageLayout) -> Self {
        Self {
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(15))
                .build()
                .unwrap_or_else(|_| Client::new()),
            dir: dir.into(),
            layout,
        }
    }

    /// Local path the image at `url` is (or will be) stored at
    pub fn local_path(&self, url: &str) -> BotResult<PathBuf> {
        let parsed = Url::parse(url).map_err(|e| BotError::InvalidUrl(format!("{}: {}", url, e)))?;

        // Dot segments are dropped so a URL cannot escape the cache directory
        let segments: Vec<&str> = parsed
            .path_segments()
            .map(|segments| {
                segments
                    .filter(|s| !s.is_empty() && *s != "." && *s != "..")
                    .collect()
            })
            .unwrap_or_default();

        let file_name = parsed
            .path_segments()
            .and_then(|mut segments| segments.next_back())
            .filter(|name| !name.is_empty())
            .ok_or_else(|| BotError::InvalidUrl(format!("{}: no file name", url)))?;

        let path = match self.layout {
            ImageLayout::Flat => self.dir.join(file_name),
            ImageLayout::ByHost => segments.iter().fold(
                self.dir.join(parsed.host_str().unwrap_or("unknown-host")),
                |path, segment| path.join(segment),
            ),
        };

        Ok(path)
    }

    pub fn fetch(&self, url: &str) -> BotResult<PathBuf> {
        let path = self.local_path(url)?;

        if path.is_file() {
            tracing::info!(path = %path.display(), "Image already downloaded");
            return Ok(path);
        }

        tracing::info!(url, "Downloading image");
        let response = self
            .client
            .get(url)
            .header(USER_AGENT, BROWSER_USER_AGENT)
            .send()?
            .error_for_status()?;
        let bytes = response.bytes()?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, &bytes)?;

        tracing::info!(path = %path.display(), "Image downloaded");
        Ok(path)
    }
}

/// MIME type guessed from the file extension, for blob uploads
pub fn mime_type(path: &Path) -> &'static str {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase());

    match extension.as_deref() {
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        _ => "image/jpeg",
    }
}
