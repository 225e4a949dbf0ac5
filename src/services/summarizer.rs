use reqwest::blocking::Client;
use scraper::Html;
use serde::{Deserialize, Serialize};

use crate::config::GenAiConfig;
use crate::errors::{BotError, BotResult};

const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";
const MAX_INPUT_WORDS: usize = 700;
const SAFE_PROBABILITY: &str = "NEGLIGIBLE";

const PROMPT: [&str; 3] = [
    "Summarize the content of the post in maximum 60 characters.",
    "Be as concise as possible and be engaging.",
    "Don't repeat the title.",
];

#[cfg_attr(test, mockall::automock)]
pub trait Summarizer {
    /// Short teaser for a post; `None` when the model's answer is not safe to publish
    fn summarize(&self, title: &str, summary: &str) -> BotResult<Option<String>>;
}

#[derive(Debug, Serialize)]
struct GenerateRequest {
    contents: Vec<Content>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<Content>,
    #[serde(default)]
    safety_ratings: Vec<SafetyRating>,
}

#[derive(Debug, Deserialize)]
struct SafetyRating {
    probability: String,
}

/// Gemini `generateContent` over plain REST
pub struct GeminiSummarizer {
    client: Client,
    api_key: String,
    model: String,
}

impl GeminiSummarizer {
    pub fn new(config: &GenAiConfig) -> Self {
        Self {
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(60))
                .build()
                .unwrap_or_else(|_| Client::new()),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
        }
    }
}

impl Summarizer for GeminiSummarizer {
    fn summarize(&self, title: &str, summary: &str) -> BotResult<Option<String>> {
        let request = GenerateRequest {
            contents: vec![Content {
                parts: PROMPT
                    .iter()
                    .map(|p| p.to_string())
                    .chain(std::iter::once(text_to_summarize(title, summary)))
                    .map(|text| Part { text })
                    .collect(),
            }],
        };

        let url = format!("{}/models/{}:generateContent", GEMINI_API_BASE, self.model);
        let response = self
            .client
            .post(url)
            .header("x-goog-api-key", &self.api_key)
            .json(&request)
            .send()?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().unwrap_or_default();
            return Err(BotError::Summary(format!("HTTP {}: {}", status, body)));
        }

        let body: GenerateResponse = response.json()?;
        Ok(safe_text(body))
    }
}

/// `Title: ..\nSummary: ..` with HTML stripped, cut to the first 700 words
pub fn text_to_summarize(title: &str, summary: &str) -> String {
    let summary = Html::parse_fragment(summary)
        .root_element()
        .text()
        .collect::<Vec<_>>()
        .join(" ");
    let text = format!("Title: {}\nSummary: {}", title, summary);

    if text.split_whitespace().count() > MAX_INPUT_WORDS {
        text.split_whitespace()
            .take(MAX_INPUT_WORDS)
            .collect::<Vec<_>>()
            .join(" ")
    } else {
        text
    }
}

fn safe_text(response: GenerateResponse) -> Option<String> {
    let candidate = response.candidates.into_iter().next()?;

    if !candidate
        .safety_ratings
        .iter()
        .all(|rating| rating.probability == SAFE_PROBABILITY)
    {
        tracing::warn!("Summary rejected by safety ratings");
        return None;
    }

    let text: String = candidate
        .content?
        .parts
        .into_iter()
        .map(|p| p.text)
        .collect::<Vec<_>>()
        .join(" ");
    let cleaned = text.split_whitespace().collect::<Vec<_>>().join(" ");

    (!cleaned.is_empty()).then_some(cleaned)
}
