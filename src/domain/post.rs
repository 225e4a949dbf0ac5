use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FacetKind {
    Mention { did: String },
    Link { uri: String },
    Tag { tag: String },
}

/// Rich-text annotation over the UTF-8 byte range `start..end` of the text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextFacet {
    pub start: usize,
    pub end: usize,
    pub kind: FacetKind,
}

/// Post body built piece by piece; Mastodon reads the text, Bluesky also the facets
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PostText {
    text: String,
    facets: Vec<TextFacet>,
}

impl PostText {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(&mut self, text: &str) -> &mut Self {
        self.text.push_str(text);
        self
    }

    fn annotated(&mut self, display: &str, kind: FacetKind) -> &mut Self {
        let start = self.text.len();
        self.text.push_str(display);
        self.facets.push(TextFacet {
            start,
            end: self.text.len(),
            kind,
        });
        self
    }

    pub fn mention(&mut self, display: &str, did: &str) -> &mut Self {
        self.annotated(display, FacetKind::Mention { did: did.to_string() })
    }

    pub fn link(&mut self, display: &str, uri: &str) -> &mut Self {
        self.annotated(display, FacetKind::Link { uri: uri.to_string() })
    }

    /// Append `display` (usually `#tag`) annotated as hashtag `tag`
    pub fn tag(&mut self, display: &str, tag: &str) -> &mut Self {
        self.annotated(display, FacetKind::Tag { tag: tag.to_string() })
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn facets(&self) -> &[TextFacet] {
        &self.facets
    }

    pub fn char_count(&self) -> usize {
        self.text.chars().count()
    }
}

impl std::fmt::Display for PostText {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.text)
    }
}

/// Link preview card; Bluesky renders it as an external embed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkCard {
    pub uri: String,
    pub title: String,
    pub description: String,
}

/// Downloaded image to publish alongside a post
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    pub image_path: PathBuf,
    pub alt: Option<String>,
    pub card: LinkCard,
}
