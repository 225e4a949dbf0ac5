pub mod anniversary_service;
pub mod blog_service;
pub mod boost_service;
pub mod feed_walker;
pub mod metadata_service;
pub mod summarizer;

pub use anniversary_service::{check_events, AnniversaryReport, AnniversaryService, LengthIssue};
pub use blog_service::BlogService;
pub use boost_service::BoostService;
pub use feed_walker::{FeedWalker, WalkLimits, WalkReport};
pub use metadata_service::MetadataService;
pub use summarizer::{GeminiSummarizer, Summarizer};
