pub mod blog_directory;
pub mod images;
pub mod rss;
pub mod traits;

pub use blog_directory::BlogDirectory;
pub use images::{ImageCache, ImageLayout};
pub use rss::RssFetcher;
pub use traits::FeedFetcher;
