pub mod files;
pub mod traits;

pub use files::{JsonArchiveStore, MetadataFile, TextCursorStore};
pub use traits::{ArchiveStore, CursorStore};
