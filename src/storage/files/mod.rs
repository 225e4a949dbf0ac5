mod archive;
mod cursor;
mod metadata;

pub use archive::{JsonArchiveStore, ARCHIVE_FILE_NAME};
pub use cursor::TextCursorStore;
pub use metadata::{load_events, MetadataFile};
