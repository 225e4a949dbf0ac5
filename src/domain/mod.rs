pub mod archive;
pub mod entry;
pub mod event;
pub mod feed;
pub mod post;

pub use archive::FeedArchive;
pub use entry::{parse_pub_date, Media, PostEntry};
pub use event::AnniversaryEvent;
pub use feed::FeedDescriptor;
pub use post::{Attachment, FacetKind, LinkCard, PostText, TextFacet};
