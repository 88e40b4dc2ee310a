//! Content module - raw documents, rich text and the post view models

mod document;
mod post;
pub mod reading_time;
pub mod rich_text;

pub use document::{parse_date, RawContentBlock, RawDocument};
pub use post::{
    transform_detail, transform_listing, ContentSection, Listing, PostDetail, PostSummary,
};
pub use reading_time::{estimate_reading_time, ReadingTimeMode, WORDS_PER_MINUTE};
pub use rich_text::RichTextNode;
