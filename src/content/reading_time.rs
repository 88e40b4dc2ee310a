//! Reading-time estimation

use super::rich_text::{self, RichTextNode};
use crate::config::ReadingTimeSetting;
use crate::helpers::strip_html;

/// Assumed reading speed
pub const WORDS_PER_MINUTE: usize = 200;

/// How words are counted in a block's rendered HTML
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReadingTimeMode {
    /// Split the raw HTML on single spaces; markup inflates the count
    #[default]
    Markup,
    /// Strip tags first and count whitespace-separated words
    Text,
}

impl From<ReadingTimeSetting> for ReadingTimeMode {
    fn from(setting: ReadingTimeSetting) -> Self {
        match setting {
            ReadingTimeSetting::Markup => ReadingTimeMode::Markup,
            ReadingTimeSetting::Text => ReadingTimeMode::Text,
        }
    }
}

impl ReadingTimeMode {
    /// Count the words of one block's HTML
    pub fn count_words(self, html: &str) -> usize {
        match self {
            // Like a JavaScript `split(' ')`: an empty string is one token
            ReadingTimeMode::Markup => html.split(' ').count(),
            ReadingTimeMode::Text => strip_html(html).split_whitespace().count(),
        }
    }
}

/// Estimate reading minutes for a sequence of content-block bodies
///
/// Returns `ceil(words / 200)`; no blocks at all yields 0.
pub fn estimate_reading_time<'a, I>(bodies: I, mode: ReadingTimeMode) -> usize
where
    I: IntoIterator<Item = &'a [RichTextNode]>,
{
    let words: usize = bodies
        .into_iter()
        .map(|body| mode.count_words(&rich_text::as_html(body)))
        .sum();

    words.div_ceil(WORDS_PER_MINUTE)
}
