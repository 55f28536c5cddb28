//! Source items, scripts, and narration timing.

use serde::{Deserialize, Serialize};

/// A candidate story returned by the story source collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceItem {
    /// Stable identifier within the source platform
    pub id: String,
    /// Story title
    pub title: String,
    /// Story body text
    pub body: String,
    /// Author handle
    pub author: String,
    /// Community score (upvotes)
    pub score: i64,
    /// Community the story came from
    pub community: String,
    /// Canonical URL
    pub url: String,
}

impl SourceItem {
    /// Word count of the story body.
    pub fn word_count(&self) -> usize {
        self.body.split_whitespace().count()
    }
}

/// Filter criteria applied when fetching candidates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceFilters {
    /// Minimum community score
    pub min_score: i64,
    /// Minimum body word count
    pub min_words: usize,
    /// Maximum body word count
    pub max_words: usize,
    /// Maximum body length in characters
    pub max_chars: usize,
}

impl SourceFilters {
    /// Whether a candidate passes all filters.
    pub fn accepts(&self, item: &SourceItem) -> bool {
        let words = item.word_count();
        item.score >= self.min_score
            && !item.body.is_empty()
            && item.body.len() <= self.max_chars
            && words >= self.min_words
            && words <= self.max_words
    }
}

/// A narration script produced by the rewrite collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Script {
    /// Full narration text, title included
    pub text: String,
    /// Estimated narration duration in seconds
    pub estimated_duration_secs: u32,
    /// Title of the original item
    pub original_title: String,
    /// Author of the original item
    pub original_author: String,
}

impl Script {
    /// Word count of the narration text.
    pub fn word_count(&self) -> usize {
        self.text.split_whitespace().count()
    }
}

/// Timing of one spoken word within the narration audio.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WordTiming {
    /// The spoken word
    pub word: String,
    /// Start offset in seconds
    pub start_secs: f64,
    /// End offset in seconds
    pub end_secs: f64,
}
