//! Upload metadata for generated videos.

use serde::{Deserialize, Serialize};

/// Remote title limit in characters.
pub const MAX_TITLE_CHARS: usize = 100;
/// Remote description limit in characters.
pub const MAX_DESCRIPTION_CHARS: usize = 5000;
/// Remote tag count limit.
pub const MAX_TAGS: usize = 15;

/// Title, description, tags, and hashtags for one video.
///
/// # Examples
///
/// ```
/// use reelsmith_core::{VideoMetadata, MAX_TAGS};
///
/// let meta = VideoMetadata {
///     title: "A short story".to_string(),
///     description: "From the community".to_string(),
///     tags: vec!["stories".to_string()],
///     hashtags: vec!["#Shorts".to_string()],
/// };
/// let clamped = meta.clamped_for_upload();
/// assert!(clamped.tags.len() <= MAX_TAGS);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoMetadata {
    /// Video title
    pub title: String,
    /// Video description
    pub description: String,
    /// Search tags
    pub tags: Vec<String>,
    /// Hashtags appended to the description
    pub hashtags: Vec<String>,
}

impl VideoMetadata {
    /// A copy clamped to the remote platform's limits.
    ///
    /// Titles cap at 100 characters, descriptions at 5000, tags at 15;
    /// hashtags fold into the description when not already present.
    pub fn clamped_for_upload(&self) -> Self {
        let mut description = self.description.clone();
        if !self.hashtags.is_empty() && !description.contains(&self.hashtags[0]) {
            description.push_str("\n\n");
            description.push_str(&self.hashtags.join(" "));
        }
        Self {
            title: truncate_chars(&self.title, MAX_TITLE_CHARS),
            description: truncate_chars(&description, MAX_DESCRIPTION_CHARS),
            tags: self.tags.iter().take(MAX_TAGS).cloned().collect(),
            hashtags: self.hashtags.clone(),
        }
    }
}

fn truncate_chars(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}
