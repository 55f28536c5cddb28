//! Template-driven upload metadata generation.

use async_trait::async_trait;
use reelsmith_core::{MAX_TAGS, Script, SourceItem, VideoMetadata};
use reelsmith_error::ReelsmithResult;
use reelsmith_interface::MetadataWriter;

/// Hashtag sets keyed by story category.
const HASHTAG_TEMPLATES: &[(&str, &[&str])] = &[
    ("aita", &["#AITA", "#AmItheAsshole", "#RedditStories", "#Drama"]),
    ("askreddit", &["#AskReddit", "#RedditStories", "#Stories", "#Viral"]),
    ("confession", &["#Confession", "#TrueStory", "#RedditStories", "#Storytime"]),
    ("relationship", &["#RelationshipAdvice", "#Dating", "#RedditStories", "#Drama"]),
    ("tifu", &["#TIFU", "#Fail", "#RedditStories", "#Funny"]),
    ("revenge", &["#Revenge", "#PettyRevenge", "#ProRevenge", "#RedditStories"]),
];

const DEFAULT_HASHTAGS: &[&str] = &["#RedditStories", "#Storytime", "#Viral", "#Shorts"];

/// Generates titles, descriptions, tags, and hashtags from fixed templates
/// keyed by the source community.
#[derive(Debug, Clone, Default)]
pub struct TemplateMetadataWriter;

impl TemplateMetadataWriter {
    /// Create the writer.
    pub fn new() -> Self {
        Self
    }

    fn title(item: &SourceItem) -> String {
        let community = item.community.to_lowercase();
        let original = item.title.trim();
        let lowered = original.to_lowercase();

        let title = if community.contains("aita") && !lowered.starts_with("aita") {
            format!("AITA for {}", truncate_chars(original, 60))
        } else if community.contains("tifu") && !lowered.starts_with("tifu") {
            format!("TIFU by {}", truncate_chars(original, 60))
        } else {
            original.to_string()
        };
        truncate_chars(&title, 70)
    }

    fn description(item: &SourceItem) -> String {
        format!(
            "{title}\n\n\
             Story sourced from r/{community}\n\n\
             Stories are sourced from public online forums and rewritten for \
             entertainment purposes.\n\n\
             What do you think? Let us know in the comments!\n\n\
             DISCLAIMER: Stories are sourced from public online forums and \
             rewritten for entertainment. All identifying information has been \
             removed or altered. This content is for entertainment purposes only.",
            title = item.title.trim(),
            community = item.community,
        )
    }

    fn hashtags(item: &SourceItem) -> Vec<String> {
        let community = item.community.to_lowercase();
        let template = HASHTAG_TEMPLATES
            .iter()
            .find(|(category, _)| community.contains(category))
            .map(|(_, tags)| *tags)
            .unwrap_or(DEFAULT_HASHTAGS);

        let mut hashtags: Vec<String> = template.iter().map(|t| t.to_string()).collect();
        hashtags.push(format!("#{}", community));
        hashtags.truncate(10);
        hashtags
    }

    fn tags(item: &SourceItem) -> Vec<String> {
        let mut tags: Vec<String> = [
            "reddit stories",
            "reddit reads",
            "storytime",
            "shorts",
            "viral",
            "story",
            "drama",
            "entertainment",
        ]
        .iter()
        .map(|t| t.to_string())
        .collect();
        tags.push(item.community.to_lowercase());

        // Longer title words make decent search tags.
        tags.extend(
            item.title
                .to_lowercase()
                .split_whitespace()
                .filter(|w| w.len() > 4)
                .take(5)
                .map(|w| w.to_string()),
        );

        let mut seen = std::collections::HashSet::new();
        tags.retain(|t| seen.insert(t.clone()));
        tags.truncate(MAX_TAGS);
        tags
    }
}

#[async_trait]
impl MetadataWriter for TemplateMetadataWriter {
    async fn generate(&self, item: &SourceItem, _script: &Script) -> ReelsmithResult<VideoMetadata> {
        Ok(VideoMetadata {
            title: Self::title(item),
            description: Self::description(item),
            tags: Self::tags(item),
            hashtags: Self::hashtags(item),
        })
    }
}

/// Truncate to at most `max` characters on a char boundary.
fn truncate_chars(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}
