//! Default script preparation: narrate the story as posted.

use async_trait::async_trait;
use reelsmith_core::{Script, SourceItem};
use reelsmith_error::ReelsmithResult;
use reelsmith_interface::ScriptRewriter;

/// Average narration pace used to estimate duration from word count.
const WORDS_PER_SECOND: f64 = 2.5;

/// Produces the narration script by prepending the title to the story body,
/// so the narrator reads the hook first.
///
/// This is the no-model rewriter; it needs no credential key. An LLM-backed
/// rewriter slots in behind the same trait.
#[derive(Debug, Clone, Default)]
pub struct TitleFirstRewriter;

impl TitleFirstRewriter {
    /// Create the rewriter.
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ScriptRewriter for TitleFirstRewriter {
    async fn rewrite(&self, item: &SourceItem, _key: &str) -> ReelsmithResult<Script> {
        let text = format!("{}. {}", item.title.trim(), item.body.trim());
        let words = text.split_whitespace().count();
        Ok(Script {
            estimated_duration_secs: (words as f64 / WORDS_PER_SECOND) as u32,
            original_title: item.title.clone(),
            original_author: item.author.clone(),
            text,
        })
    }
}
