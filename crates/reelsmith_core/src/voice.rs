//! Narration voice selection.

use crate::VoiceSettings;
use rand::seq::SliceRandom;

/// The voice chosen for one narration run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoiceSelection(pub String);

impl VoiceSelection {
    /// Pick a voice according to the configured policy.
    ///
    /// A forced voice always wins; otherwise a random pick from the list when
    /// randomization is on, else the first configured voice. Falls back to a
    /// neutral default when the list is empty.
    pub fn choose(settings: &VoiceSettings) -> Self {
        if let Some(forced) = &settings.forced {
            return Self(forced.clone());
        }
        if settings.randomize {
            if let Some(v) = settings.voices.choose(&mut rand::thread_rng()) {
                return Self(v.clone());
            }
        }
        Self(
            settings
                .voices
                .first()
                .cloned()
                .unwrap_or_else(|| "en-US-AriaNeural".to_string()),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_forced_voice_wins() {
        let settings = VoiceSettings {
            forced: Some("en-GB-RyanNeural".to_string()),
            voices: vec!["en-US-AriaNeural".to_string()],
            randomize: true,
        };
        assert_eq!(
            VoiceSelection::choose(&settings).0,
            "en-GB-RyanNeural".to_string()
        );
    }

    #[test]
    fn test_random_pick_stays_in_list() {
        let settings = VoiceSettings {
            forced: None,
            voices: vec!["a".to_string(), "b".to_string(), "c".to_string()],
            randomize: true,
        };
        for _ in 0..20 {
            let picked = VoiceSelection::choose(&settings).0;
            assert!(settings.voices.contains(&picked));
        }
    }

    #[test]
    fn test_empty_list_falls_back() {
        let settings = VoiceSettings {
            forced: None,
            voices: vec![],
            randomize: false,
        };
        assert_eq!(VoiceSelection::choose(&settings).0, "en-US-AriaNeural");
    }
}
