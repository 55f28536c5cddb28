//! Layered configuration for the Reelsmith scheduler.
//!
//! Configuration sources in order of precedence (later overrides earlier):
//! 1. Bundled defaults (`reelsmith.toml` shipped with the crate)
//! 2. User config in the current directory (`./reelsmith.toml`)
//! 3. `REELSMITH__*` environment variables (`__` as section separator)
//!
//! Credential keys additionally merge from the `GEMINI_API_KEY` environment
//! variable as a comma-separated list, deduplicated preserving order.

use config::{Config, Environment, File, FileFormat};
use reelsmith_error::{ConfigError, ReelsmithResult};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::PathBuf;
use tracing::{debug, instrument};

/// Privacy status applied to uploaded videos.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default, strum::Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum PrivacyStatus {
    /// Visible only to the channel owner
    #[default]
    Private,
    /// Reachable by link, not listed
    Unlisted,
    /// Publicly listed
    Public,
}

/// Story source filter and community settings.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct SourceSettings {
    /// Communities eligible for sourcing
    pub communities: Vec<String>,
    /// Minimum community score
    pub min_score: i64,
    /// Minimum story word count
    pub min_words: usize,
    /// Maximum story word count
    pub max_words: usize,
    /// Maximum story length in characters
    pub max_chars: usize,
}

/// Generation budget and retry settings.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct GenerationSettings {
    /// Units to aim for in each daily pack
    pub target_pack_size: usize,
    /// Hard cap on generation attempts per day
    pub daily_budget: u32,
    /// Consecutive failures that abort generation for the day
    pub max_consecutive_failures: u32,
    /// Candidate stories tried per unit before giving up
    pub candidate_attempts: u32,
    /// Key rotations allowed per provider call
    pub key_rotations: u32,
    /// Bounded wait for each external call, in seconds
    pub call_timeout_secs: u64,
}

/// Delivery pacing and retry settings.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct DeliverySettings {
    /// Horizon over which a pack's uploads are spread, in hours
    pub horizon_hours: u32,
    /// Scheduler cycle period, in minutes
    pub cycle_minutes: u64,
    /// Upload attempt cap per unit; 0 means retry until evicted
    pub max_upload_attempts: u32,
    /// Privacy status for uploads
    pub privacy: PrivacyStatus,
    /// Number of most recent packs retained on disk
    pub max_packs: usize,
}

/// Narration voice settings.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct VoiceSettings {
    /// Voice forced for every narration, when set
    #[serde(default)]
    pub forced: Option<String>,
    /// Voices eligible for selection
    pub voices: Vec<String>,
    /// Pick a random voice per narration
    pub randomize: bool,
}

/// Compliance policy settings.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ComplianceSettings {
    /// Fail flagged units instead of annotating them
    pub blocking: bool,
}

/// Top-level Reelsmith configuration.
///
/// # Example
///
/// ```no_run
/// use reelsmith_core::Settings;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let settings = Settings::load()?;
/// settings.validate()?;
/// println!("state root: {}", settings.state_dir.display());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Settings {
    /// Root directory for packs, the duplicate guard, and unit artifacts
    pub state_dir: PathBuf,
    /// Generation provider credential keys
    #[serde(default)]
    pub keys: Vec<String>,
    /// Story source settings
    pub source: SourceSettings,
    /// Generation settings
    pub generation: GenerationSettings,
    /// Delivery settings
    pub delivery: DeliverySettings,
    /// Voice settings
    pub voice: VoiceSettings,
    /// Compliance settings
    pub compliance: ComplianceSettings,
}

impl Settings {
    /// Load configuration with precedence: env > current dir > bundled defaults.
    #[instrument]
    pub fn load() -> ReelsmithResult<Self> {
        debug!("Loading configuration");

        // Bundled default configuration
        const DEFAULT_CONFIG: &str = include_str!("../reelsmith.toml");

        let mut settings: Settings = Config::builder()
            .add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Toml))
            .add_source(File::with_name("reelsmith").required(false))
            .add_source(Environment::with_prefix("REELSMITH").separator("__"))
            .build()
            .map_err(|e| ConfigError::new(format!("Failed to build configuration: {}", e)))?
            .try_deserialize()
            .map_err(|e| ConfigError::new(format!("Failed to parse configuration: {}", e)))?;

        // Credential keys also come from the conventional env variable,
        // comma-separated, merged after the config sources.
        if let Ok(raw) = std::env::var("GEMINI_API_KEY") {
            settings
                .keys
                .extend(raw.split(',').map(str::trim).filter(|k| !k.is_empty()).map(String::from));
        }
        settings.dedup_keys();

        Ok(settings)
    }

    /// Startup validation; the only fatal error path in the system.
    ///
    /// # Errors
    ///
    /// Returns a configuration error when no credential keys are configured,
    /// the pack size is zero, or the delivery horizon is empty.
    pub fn validate(&self) -> ReelsmithResult<()> {
        if self.keys.is_empty() {
            Err(ConfigError::new(
                "No credential keys configured. Set GEMINI_API_KEY or the keys list in reelsmith.toml",
            ))?;
        }
        if self.generation.target_pack_size == 0 {
            Err(ConfigError::new("generation.target_pack_size must be at least 1"))?;
        }
        if self.delivery.horizon_hours == 0 {
            Err(ConfigError::new("delivery.horizon_hours must be at least 1"))?;
        }
        if self.delivery.max_packs == 0 {
            Err(ConfigError::new("delivery.max_packs must be at least 1"))?;
        }
        Ok(())
    }

    /// Filters derived from the source settings.
    pub fn source_filters(&self) -> crate::SourceFilters {
        crate::SourceFilters {
            min_score: self.source.min_score,
            min_words: self.source.min_words,
            max_words: self.source.max_words,
            max_chars: self.source.max_chars,
        }
    }

    fn dedup_keys(&mut self) {
        let mut seen = HashSet::new();
        self.keys.retain(|k| seen.insert(k.clone()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_settings() -> Settings {
        Settings {
            state_dir: PathBuf::from("state"),
            keys: vec!["k1".to_string(), "k2".to_string(), "k1".to_string()],
            source: SourceSettings {
                communities: vec!["stories".to_string()],
                min_score: 100,
                min_words: 400,
                max_words: 600,
                max_chars: 5000,
            },
            generation: GenerationSettings {
                target_pack_size: 5,
                daily_budget: 8,
                max_consecutive_failures: 3,
                candidate_attempts: 3,
                key_rotations: 3,
                call_timeout_secs: 120,
            },
            delivery: DeliverySettings {
                horizon_hours: 24,
                cycle_minutes: 5,
                max_upload_attempts: 0,
                privacy: PrivacyStatus::Private,
                max_packs: 3,
            },
            voice: VoiceSettings {
                forced: None,
                voices: vec!["en-US-AriaNeural".to_string()],
                randomize: false,
            },
            compliance: ComplianceSettings { blocking: false },
        }
    }

    #[test]
    fn test_dedup_keys_preserves_order() {
        let mut settings = base_settings();
        settings.dedup_keys();
        assert_eq!(settings.keys, vec!["k1".to_string(), "k2".to_string()]);
    }

    #[test]
    fn test_validate_requires_keys() {
        let mut settings = base_settings();
        settings.keys.clear();
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_env_overrides_bundled_default() {
        // set_var is process-global; no other test touches these variables.
        unsafe {
            std::env::set_var("REELSMITH__DELIVERY__MAX_PACKS", "7");
            std::env::set_var("REELSMITH__GENERATION__DAILY_BUDGET", "2");
        }
        let settings = Settings::load().unwrap();
        unsafe {
            std::env::remove_var("REELSMITH__DELIVERY__MAX_PACKS");
            std::env::remove_var("REELSMITH__GENERATION__DAILY_BUDGET");
        }

        assert_eq!(settings.delivery.max_packs, 7);
        assert_eq!(settings.generation.daily_budget, 2);
        // Untouched sections keep their bundled defaults.
        assert_eq!(settings.delivery.horizon_hours, 24);
    }

    #[test]
    fn test_bundled_defaults_parse() {
        const DEFAULT_CONFIG: &str = include_str!("../reelsmith.toml");
        let settings: Settings = Config::builder()
            .add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();
        assert_eq!(settings.delivery.max_packs, 3);
        assert_eq!(settings.delivery.horizon_hours, 24);
        assert!(settings.generation.target_pack_size >= 1);
    }
}
