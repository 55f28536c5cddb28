//! Daily packs and upload slot timetables.

use crate::ContentUnit;
use chrono::{DateTime, Duration, NaiveDate, Utc};
use reelsmith_error::{ReelsmithResult, StorageError, StorageErrorKind};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable date identifier for a pack, formatted `YYYYMMDD` (UTC).
///
/// One pack exists per calendar day; the key doubles as the pack's directory
/// name on disk.
///
/// # Examples
///
/// ```
/// use reelsmith_core::PackDateKey;
/// use chrono::NaiveDate;
///
/// let key = PackDateKey::from_date(NaiveDate::from_ymd_opt(2026, 8, 29).unwrap());
/// assert_eq!(key.as_str(), "20260829");
/// assert!(PackDateKey::parse("not-a-date").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PackDateKey(String);

impl PackDateKey {
    /// Key for the current UTC day.
    pub fn today() -> Self {
        Self::from_date(Utc::now().date_naive())
    }

    /// Key for a specific date.
    pub fn from_date(date: NaiveDate) -> Self {
        Self(date.format("%Y%m%d").to_string())
    }

    /// Parse a key from a directory name, rejecting anything that is not a
    /// valid `YYYYMMDD` date.
    pub fn parse(raw: &str) -> ReelsmithResult<Self> {
        let date = NaiveDate::parse_from_str(raw, "%Y%m%d").map_err(|e| {
            StorageError::new(StorageErrorKind::InvalidDateKey(format!("{}: {}", raw, e)))
        })?;
        Ok(Self::from_date(date))
    }

    /// The underlying `YYYYMMDD` string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The calendar date this key identifies.
    pub fn date(&self) -> NaiveDate {
        // Invariant: constructors only accept valid dates.
        NaiveDate::parse_from_str(&self.0, "%Y%m%d").expect("date key holds a valid date")
    }
}

impl std::fmt::Display for PackDateKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// The set of content units generated for one calendar day, delivered
/// together across a 24-hour horizon.
///
/// Unit order is insertion order, which is generation order; the delivery
/// timetable is derived from it and never reordered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pack {
    /// Stable date identifier
    pub date_key: PackDateKey,
    /// Creation timestamp, the origin of the delivery timetable
    pub created_at: DateTime<Utc>,
    /// Units in generation order
    pub units: Vec<ContentUnit>,
    /// Number of generation attempts made for this pack
    pub generation_count: u32,
    /// Number of failed generation attempts
    pub generation_failures: u32,
}

impl Pack {
    /// Create an empty pack for a date, timestamped now.
    pub fn new(date_key: PackDateKey) -> Self {
        Self {
            date_key,
            created_at: Utc::now(),
            units: Vec::new(),
            generation_count: 0,
            generation_failures: 0,
        }
    }

    /// Units that completed generation (deliverable or already uploaded).
    ///
    /// Failed-generation units are excluded from the timetable entirely.
    pub fn generated_units(&self) -> impl Iterator<Item = &ContentUnit> {
        self.units
            .iter()
            .filter(|u| !matches!(u.status, crate::UnitStatus::Failed { .. }))
            .filter(|u| !matches!(u.status, crate::UnitStatus::Pending))
    }

    /// Find a unit by id.
    pub fn unit_mut(&mut self, id: Uuid) -> Option<&mut ContentUnit> {
        self.units.iter_mut().find(|u| u.id == id)
    }

    /// Whether every generated unit reached a terminal delivery state.
    pub fn delivery_complete(&self) -> bool {
        self.generated_units()
            .all(|u| matches!(u.status, crate::UnitStatus::Uploaded | crate::UnitStatus::Abandoned { .. }))
    }
}

/// Computed target time and retry state for delivering one content unit.
///
/// Slots are recomputed each cycle from pack order and unit status; they are
/// not persisted beyond what the unit itself records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadSlot {
    /// Pack the slot belongs to
    pub pack_date_key: PackDateKey,
    /// Unit the slot delivers
    pub content_unit_id: Uuid,
    /// Target dispatch time; fixed at pack creation, never rescheduled
    pub target_time: DateTime<Utc>,
    /// Number of dispatch attempts so far
    pub attempt_count: u32,
    /// Last dispatch error, if any
    pub last_error: Option<String>,
}

/// Evenly distribute `n` slots across a horizon starting at `origin`.
///
/// Slot `i` targets `origin + i * (horizon / n)`. The first slot is due
/// immediately at the origin.
///
/// # Examples
///
/// ```
/// use reelsmith_core::slot_targets;
/// use chrono::{Duration, Utc};
///
/// let origin = Utc::now();
/// let targets = slot_targets(origin, 4, Duration::hours(24));
/// assert_eq!(targets.len(), 4);
/// assert_eq!(targets[0], origin);
/// assert_eq!(targets[2], origin + Duration::hours(12));
/// ```
pub fn slot_targets(origin: DateTime<Utc>, n: usize, horizon: Duration) -> Vec<DateTime<Utc>> {
    if n == 0 {
        return Vec::new();
    }
    let step_secs = horizon.num_seconds() / n as i64;
    (0..n)
        .map(|i| origin + Duration::seconds(step_secs * i as i64))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_slot_targets_even_spacing() {
        let origin = Utc::now();
        let targets = slot_targets(origin, 4, Duration::hours(24));
        assert_eq!(
            targets,
            vec![
                origin,
                origin + Duration::hours(6),
                origin + Duration::hours(12),
                origin + Duration::hours(18),
            ]
        );
    }

    #[test]
    fn test_slot_targets_single_and_empty() {
        let origin = Utc::now();
        assert_eq!(slot_targets(origin, 1, Duration::hours(24)), vec![origin]);
        assert!(slot_targets(origin, 0, Duration::hours(24)).is_empty());
    }

    #[test]
    fn test_date_key_round_trip() {
        let key = PackDateKey::parse("20260829").unwrap();
        assert_eq!(key.as_str(), "20260829");
        assert_eq!(key, PackDateKey::from_date(key.date()));
    }

    #[test]
    fn test_date_key_rejects_garbage() {
        assert!(PackDateKey::parse("2026-08-29").is_err());
        assert!(PackDateKey::parse("manifest.json").is_err());
    }

    #[test]
    fn test_pack_generated_units_skip_failures() {
        let mut pack = Pack::new(PackDateKey::today());
        let mut good = ContentUnit::new("a".to_string());
        good.mark_generated();
        let mut bad = ContentUnit::new("b".to_string());
        bad.mark_failed(crate::Stage::Narrate, "tts down");
        pack.units.push(good);
        pack.units.push(bad);

        assert_eq!(pack.generated_units().count(), 1);
    }

    #[test]
    fn test_delivery_complete_requires_terminal_states() {
        let mut pack = Pack::new(PackDateKey::today());
        let mut uploaded = ContentUnit::new("a".to_string());
        uploaded.mark_generated();
        assert!(uploaded.mark_uploaded("vid1".to_string(), None));
        let mut abandoned = ContentUnit::new("b".to_string());
        abandoned.mark_generated();
        abandoned.mark_abandoned("cap reached");
        let mut pending_delivery = ContentUnit::new("c".to_string());
        pending_delivery.mark_generated();

        pack.units.push(uploaded);
        pack.units.push(abandoned);
        assert!(pack.delivery_complete());

        pack.units.push(pending_delivery);
        assert!(!pack.delivery_complete());
    }
}
