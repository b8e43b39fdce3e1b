use serde::Deserialize;
use std::collections::BTreeSet;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use super::constants::*;
use super::error::SchemeError;

/// The subset of an LHC injection scheme JSON that we care about.
/// Colliding bunches at IP1/5 are given as RF bucket numbers (1-based).
#[derive(Debug, Deserialize)]
struct InjectionScheme {
    #[serde(rename = "collsIP1/5")]
    collisions: Option<Vec<u32>>,
}

/// The set of BX slots which hold a colliding bunch pair for a given filling scheme.
///
/// The schedule is computed once, before any output is written, and handed to the
/// writer explicitly. Slots are kept sorted and unique.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CollidingBunches {
    slots: BTreeSet<u32>,
}

impl CollidingBunches {
    /// Build a schedule from BX slot numbers directly
    pub fn from_slots<I: IntoIterator<Item = u32>>(slots: I) -> Self {
        Self {
            slots: slots.into_iter().collect(),
        }
    }

    /// Build a schedule from RF bucket numbers, as listed in the injection schemes.
    ///
    /// A BX spans 10 RF buckets, so bucket `b` lands in BX `(b - 1) / 10 + 1`.
    pub fn from_rf_buckets<I: IntoIterator<Item = u32>>(buckets: I) -> Result<Self, SchemeError> {
        let mut slots = BTreeSet::new();
        for bucket in buckets {
            if bucket == 0 {
                return Err(SchemeError::InvalidBucket(bucket));
            }
            slots.insert((bucket - 1) / RF_BUCKETS_PER_BX + 1);
        }
        Ok(Self { slots })
    }

    /// Read a previously fetched injection scheme JSON file
    pub fn from_scheme_file(path: &Path) -> Result<Self, SchemeError> {
        if !path.exists() {
            return Err(SchemeError::BadFilePath(path.to_path_buf()));
        }
        let reader = BufReader::new(File::open(path)?);
        let scheme: InjectionScheme = serde_json::from_reader(reader)?;
        let buckets = scheme.collisions.ok_or(SchemeError::MissingCollisions)?;
        let schedule = Self::from_rf_buckets(buckets)?;
        log::info!(
            "Loaded filling scheme {} with {} colliding bunches ({} scouted per orbit)",
            path.to_string_lossy(),
            schedule.len(),
            schedule.scouted_slots().count()
        );
        Ok(schedule)
    }

    /// All colliding slots, ascending
    pub fn slots(&self) -> impl Iterator<Item = u32> + '_ {
        self.slots.iter().copied()
    }

    /// Colliding slots that fall in the scouted time slices (slot % 9 is 0 or 1), ascending
    pub fn scouted_slots(&self) -> impl Iterator<Item = u32> + '_ {
        self.slots()
            .filter(|slot| SCOUTED_TIME_SLICES.contains(&(slot % TIME_SLICE_PERIOD)))
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}
