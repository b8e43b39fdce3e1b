use serde::de::DeserializeOwned;
use std::collections::BTreeMap;
use std::path::Path;

use super::calo_tower::CaloTower;
use super::error::EventTableError;

const RUN_BRANCH: &str = "run";
const LUMI_BRANCH: &str = "luminosityBlock";
const PT_SUFFIX: &str = "iet";
const ETA_SUFFIX: &str = "ieta";
const PHI_SUFFIX: &str = "iphi";
const QUAL_SUFFIX: &str = "iqual";
const RATIO_SUFFIX: &str = "iratio";

/// All CaloTowers of one logical event. One event fills one BX record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TowerEvent {
    pub towers: Vec<CaloTower>,
}

/// Columnar table of CaloTower events, as exported from a NanoAOD `Events` tree.
///
/// The file is YAML (or JSON, which YAML reads as well) mapping branch names to per-event
/// arrays. With a label of `L1EmulCaloTower` the expected branches are
///
/// ```yml
/// run: [362000, ...]
/// luminosityBlock: [12, ...]
/// L1EmulCaloTower_iet: [[10, 4], ...]
/// L1EmulCaloTower_ieta: [[-1, 3], ...]
/// L1EmulCaloTower_iphi: [[2, 70], ...]
/// L1EmulCaloTower_iqual: [[5, 0], ...]
/// L1EmulCaloTower_iratio: [[1, 0], ...]
/// ```
///
/// Other branches are ignored. Run and lumisection are taken from the first event and
/// hold for everything written from this table.
#[derive(Debug, Clone)]
pub struct EventTable {
    pub run_number: u32,
    pub lumisection: u32,
    pub events: Vec<TowerEvent>,
}

/// Remove a branch from the column map and deserialize it
fn take_branch<T: DeserializeOwned>(
    columns: &mut BTreeMap<String, serde_yaml::Value>,
    name: &str,
) -> Result<T, EventTableError> {
    let value = columns
        .remove(name)
        .ok_or_else(|| EventTableError::MissingBranch(name.to_string()))?;
    Ok(serde_yaml::from_value(value)?)
}

fn check_length(name: &str, found: usize, expected: usize) -> Result<(), EventTableError> {
    if found != expected {
        Err(EventTableError::BranchLengthMismatch(
            name.to_string(),
            found,
            expected,
        ))
    } else {
        Ok(())
    }
}

fn first_as_u32(values: &[i64], branch: &'static str) -> Result<u32, EventTableError> {
    let value = *values.first().ok_or(EventTableError::NoEvents)?;
    u32::try_from(value).map_err(|_| EventTableError::BadRunInfo(branch, value))
}

impl EventTable {
    /// Read an event table file, using the CaloTower branches with the given label prefix
    pub fn read_file(path: &Path, label: &str) -> Result<Self, EventTableError> {
        if !path.exists() {
            return Err(EventTableError::BadFilePath(path.to_path_buf()));
        }
        let yaml_str = std::fs::read_to_string(path)?;
        let table = Self::from_yaml_str(&yaml_str, label)?;
        log::info!(
            "Loaded {} events from {} (run {}, lumisection {})",
            table.len(),
            path.to_string_lossy(),
            table.run_number,
            table.lumisection
        );
        Ok(table)
    }

    /// Parse an event table from YAML/JSON text
    pub fn from_yaml_str(yaml_str: &str, label: &str) -> Result<Self, EventTableError> {
        let mut columns: BTreeMap<String, serde_yaml::Value> = serde_yaml::from_str(yaml_str)?;

        let pt_name = format!("{label}_{PT_SUFFIX}");
        let eta_name = format!("{label}_{ETA_SUFFIX}");
        let phi_name = format!("{label}_{PHI_SUFFIX}");
        let qual_name = format!("{label}_{QUAL_SUFFIX}");
        let ratio_name = format!("{label}_{RATIO_SUFFIX}");

        let run: Vec<i64> = take_branch(&mut columns, RUN_BRANCH)?;
        let lumi: Vec<i64> = take_branch(&mut columns, LUMI_BRANCH)?;
        let pt: Vec<Vec<i32>> = take_branch(&mut columns, &pt_name)?;
        let eta: Vec<Vec<i32>> = take_branch(&mut columns, &eta_name)?;
        let phi: Vec<Vec<i32>> = take_branch(&mut columns, &phi_name)?;
        let qual: Vec<Vec<i32>> = take_branch(&mut columns, &qual_name)?;
        let ratio: Vec<Vec<i32>> = take_branch(&mut columns, &ratio_name)?;

        let n_events = pt.len();
        if n_events == 0 {
            return Err(EventTableError::NoEvents);
        }
        check_length(RUN_BRANCH, run.len(), n_events)?;
        check_length(LUMI_BRANCH, lumi.len(), n_events)?;
        check_length(&eta_name, eta.len(), n_events)?;
        check_length(&phi_name, phi.len(), n_events)?;
        check_length(&qual_name, qual.len(), n_events)?;
        check_length(&ratio_name, ratio.len(), n_events)?;

        let run_number = first_as_u32(&run, RUN_BRANCH)?;
        let lumisection = first_as_u32(&lumi, LUMI_BRANCH)?;

        let mut events = Vec::with_capacity(n_events);
        for idx in 0..n_events {
            let n_towers = pt[idx].len();
            if eta[idx].len() != n_towers
                || phi[idx].len() != n_towers
                || qual[idx].len() != n_towers
                || ratio[idx].len() != n_towers
            {
                return Err(EventTableError::RaggedEvent(idx));
            }
            let towers = (0..n_towers)
                .map(|t| {
                    CaloTower::new(
                        pt[idx][t],
                        eta[idx][t],
                        phi[idx][t],
                        qual[idx][t],
                        ratio[idx][t],
                    )
                })
                .collect();
            events.push(TowerEvent { towers });
        }

        Ok(Self {
            run_number,
            lumisection,
            events,
        })
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Total number of towers across all events
    pub fn n_towers(&self) -> usize {
        self.events.iter().map(|event| event.towers.len()).sum()
    }
}

/// A stream of CaloTower groups, one group per scouted BX
pub trait TowerSource {
    /// Get the towers for the next BX
    fn next_group(&mut self) -> &[CaloTower];
}

/// Replays a finite sample of events indefinitely.
///
/// The j-th call to `next_group` returns event `j mod M`, where M is the number of
/// events. This is a test data shortcut: a small sample fills any number of orbits.
#[derive(Debug, Clone)]
pub struct CyclicSource<'a> {
    events: &'a [TowerEvent],
    cursor: usize,
    served: u64,
}

impl<'a> CyclicSource<'a> {
    pub fn new(events: &'a [TowerEvent]) -> Result<Self, EventTableError> {
        if events.is_empty() {
            return Err(EventTableError::NoEvents);
        }
        Ok(Self {
            events,
            cursor: 0,
            served: 0,
        })
    }

    /// Number of groups handed out so far
    pub fn served(&self) -> u64 {
        self.served
    }

    /// Number of times the sample has been replayed from the start
    pub fn n_rollovers(&self) -> u64 {
        self.served / self.events.len() as u64
    }
}

impl TowerSource for CyclicSource<'_> {
    fn next_group(&mut self) -> &[CaloTower] {
        let events = self.events;
        let group = &events[self.cursor].towers;
        self.cursor += 1;
        if self.cursor == self.events.len() {
            self.cursor = 0; // roll over
        }
        self.served += 1;
        group
    }
}
