use super::error::FrdWriterError;
use super::filling_scheme::CollidingBunches;
use super::frd_format::BxRecord;
use super::tower_source::TowerSource;

/// OrbitBuilder composes the payload of one orbit from a tower source.
///
/// Every scouted slot of the colliding bunch schedule (ascending) gets the next group of
/// towers from the source as a BX record. The payload is the concatenation of these
/// records and is fully built in memory, as the orbit header must declare its length.
#[derive(Debug)]
pub struct OrbitBuilder<'a> {
    schedule: &'a CollidingBunches,
    bx_per_orbit: usize,
}

impl<'a> OrbitBuilder<'a> {
    pub fn new(schedule: &'a CollidingBunches) -> Self {
        let bx_per_orbit = schedule.scouted_slots().count();
        if bx_per_orbit == 0 {
            log::warn!("Filling scheme has no scouted BX; orbits will have empty payloads");
        }
        Self {
            schedule,
            bx_per_orbit,
        }
    }

    /// Number of BX records in every orbit
    pub fn get_bx_per_orbit(&self) -> usize {
        self.bx_per_orbit
    }

    /// Build the BX records for an orbit, pulling one tower group per scouted slot
    pub fn build_records<S: TowerSource>(&self, orbit_number: u32, source: &mut S) -> Vec<BxRecord> {
        let mut records = Vec::with_capacity(self.bx_per_orbit);
        for bx in self.schedule.scouted_slots() {
            records.push(BxRecord::from_towers(bx, orbit_number, source.next_group()));
        }
        records
    }

    /// Build the serialized payload for an orbit
    pub fn build_payload<S: TowerSource>(
        &self,
        orbit_number: u32,
        source: &mut S,
    ) -> Result<Vec<u8>, FrdWriterError> {
        let records = self.build_records(orbit_number, source);
        let size = records.iter().map(|record| record.encoded_size()).sum();
        let mut payload = Vec::with_capacity(size);
        for record in records.iter() {
            record.write_to(&mut payload)?;
        }
        Ok(payload)
    }
}
