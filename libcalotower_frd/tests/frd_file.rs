use std::path::Path;

use libcalotower_frd::calo_tower::CaloTower;
use libcalotower_frd::filling_scheme::CollidingBunches;
use libcalotower_frd::frd_reader::{FrdReader, Orbit};
use libcalotower_frd::frd_writer::{FrdSummary, FrdWriter};
use libcalotower_frd::orbit_builder::OrbitBuilder;
use libcalotower_frd::tower_source::{CyclicSource, TowerEvent};

/// Events whose first tower carries the event index in hwPt, with a varying tower count
fn indexed_events(n: usize) -> Vec<TowerEvent> {
    (0..n)
        .map(|i| TowerEvent {
            towers: (0..(i % 4 + 1))
                .map(|t| CaloTower::new(i as i32, -(t as i32) - 1, t as i32 * 3, 2, 1))
                .collect(),
        })
        .collect()
}

fn write_file(
    path: &Path,
    events: &[TowerEvent],
    schedule: &CollidingBunches,
    n_orbits: u32,
) -> FrdSummary {
    let mut source = CyclicSource::new(events).unwrap();
    let builder = OrbitBuilder::new(schedule);
    let mut writer = FrdWriter::create(path, 362000, 41).unwrap();
    for orbit in 1..=n_orbits {
        let payload = builder.build_payload(orbit, &mut source).unwrap();
        writer.write_orbit(orbit, &payload).unwrap();
    }
    writer.close().unwrap()
}

fn read_file(path: &Path) -> Vec<Orbit> {
    FrdReader::open(path).unwrap().read_all().unwrap()
}

#[test]
fn file_size_and_event_count_match() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("run362000").join("run362000_ls0041_index000000.raw");
    let schedule = CollidingBunches::from_slots((1..200).step_by(3));
    let summary = write_file(&path, &indexed_events(5), &schedule, 6);

    let actual = std::fs::metadata(&path).unwrap().len();
    assert_eq!(summary.file_size, actual);

    let reader = FrdReader::open(&path).unwrap();
    assert_eq!(reader.get_header().event_count, 6);
    assert_eq!(reader.get_header().file_size, actual);
    assert_eq!(reader.get_header().run_number, 362000);
    assert_eq!(reader.get_header().lumisection, 41);
}

#[test]
fn orbit_header_declares_payload_plus_four() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("sizes.raw");
    let schedule = CollidingBunches::from_slots([0, 1, 9, 10, 18, 19, 20]);
    write_file(&path, &indexed_events(3), &schedule, 4);

    let orbits = read_file(&path);
    assert_eq!(orbits.len(), 4);
    for orbit in orbits.iter() {
        let payload: usize = orbit
            .bx_records
            .iter()
            .map(|record| record.encoded_size())
            .sum();
        assert_eq!(orbit.header.payload_size_plus_4 as usize - 4, payload);
    }
}

#[test]
fn bx_records_are_scouted_and_ordered() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("slots.raw");
    let schedule = CollidingBunches::from_slots([3563, 5, 900, 27, 28, 29, 1, 2, 2998, 2997]);
    write_file(&path, &indexed_events(2), &schedule, 3);

    for (idx, orbit) in read_file(&path).iter().enumerate() {
        assert_eq!(orbit.header.orbit_number, idx as u32 + 1);
        let bxs: Vec<u32> = orbit.bx_records.iter().map(|r| r.bx_number).collect();
        assert_eq!(bxs, vec![1, 27, 28, 900, 2997, 2998]);
        for record in orbit.bx_records.iter() {
            assert!(record.bx_number % 9 == 0 || record.bx_number % 9 == 1);
            assert_eq!(record.orbit_number, orbit.header.orbit_number);
        }
    }
}

#[test]
fn source_groups_are_replayed_round_robin() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("replay.raw");
    let events = indexed_events(7);
    // 4 scouted BX per orbit, so the sample wraps mid-orbit
    let schedule = CollidingBunches::from_slots([9, 10, 18, 19]);
    write_file(&path, &events, &schedule, 5);

    let records: Vec<_> = read_file(&path)
        .into_iter()
        .flat_map(|orbit| orbit.bx_records)
        .collect();
    assert_eq!(records.len(), 4 * 5);
    for (j, record) in records.iter().enumerate() {
        let expected = &events[j % events.len()];
        let words: Vec<_> = expected.towers.iter().map(|t| t.encode()).collect();
        assert_eq!(record.words, words, "record {j}");
        assert_eq!(record.words[0].hw_pt() as usize, j % events.len());
    }
}

#[test]
fn tower_words_decode_to_inputs() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("decode.raw");
    let events = vec![TowerEvent {
        towers: vec![
            CaloTower::new(10, -1, 2, 5, 1),
            CaloTower::new(511, 127, 255, 15, 7),
            CaloTower::new(0, -128, 0, 0, 0),
        ],
    }];
    write_file(&path, &events, &CollidingBunches::from_slots([0]), 1);

    let orbits = read_file(&path);
    let words = &orbits[0].bx_records[0].words;
    assert_eq!(words[0].0, 0xFF02_500A);
    for (word, tower) in words.iter().zip(events[0].towers.iter()) {
        let decoded = word.decode();
        assert_eq!(decoded.hw_pt, tower.hw_pt);
        assert_eq!(decoded.hw_phi, tower.hw_phi);
        assert_eq!(decoded.misc_bits, tower.misc_bits);
        assert_eq!(decoded.ehr_bits, tower.ehr_bits);
        assert_eq!(decoded.hw_eta, tower.hw_eta.rem_euclid(256));
        assert_eq!(word.hw_eta_signed(), tower.hw_eta);
    }
}

#[test]
fn zero_orbits_is_just_the_header() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("empty.raw");
    let summary = write_file(&path, &indexed_events(1), &CollidingBunches::from_slots([0]), 0);
    assert_eq!(summary.file_size, 32);

    let bytes = std::fs::read(&path).unwrap();
    assert_eq!(bytes.len(), 32);
    assert_eq!(&bytes[0..8], b"RAW_0002");
    assert_eq!(&bytes[12..16], &0u32.to_le_bytes());
    assert_eq!(&bytes[24..32], &32u64.to_le_bytes());
    assert!(read_file(&path).is_empty());
}
