use std::sync::mpsc::Sender;

use super::config::Config;
use super::error::ProcessorError;
use super::filling_scheme::CollidingBunches;
use super::frd_writer::{FrdSummary, FrdWriter};
use super::orbit_builder::OrbitBuilder;
use super::tower_source::{CyclicSource, EventTable};
use super::worker_status::{Stage, WorkerStatus};

// Report progress roughly every 1% of the orbits
const FLUSH_FRAC: f32 = 0.01;

/// Write one FRD file from the configured event table, using an already loaded schedule.
///
/// Run number and lumisection come from the first event of the table. Orbits 1 through
/// `n_orbits` are written in order; the towers of the table are replayed cyclically to
/// fill every scouted BX of every orbit.
pub fn process_run(
    config: &Config,
    schedule: &CollidingBunches,
    tx: &Sender<WorkerStatus>,
) -> Result<FrdSummary, ProcessorError> {
    tx.send(WorkerStatus::new(0.0, 0, 0, Stage::Loading))?;
    let table = EventTable::read_file(&config.input_path, &config.tower_label)?;
    let run_number = table.run_number;
    let lumisection = table.lumisection;

    let mut source = CyclicSource::new(&table.events)?;
    let builder = OrbitBuilder::new(schedule);
    let n_orbits = config.get_n_orbits();
    let patience = config.get_patience();
    log::info!(
        "Writing {} orbits with {} BX per orbit from {} events ({} towers)",
        n_orbits,
        builder.get_bx_per_orbit(),
        table.len(),
        table.n_towers()
    );

    let raw_path = config.get_raw_file_name(run_number, lumisection);
    let mut writer = FrdWriter::create(&raw_path, run_number, lumisection)?;

    let flush_val = ((n_orbits as f32 * FLUSH_FRAC) as u32).max(1);
    for orbit_number in 1..=n_orbits {
        let payload = builder.build_payload(orbit_number, &mut source)?;

        if orbit_number % patience == 0 {
            log::info!(
                "At orbit {} (size = {})",
                orbit_number,
                human_bytes::human_bytes(payload.len() as f64)
            );
        }

        writer.write_orbit(orbit_number, &payload)?;

        if orbit_number % flush_val == 0 {
            tx.send(WorkerStatus::new(
                orbit_number as f32 / n_orbits as f32,
                run_number,
                orbit_number,
                Stage::Writing,
            ))?;
        }
    }

    let summary = writer.close()?;
    if source.n_rollovers() > 0 {
        log::info!(
            "Event sample was replayed {} times to fill {} BX records",
            source.n_rollovers(),
            source.served()
        );
    }
    tx.send(WorkerStatus::new(
        1.0,
        run_number,
        summary.n_orbits,
        Stage::Finalized,
    ))?;
    Ok(summary)
}

/// The function to be called by a separate thread (typically the CLI).
///
/// Loads the filling scheme first; a missing input or scheme is fatal before any output
/// is produced.
pub fn process(config: Config, tx: Sender<WorkerStatus>) -> Result<FrdSummary, ProcessorError> {
    config.check_inputs()?;
    let schedule = CollidingBunches::from_scheme_file(&config.filling_scheme_path)?;
    process_run(&config, &schedule, &tx)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ConfigError;
    use std::path::PathBuf;
    use std::sync::mpsc;

    const TABLE: &str = r#"
run: [42, 42]
luminosityBlock: [7, 7]
L1EmulCaloTower_iet: [[10, 20], [30]]
L1EmulCaloTower_ieta: [[-1, 1], [-3]]
L1EmulCaloTower_iphi: [[2, 4], [6]]
L1EmulCaloTower_iqual: [[5, 0], [1]]
L1EmulCaloTower_iratio: [[1, 0], [2]]
"#;

    #[test]
    fn test_process_run_statuses() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("events.yml");
        std::fs::write(&input, TABLE).unwrap();
        let config = Config {
            input_path: input,
            output_path: dir.path().to_path_buf(),
            n_orbits: 3,
            ..Default::default()
        };
        let schedule = CollidingBunches::from_slots([0, 1, 2]);
        let (tx, rx) = mpsc::channel();

        let summary = process_run(&config, &schedule, &tx).unwrap();
        assert_eq!(summary.n_orbits, 3);
        assert_eq!(summary.run_number, 42);
        assert_eq!(summary.lumisection, 7);
        assert_eq!(
            summary.path,
            dir.path().join("run42").join("run42_ls0007_index000000.raw")
        );
        // 3 orbits x (28 header + 2 BX records); records alternate 2 and 1 towers
        let orbit_sizes = [12 * 2 + 3 * 4, 12 * 2 + 3 * 4, 12 * 2 + 3 * 4];
        let expected: usize = 32 + orbit_sizes.iter().map(|s| 28 + s).sum::<usize>();
        assert_eq!(summary.file_size, expected as u64);

        drop(tx);
        let statuses: Vec<WorkerStatus> = rx.iter().collect();
        assert_eq!(statuses.first().unwrap().stage, Stage::Loading);
        let last = statuses.last().unwrap();
        assert_eq!(last.stage, Stage::Finalized);
        assert_eq!(last.progress, 1.0);
        assert_eq!(
            statuses.iter().filter(|s| s.stage == Stage::Writing).count(),
            3
        );
    }

    #[test]
    fn test_process_missing_scheme() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("events.yml");
        std::fs::write(&input, TABLE).unwrap();
        let config = Config {
            input_path: input,
            filling_scheme_path: PathBuf::from("/no/such/scheme.json"),
            output_path: dir.path().to_path_buf(),
            ..Default::default()
        };
        let (tx, _rx) = mpsc::channel();
        assert!(matches!(
            process(config, tx),
            Err(ProcessorError::ConfigError(ConfigError::BadFilePath(_)))
        ));
        // nothing was written
        assert!(!dir.path().join("run42").exists());
    }
}
