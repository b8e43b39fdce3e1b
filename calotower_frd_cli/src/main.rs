use clap::{value_parser, Arg, ArgMatches, Command};
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use indicatif_log_bridge::LogWrapper;
use std::path::{Path, PathBuf};
use std::sync::mpsc;

use libcalotower_frd::config::Config;
use libcalotower_frd::frd_reader::FrdReader;
use libcalotower_frd::process::process;
use libcalotower_frd::worker_status::{Stage, WorkerStatus};

fn make_template_config(path: &Path) {
    match Config::default().write_config_file(path) {
        Ok(()) => log::info!("Done."),
        Err(e) => log::error!("Failed to write template config: {e}"),
    }
}

/// Print a summary of an existing FRD file. Returns false if the file is not valid.
fn inspect_file(path: &Path) -> bool {
    let mut reader = match FrdReader::open(path) {
        Ok(r) => r,
        Err(e) => {
            log::error!("{e}");
            return false;
        }
    };
    let header = *reader.get_header();
    log::info!(
        "Run: {} Lumisection: {} Orbits: {} Size: {}",
        header.run_number,
        header.lumisection,
        header.event_count,
        human_bytes::human_bytes(header.file_size as f64)
    );
    let mut n_bx: usize = 0;
    let mut n_words: usize = 0;
    loop {
        match reader.next_orbit() {
            Ok(Some(orbit)) => {
                log::info!(
                    "Orbit {}: {} BX, {} towers, payload {}",
                    orbit.header.orbit_number,
                    orbit.bx_records.len(),
                    orbit.n_words(),
                    human_bytes::human_bytes(orbit.header.payload_size() as f64)
                );
                n_bx += orbit.bx_records.len();
                n_words += orbit.n_words();
            }
            Ok(None) => break,
            Err(e) => {
                log::error!("File is corrupt: {e}");
                return false;
            }
        }
    }
    log::info!("File is valid: {n_bx} BX records, {n_words} towers in total.");
    true
}

/// Apply command line overrides on top of the loaded config
fn apply_overrides(config: &mut Config, matches: &ArgMatches) {
    if let Some(input) = matches.get_one::<String>("input") {
        config.input_path = PathBuf::from(input);
    }
    if let Some(label) = matches.get_one::<String>("label") {
        config.tower_label = label.clone();
    }
    if let Some(n_orbits) = matches.get_one::<i32>("orbits") {
        config.n_orbits = *n_orbits;
    }
}

fn main() {
    // Create a cli
    let matches = Command::new("calotower_frd_cli")
        .about("Write L1 scouting CaloTower FRD files from NanoAOD event tables")
        .arg_required_else_help(true)
        .subcommand(Command::new("new").about("Make a template configuration yaml file"))
        .subcommand(
            Command::new("inspect").about("Check and summarize an FRD file").arg(
                Arg::new("file")
                    .short('f')
                    .long("file")
                    .required(true)
                    .help("Path to the .raw file"),
            ),
        )
        .arg(
            Arg::new("path")
                .short('p')
                .long("path")
                .global(true)
                .help("Path to the configuration file"),
        )
        .arg(
            Arg::new("input")
                .short('i')
                .long("input")
                .help("Override the event table path"),
        )
        .arg(
            Arg::new("label")
                .short('l')
                .long("label")
                .help("Override the CaloTower branch prefix"),
        )
        .arg(
            Arg::new("orbits")
                .short('n')
                .long("orbits")
                .allow_negative_numbers(true)
                .value_parser(value_parser!(i32))
                .help("Override the number of orbits"),
        )
        .get_matches();

    // Initialize feedback
    let logger = simplelog::TermLogger::new(
        simplelog::LevelFilter::Info,
        simplelog::Config::default(),
        simplelog::TerminalMode::Mixed,
        simplelog::ColorChoice::Auto,
    );

    let pb_manager = MultiProgress::new();

    if let Err(e) = LogWrapper::new(pb_manager.clone(), logger).try_init() {
        eprintln!("Could not create logging/progress: {e}");
        std::process::exit(1);
    }

    if let Some(("inspect", sub_matches)) = matches.subcommand() {
        let valid = sub_matches
            .get_one::<String>("file")
            .is_some_and(|file| inspect_file(Path::new(file)));
        if !valid {
            std::process::exit(1);
        }
        return;
    }

    // Parse the cli
    let config_path = match matches.get_one::<String>("path") {
        Some(p) => PathBuf::from(p),
        None => {
            log::error!("A configuration file path is required (-p/--path)");
            std::process::exit(1);
        }
    };

    if let Some(("new", _)) = matches.subcommand() {
        log::info!(
            "Making a template config at {}...",
            config_path.to_string_lossy()
        );
        make_template_config(&config_path);
        return;
    }

    // Load our config
    log::info!("Loading config from {}...", config_path.to_string_lossy());
    let mut config = match Config::read_config_file(&config_path) {
        Ok(c) => c,
        Err(e) => {
            log::error!("{e}");
            std::process::exit(1);
        }
    };
    apply_overrides(&mut config, &matches);
    log::info!("Config successfully loaded.");
    log::info!("Input Path: {}", config.input_path.to_string_lossy());
    log::info!("CaloTower Label: {}", config.tower_label);
    log::info!(
        "Filling Scheme Path: {}",
        config.filling_scheme_path.to_string_lossy()
    );
    log::info!("Output Path: {}", config.output_path.to_string_lossy());
    log::info!("Number of Orbits: {}", config.get_n_orbits());

    // Setup the progress bar
    let pb = pb_manager.add(ProgressBar::new(100));
    if let Ok(style) = ProgressStyle::with_template("{msg} [{bar:40.cyan/blue}] {pos}%") {
        pb.set_style(style.progress_chars("=> "));
    }
    let (tx, rx) = mpsc::channel::<WorkerStatus>();
    // Spawn the task!
    let handle = std::thread::spawn(move || process(config, tx));

    // The channel closes once the worker is done, successful or not
    for status in rx.iter() {
        match status.stage {
            Stage::Loading => pb.set_message("Loading"),
            Stage::Writing => pb.set_message(format!("Run {}", status.run_number)),
            Stage::Finalized => pb.set_message("Finalized"),
        }
        pb.set_position((status.progress * 100.0) as u64);
    }

    let mut failed = false;
    match handle.join() {
        Ok(result) => match result {
            Ok(summary) => log::info!(
                "Successfully wrote {} orbits to {} ({})",
                summary.n_orbits,
                summary.path.to_string_lossy(),
                human_bytes::human_bytes(summary.file_size as f64)
            ),
            Err(e) => {
                log::error!("Writing failed with error: {e}");
                failed = true;
            }
        },
        Err(_) => {
            log::error!("Failed to join writing task!");
            failed = true;
        }
    }

    pb.finish();

    log::info!("Done.");
    if failed {
        std::process::exit(1);
    }
}
