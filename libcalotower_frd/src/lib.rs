//! # calotower_frd
//!
//! calotower_frd converts calorimeter trigger tower (CaloTower) measurements into FRD
//! ("FED Raw Data") files as read by the Level-1 scouting CaloTower unpacker. It takes a
//! columnar event table exported from a NanoAOD file with L1 emulator branches, replays
//! its events over the colliding bunches of an LHC filling scheme, and writes a given
//! number of synthetic orbits.
//!
//! ## Installation
//!
//! The only method of install is from source. To build and install the CLI use
//! `cargo install --path ./calotower_frd_cli` from the top level repository. To use the
//! CLI see the `calotower_frd_cli` README.
//!
//! ## Configuration
//!
//! The CLI is driven by a YAML configuration file. A template can be made with
//! `calotower_frd_cli new -p config.yml`. The format is as follows:
//!
//! ```yml
//! input_path: /path/to/nano_events.yml
//! tower_label: L1EmulCaloTower
//! filling_scheme_path: /path/to/25ns_2352b_2340_2004_2133_108bpi_24inj.json
//! output_path: .
//! n_orbits: 10
//! file_index: 0
//! patience: 1
//! ```
//!
//! - `input_path`: event table with the branches `run`, `luminosityBlock` and
//! `<tower_label>_{iet,ieta,iphi,iqual,iratio}`. YAML or JSON.
//! - `filling_scheme_path`: an LHC injection scheme JSON. The colliding bunches at IP1/5
//! (`collsIP1/5`, in RF buckets) are used. Fetching the file is left to the user.
//! - `n_orbits`: number of orbits to write. Negative values write none.
//! - `patience`: the orbit size is logged every `patience` orbits.
//!
//! ### Colliding bunches
//!
//! Only the first two time slices of every group of 9 BX are scouted, so of the colliding
//! BX slots only those with `slot % 9` equal to 0 or 1 are written. Every orbit holds the
//! same set of BX, in ascending order.
//!
//! ## Output
//!
//! One file is written per invocation, at
//! `<output_path>/run<run>/run<run>_ls<ls:04>_index<file_index:06>.raw`. Run and
//! lumisection are taken from the first event of the table.
//!
//! ### FRD Data Format
//!
//! All integers are little endian.
//!
//! ```text
//! run<run>_ls<ls>_index<index>.raw
//! file header (32 B) - "RAW_0002", header_size=32, data_type=20, event_count, run, ls, file_size
//! |---- orbit header (28 B) - version=6, flags=0, run, ls, orbit, size=payload+4, crc32c=0, source_id=32
//! |    |---- bx record - count, bx, orbit, count x tower word
//! |    |---- bx record ...
//! |---- orbit header ...
//! ```
//!
//! A tower word packs one CaloTower:
//!
//! ```text
//! bits 0-8 hwPt | 9-11 ehrBits | 12-15 miscBits | 16-23 hwPhi | 24-31 hwEta (twos complement)
//! ```
pub mod calo_tower;
pub mod config;
pub mod constants;
pub mod error;
pub mod filling_scheme;
pub mod frd_format;
pub mod frd_reader;
pub mod frd_writer;
pub mod orbit_builder;
pub mod process;
pub mod tower_source;
pub mod worker_status;
