use std::path::PathBuf;
use thiserror::Error;

use super::constants::*;
use super::worker_status::WorkerStatus;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration as file {0:?} does not exist")]
    BadFilePath(PathBuf),
    #[error("Config failed due to IO error: {0}")]
    IOError(#[from] std::io::Error),
    #[error("Config failed to parse YAML: {0}")]
    ParsingError(#[from] serde_yaml::Error),
}

#[derive(Debug, Error)]
pub enum SchemeError {
    #[error("Could not open filling scheme because file {0:?} does not exist")]
    BadFilePath(PathBuf),
    #[error("Filling scheme failed due to IO error: {0}")]
    IOError(#[from] std::io::Error),
    #[error("Filling scheme failed to parse JSON: {0}")]
    ParsingError(#[from] serde_json::Error),
    #[error("Filling scheme does not contain the key {key}", key=FILLING_SCHEME_COLLISIONS_KEY)]
    MissingCollisions,
    #[error("Filling scheme contains invalid RF bucket {0}; buckets start from 1")]
    InvalidBucket(u32),
}

#[derive(Debug, Error)]
pub enum EventTableError {
    #[error("Could not open event table because file {0:?} does not exist")]
    BadFilePath(PathBuf),
    #[error("Event table failed due to IO error: {0}")]
    IOError(#[from] std::io::Error),
    #[error("Event table failed to parse YAML/JSON: {0}")]
    ParsingError(#[from] serde_yaml::Error),
    #[error("Event table is missing branch {0}")]
    MissingBranch(String),
    #[error("Event table branch {0} has {1} entries; expected {2}")]
    BranchLengthMismatch(String, usize, usize),
    #[error("In event {0} the CaloTower branches do not have matching lengths")]
    RaggedEvent(usize),
    #[error("Event table contains no events")]
    NoEvents,
    #[error("Event table has invalid {0} value {1} in the first event")]
    BadRunInfo(&'static str, i64),
}

#[derive(Debug, Error)]
pub enum FrdFormatError {
    #[error("FRD format failed due to IO error: {0}")]
    IOError(#[from] std::io::Error),
    #[error("Incorrect FRD file magic {0:?}; expected RAW_0002")]
    BadMagic([u8; 8]),
    #[error("Incorrect FRD file header size {0}; expected {exp}", exp=FILE_HEADER_SIZE)]
    BadHeaderSize(u16),
    #[error("Incorrect FRD event header version {0}; expected {exp}", exp=EVENT_HEADER_VERSION)]
    BadEventVersion(u16),
    #[error("FRD event header declares size {0}, which cannot hold the source ID")]
    BadEventSize(u32),
}

#[derive(Debug, Error)]
pub enum FrdWriterError {
    #[error("FrdWriter failed due to IO error: {0}")]
    IOError(#[from] std::io::Error),
    #[error("FrdWriter was given orbit {0} after orbit {1}; orbits must be strictly increasing")]
    OrbitOutOfOrder(u32, u32),
    #[error("FrdWriter orbit payload of {0} bytes does not fit in the event size field")]
    PayloadTooLarge(usize),
}

#[derive(Debug, Error)]
pub enum FrdReaderError {
    #[error("Could not open FRD file because file {0:?} does not exist")]
    BadFilePath(PathBuf),
    #[error("FrdReader failed due to IO error: {0}")]
    IOError(#[from] std::io::Error),
    #[error("FrdReader failed to parse a header: {0}")]
    BadFormat(#[from] FrdFormatError),
    #[error("FRD file header declares {declared} bytes but the file has {actual} bytes")]
    FileSizeMismatch { declared: u64, actual: u64 },
    #[error("FRD file header declares {declared} orbits but the file holds {found}")]
    EventCountMismatch { declared: u32, found: u32 },
    #[error("FRD file has {remaining} bytes left at offset {position}, too few for an orbit header")]
    TruncatedOrbitHeader { position: u64, remaining: u64 },
    #[error("Orbit {orbit} declares {declared} bytes but only {remaining} bytes are left in the file")]
    OrbitOverrun {
        orbit: u32,
        declared: u64,
        remaining: u64,
    },
    #[error("In orbit {0} a BX record overruns the orbit payload")]
    BxRecordOverrun(u32),
}

#[derive(Debug, Error)]
pub enum ProcessorError {
    #[error("Processor failed due to Config error: {0}")]
    ConfigError(#[from] ConfigError),
    #[error("Processor failed due to filling scheme error: {0}")]
    SchemeError(#[from] SchemeError),
    #[error("Processor failed due to event table error: {0}")]
    EventTableError(#[from] EventTableError),
    #[error("Processor failed due to FrdWriter error: {0}")]
    WriterError(#[from] FrdWriterError),
    #[error("Processor failed due to Send error: {0}")]
    SendError(#[from] std::sync::mpsc::SendError<WorkerStatus>),
}
