// FRD file header (version 2)
pub const FILE_HEADER_MAGIC: &[u8; 8] = b"RAW_0002";
pub const FILE_HEADER_SIZE: u16 = 32;
/// Data type code used by the L1 scouting CaloTower stream
pub const FILE_DATA_TYPE: u16 = 20;

// FRD event header (version 6). One FRD event per orbit.
pub const EVENT_HEADER_VERSION: u16 = 6;
pub const EVENT_HEADER_FLAGS: u16 = 0;
pub const EVENT_HEADER_CRC32C: u32 = 0;
pub const EVENT_HEADER_SIZE: usize = 24;
/// The source ID follows the v6 event header and is counted in the event size
pub const SOURCE_ID: u32 = 32;
pub const SOURCE_ID_SIZE: usize = 4;
pub const ORBIT_HEADER_SIZE: usize = EVENT_HEADER_SIZE + SOURCE_ID_SIZE;

// BX record: count, bx, orbit
pub const BX_RECORD_HEADER_SIZE: usize = 12;
pub const TOWER_WORD_SIZE: usize = 4;
/// Upper bound on words reserved up front when reading a BX record
pub const MAX_PREALLOCATED_WORDS: usize = 4096;

// Only the first two time slices of every 9 BX are scouted
pub const TIME_SLICE_PERIOD: u32 = 9;
pub const SCOUTED_TIME_SLICES: [u32; 2] = [0, 1];

// An LHC bunch crossing spans 10 RF buckets
pub const RF_BUCKETS_PER_BX: u32 = 10;
pub const FILLING_SCHEME_COLLISIONS_KEY: &str = "collsIP1/5";

pub const DEFAULT_TOWER_LABEL: &str = "L1EmulCaloTower";
