use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use super::calo_tower::{CaloTower, TowerWord};
use super::constants::*;
use super::error::FrdFormatError;

/// The FRD (FED Raw Data) v2 file header.
///
/// Sits at offset 0 of every .raw file. On disk (little endian):
///
/// ```text
/// char[8] magic ("RAW_0002") | u16 header size | u16 data type | u32 event count
/// u32 run number | u32 lumisection | u64 file size
/// ```
///
/// The event count is the number of orbits in the file, and the file size includes
/// the header itself.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FileHeader {
    pub event_count: u32,
    pub run_number: u32,
    pub lumisection: u32,
    pub file_size: u64,
}

impl FileHeader {
    pub fn new(event_count: u32, run_number: u32, lumisection: u32, file_size: u64) -> Self {
        Self {
            event_count,
            run_number,
            lumisection,
            file_size,
        }
    }

    pub fn write_to<W: Write>(&self, writer: &mut W) -> Result<(), std::io::Error> {
        writer.write_all(FILE_HEADER_MAGIC)?;
        writer.write_u16::<LittleEndian>(FILE_HEADER_SIZE)?;
        writer.write_u16::<LittleEndian>(FILE_DATA_TYPE)?;
        writer.write_u32::<LittleEndian>(self.event_count)?;
        writer.write_u32::<LittleEndian>(self.run_number)?;
        writer.write_u32::<LittleEndian>(self.lumisection)?;
        writer.write_u64::<LittleEndian>(self.file_size)?;
        Ok(())
    }

    pub fn read_from<R: Read>(reader: &mut R) -> Result<Self, FrdFormatError> {
        let mut magic = [0u8; 8];
        reader.read_exact(&mut magic)?;
        if &magic != FILE_HEADER_MAGIC {
            return Err(FrdFormatError::BadMagic(magic));
        }
        let header_size = reader.read_u16::<LittleEndian>()?;
        if header_size != FILE_HEADER_SIZE {
            return Err(FrdFormatError::BadHeaderSize(header_size));
        }
        // Data type is informational only
        let _data_type = reader.read_u16::<LittleEndian>()?;
        Ok(Self {
            event_count: reader.read_u32::<LittleEndian>()?,
            run_number: reader.read_u32::<LittleEndian>()?,
            lumisection: reader.read_u32::<LittleEndian>()?,
            file_size: reader.read_u64::<LittleEndian>()?,
        })
    }
}

/// The per-orbit header: an FRD v6 event header followed by the source ID.
///
/// ```text
/// u16 version (6) | u16 flags (0) | u32 run | u32 lumisection | u32 orbit
/// u32 event size | u32 crc32c (0) | u32 source ID (32)
/// ```
///
/// The event size counts the source ID word plus the orbit payload, which is why it is
/// always the payload length plus 4. The CRC32C is never computed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OrbitHeader {
    pub run_number: u32,
    pub lumisection: u32,
    pub orbit_number: u32,
    pub payload_size_plus_4: u32,
}

impl OrbitHeader {
    pub fn new(run_number: u32, lumisection: u32, orbit_number: u32, payload_size: u32) -> Self {
        Self {
            run_number,
            lumisection,
            orbit_number,
            payload_size_plus_4: payload_size + SOURCE_ID_SIZE as u32,
        }
    }

    /// Length of the orbit payload following this header
    pub fn payload_size(&self) -> u32 {
        self.payload_size_plus_4 - SOURCE_ID_SIZE as u32
    }

    pub fn write_to<W: Write>(&self, writer: &mut W) -> Result<(), std::io::Error> {
        writer.write_u16::<LittleEndian>(EVENT_HEADER_VERSION)?;
        writer.write_u16::<LittleEndian>(EVENT_HEADER_FLAGS)?;
        writer.write_u32::<LittleEndian>(self.run_number)?;
        writer.write_u32::<LittleEndian>(self.lumisection)?;
        writer.write_u32::<LittleEndian>(self.orbit_number)?;
        writer.write_u32::<LittleEndian>(self.payload_size_plus_4)?;
        writer.write_u32::<LittleEndian>(EVENT_HEADER_CRC32C)?;
        writer.write_u32::<LittleEndian>(SOURCE_ID)?;
        Ok(())
    }

    pub fn read_from<R: Read>(reader: &mut R) -> Result<Self, FrdFormatError> {
        let version = reader.read_u16::<LittleEndian>()?;
        if version != EVENT_HEADER_VERSION {
            return Err(FrdFormatError::BadEventVersion(version));
        }
        let _flags = reader.read_u16::<LittleEndian>()?;
        let run_number = reader.read_u32::<LittleEndian>()?;
        let lumisection = reader.read_u32::<LittleEndian>()?;
        let orbit_number = reader.read_u32::<LittleEndian>()?;
        let payload_size_plus_4 = reader.read_u32::<LittleEndian>()?;
        if (payload_size_plus_4 as usize) < SOURCE_ID_SIZE {
            return Err(FrdFormatError::BadEventSize(payload_size_plus_4));
        }
        let _crc32c = reader.read_u32::<LittleEndian>()?;
        let _source_id = reader.read_u32::<LittleEndian>()?;
        Ok(Self {
            run_number,
            lumisection,
            orbit_number,
            payload_size_plus_4,
        })
    }
}

/// All of the tower words recorded in one bunch crossing of one orbit.
///
/// On disk: `u32 count | u32 bx | u32 orbit | count x u32 tower word`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BxRecord {
    pub bx_number: u32,
    pub orbit_number: u32,
    pub words: Vec<TowerWord>,
}

impl BxRecord {
    /// Encode a group of towers into a record for the given BX
    pub fn from_towers(bx_number: u32, orbit_number: u32, towers: &[CaloTower]) -> Self {
        Self {
            bx_number,
            orbit_number,
            words: towers.iter().map(|tower| tower.encode()).collect(),
        }
    }

    /// Number of bytes this record occupies in an orbit payload
    pub fn encoded_size(&self) -> usize {
        BX_RECORD_HEADER_SIZE + self.words.len() * TOWER_WORD_SIZE
    }

    pub fn write_to<W: Write>(&self, writer: &mut W) -> Result<(), std::io::Error> {
        writer.write_u32::<LittleEndian>(self.words.len() as u32)?;
        writer.write_u32::<LittleEndian>(self.bx_number)?;
        writer.write_u32::<LittleEndian>(self.orbit_number)?;
        for word in self.words.iter() {
            writer.write_u32::<LittleEndian>(word.0)?;
        }
        Ok(())
    }

    pub fn read_from<R: Read>(reader: &mut R) -> Result<Self, std::io::Error> {
        let count = reader.read_u32::<LittleEndian>()?;
        let bx_number = reader.read_u32::<LittleEndian>()?;
        let orbit_number = reader.read_u32::<LittleEndian>()?;
        let mut words = Vec::with_capacity((count as usize).min(MAX_PREALLOCATED_WORDS));
        for _ in 0..count {
            words.push(TowerWord(reader.read_u32::<LittleEndian>()?));
        }
        Ok(Self {
            bx_number,
            orbit_number,
            words,
        })
    }
}

/// Construct the standard DAQ file name for a run, lumisection and index
pub fn raw_file_name(run_number: u32, lumisection: u32, index: u32) -> String {
    format!("run{run_number}_ls{lumisection:0>4}_index{index:0>6}.raw")
}

/// Construct the full path to a .raw file, `<parent>/run<run>/<raw_file_name>`
pub fn raw_file_path(parent: &Path, run_number: u32, lumisection: u32, index: u32) -> PathBuf {
    parent
        .join(format!("run{run_number}"))
        .join(raw_file_name(run_number, lumisection, index))
}
