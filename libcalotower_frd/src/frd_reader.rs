use std::fs::File;
use std::io::{BufReader, Cursor, ErrorKind, Read};
use std::path::{Path, PathBuf};

use super::constants::*;
use super::error::FrdReaderError;
use super::frd_format::{BxRecord, FileHeader, OrbitHeader};

/// One orbit as read back from an FRD file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Orbit {
    pub header: OrbitHeader,
    pub bx_records: Vec<BxRecord>,
}

impl Orbit {
    pub fn n_words(&self) -> usize {
        self.bx_records.iter().map(|record| record.words.len()).sum()
    }
}

/// Reads an FRD .raw file back into orbits.
///
/// Opening checks the file header: the magic, the header size, and that the declared
/// file size matches the length on disk. A file whose writer never finished (placeholder
/// header, or a header whose size disagrees with the data) is rejected here.
#[derive(Debug)]
pub struct FrdReader {
    reader: BufReader<File>,
    path: PathBuf,
    header: FileHeader,
    position: u64,
    orbits_read: u32,
}

impl FrdReader {
    pub fn open(path: &Path) -> Result<Self, FrdReaderError> {
        if !path.exists() {
            return Err(FrdReaderError::BadFilePath(path.to_path_buf()));
        }
        let file = File::open(path)?;
        let actual = file.metadata()?.len();
        let mut reader = BufReader::new(file);
        let header = FileHeader::read_from(&mut reader)?;
        if header.file_size != actual {
            return Err(FrdReaderError::FileSizeMismatch {
                declared: header.file_size,
                actual,
            });
        }
        Ok(Self {
            reader,
            path: path.to_path_buf(),
            header,
            position: FILE_HEADER_SIZE as u64,
            orbits_read: 0,
        })
    }

    pub fn get_header(&self) -> &FileHeader {
        &self.header
    }

    pub fn get_path(&self) -> &Path {
        &self.path
    }

    /// Read the next orbit.
    ///
    /// Returns `Ok(None)` once the end of the file is reached. At that point the number of
    /// orbits read must match the event count declared in the file header.
    pub fn next_orbit(&mut self) -> Result<Option<Orbit>, FrdReaderError> {
        if self.position >= self.header.file_size {
            if self.orbits_read != self.header.event_count {
                return Err(FrdReaderError::EventCountMismatch {
                    declared: self.header.event_count,
                    found: self.orbits_read,
                });
            }
            return Ok(None);
        }

        let remaining = self.header.file_size - self.position;
        if remaining < ORBIT_HEADER_SIZE as u64 {
            return Err(FrdReaderError::TruncatedOrbitHeader {
                position: self.position,
                remaining,
            });
        }
        let header = OrbitHeader::read_from(&mut self.reader)?;
        // The declared size is only trusted once it fits in the rest of the file
        let declared = ORBIT_HEADER_SIZE as u64 + header.payload_size() as u64;
        if declared > remaining {
            return Err(FrdReaderError::OrbitOverrun {
                orbit: header.orbit_number,
                declared,
                remaining,
            });
        }
        let mut payload = vec![0u8; header.payload_size() as usize];
        self.reader.read_exact(&mut payload)?;

        let mut cursor = Cursor::new(payload.as_slice());
        let mut bx_records = Vec::new();
        while (cursor.position() as usize) < payload.len() {
            match BxRecord::read_from(&mut cursor) {
                Ok(record) => bx_records.push(record),
                Err(e) if e.kind() == ErrorKind::UnexpectedEof => {
                    return Err(FrdReaderError::BxRecordOverrun(header.orbit_number))
                }
                Err(e) => return Err(FrdReaderError::IOError(e)),
            }
        }

        self.position += (ORBIT_HEADER_SIZE + payload.len()) as u64;
        self.orbits_read += 1;
        Ok(Some(Orbit { header, bx_records }))
    }

    /// Read every remaining orbit
    pub fn read_all(&mut self) -> Result<Vec<Orbit>, FrdReaderError> {
        let mut orbits = Vec::new();
        while let Some(orbit) = self.next_orbit()? {
            orbits.push(orbit);
        }
        Ok(orbits)
    }
}
