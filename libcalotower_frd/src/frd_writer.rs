use std::fs::File;
use std::io::{BufWriter, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use super::constants::*;
use super::error::FrdWriterError;
use super::frd_format::{FileHeader, OrbitHeader};

/// What was written to an FRD file, reported when the writer is closed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrdSummary {
    pub path: PathBuf,
    pub run_number: u32,
    pub lumisection: u32,
    pub n_orbits: u32,
    pub file_size: u64,
}

/// Writes orbits to an FRD .raw file.
///
/// On creation a zeroed placeholder file header is written. Orbits are then appended
/// in strictly increasing order, each as an orbit header immediately followed by its
/// payload. Closing the writer seeks back to the start and writes the final file
/// header (orbit count, run, lumisection, file size).
///
/// If the writer is dropped without being closed (an error was propagated past it, or
/// a panic unwound through it), the file header is still finalized with the orbits that
/// made it to disk. Only killing the process can leave the placeholder header behind.
#[derive(Debug)]
pub struct FrdWriter {
    file: Option<BufWriter<File>>,
    path: PathBuf,
    run_number: u32,
    lumisection: u32,
    n_orbits: u32,
    last_orbit: Option<u32>,
    // End of the last complete orbit
    complete_size: u64,
}

impl FrdWriter {
    /// Create the file at path (and any missing parent directories) and reserve the header
    pub fn create(path: &Path, run_number: u32, lumisection: u32) -> Result<Self, FrdWriterError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut file = BufWriter::new(File::create(path)?);
        file.write_all(&[0u8; FILE_HEADER_SIZE as usize])?;
        log::info!("Opened FRD file {}", path.to_string_lossy());
        Ok(Self {
            file: Some(file),
            path: path.to_path_buf(),
            run_number,
            lumisection,
            n_orbits: 0,
            last_orbit: None,
            complete_size: FILE_HEADER_SIZE as u64,
        })
    }

    /// Append one orbit: header declaring `payload.len() + 4` bytes, then the payload
    pub fn write_orbit(&mut self, orbit_number: u32, payload: &[u8]) -> Result<(), FrdWriterError> {
        if let Some(last) = self.last_orbit {
            if orbit_number <= last {
                return Err(FrdWriterError::OrbitOutOfOrder(orbit_number, last));
            }
        }
        let payload_size = u32::try_from(payload.len())
            .ok()
            .filter(|size| size.checked_add(SOURCE_ID_SIZE as u32).is_some())
            .ok_or(FrdWriterError::PayloadTooLarge(payload.len()))?;

        let header = OrbitHeader::new(
            self.run_number,
            self.lumisection,
            orbit_number,
            payload_size,
        );
        let file = self.file_mut()?;
        header.write_to(file)?;
        file.write_all(payload)?;

        self.last_orbit = Some(orbit_number);
        self.n_orbits += 1;
        self.complete_size += (ORBIT_HEADER_SIZE + payload.len()) as u64;
        Ok(())
    }

    /// Write the final file header and close the file, consuming the writer
    pub fn close(mut self) -> Result<FrdSummary, FrdWriterError> {
        let file_size = self.finalize()?;
        log::info!(
            "Closed FRD file {} with {} orbits ({})",
            self.path.to_string_lossy(),
            self.n_orbits,
            human_bytes::human_bytes(file_size as f64)
        );
        Ok(FrdSummary {
            path: self.path.clone(),
            run_number: self.run_number,
            lumisection: self.lumisection,
            n_orbits: self.n_orbits,
            file_size,
        })
    }

    pub fn get_path(&self) -> &Path {
        &self.path
    }

    pub fn get_n_orbits(&self) -> u32 {
        self.n_orbits
    }

    fn file_mut(&mut self) -> Result<&mut BufWriter<File>, FrdWriterError> {
        self.file.as_mut().ok_or_else(|| {
            FrdWriterError::IOError(std::io::Error::new(
                std::io::ErrorKind::Other,
                "FRD file was already finalized",
            ))
        })
    }

    /// Rewrite the file header with the final values and cut off any partially written
    /// orbit. The file is released afterwards.
    fn finalize(&mut self) -> Result<u64, FrdWriterError> {
        let mut file = match self.file.take() {
            Some(f) => f,
            None => return Ok(0),
        };
        let file_size = self.complete_size;
        let written = file.stream_position()?;
        if written != file_size {
            log::warn!(
                "Discarding {} bytes of an incomplete orbit in {}",
                written.saturating_sub(file_size),
                self.path.to_string_lossy()
            );
        }
        file.seek(SeekFrom::Start(0))?;
        FileHeader::new(self.n_orbits, self.run_number, self.lumisection, file_size)
            .write_to(&mut file)?;
        file.flush()?;
        file.get_ref().set_len(file_size)?;
        Ok(file_size)
    }
}

impl Drop for FrdWriter {
    fn drop(&mut self) {
        if self.file.is_some() {
            log::warn!(
                "FrdWriter for {} was not closed; finalizing header with {} orbits",
                self.path.to_string_lossy(),
                self.n_orbits
            );
            if let Err(e) = self.finalize() {
                log::error!("Failed to finalize {}: {e}", self.path.to_string_lossy());
            }
        }
    }
}
