//! Memory-mapped volume reader.

use memmap2::Mmap;
use relic_core::{CoreError, Result, VolumeSource};
use std::fs::File;
use std::path::Path;

/// A [`VolumeSource`] backed by a read-only memory mapping.
///
/// Page-sized metadata reads dominate both analysis pipelines, and the
/// kernel's page cache serves repeated visits to the same cluster without a
/// syscall per read. Device nodes that refuse to map report an error; the
/// caller falls back to [`crate::DiskReader`].
///
/// The mapping is only ever read, and forensic inputs are not modified
/// while an analysis runs, which is what makes `Mmap::map` sound here.
pub struct MmapReader {
    mmap: Mmap,
}

impl MmapReader {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path.as_ref())?;
        let len = file.metadata()?.len();
        if len == 0 {
            return Err(CoreError::Format {
                offset: 0,
                reason: "cannot map an empty image".into(),
            });
        }

        let mmap = unsafe { Mmap::map(&file) }
            .map_err(|e| CoreError::Io(std::io::Error::other(e)))?;

        // Block devices can "succeed" with an empty mapping.
        if mmap.len() == 0 {
            return Err(CoreError::Format {
                offset: 0,
                reason: "mapping came back empty; source does not support mmap".into(),
            });
        }

        Ok(Self { mmap })
    }

    /// Zero-copy view of up to `len` bytes at `offset`.
    pub fn slice(&self, offset: u64, len: usize) -> Option<&[u8]> {
        let start = offset as usize;
        if start >= self.mmap.len() {
            return None;
        }
        let end = start.saturating_add(len).min(self.mmap.len());
        Some(&self.mmap[start..end])
    }
}

impl VolumeSource for MmapReader {
    fn read_chunk(&mut self, offset: u64, buf: &mut [u8]) -> Result<usize> {
        match self.slice(offset, buf.len()) {
            Some(slice) => {
                buf[..slice.len()].copy_from_slice(slice);
                Ok(slice.len())
            }
            None => Ok(0),
        }
    }

    fn size(&self) -> u64 {
        self.mmap.len() as u64
    }
}
