//! Seek-based volume reader for image files and block devices.

use relic_core::{Result, VolumeSource};
use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;

/// A read-only [`VolumeSource`] over a disk image file or device node.
///
/// The file is never opened for writing; analysis cannot alter the
/// evidence. One reader is opened per run and threaded through every
/// subsystem, which repositions it explicitly before each read.
pub struct DiskReader {
    file: File,
    size: u64,
}

impl DiskReader {
    /// Opens `path` read-only and determines its size.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let mut file = OpenOptions::new()
            .read(true)
            .write(false)
            .open(path.as_ref())?;

        #[cfg(target_os = "linux")]
        {
            use rustix::fs::{fadvise, Advice};

            // Catalog and tree walks seek, they do not stream.
            let _ = fadvise(&file, 0, None, Advice::Random);
        }

        let size = file.seek(SeekFrom::End(0))?;
        file.seek(SeekFrom::Start(0))?;

        Ok(Self { file, size })
    }
}

impl VolumeSource for DiskReader {
    fn read_chunk(&mut self, offset: u64, buf: &mut [u8]) -> Result<usize> {
        self.file.seek(SeekFrom::Start(offset))?;
        Ok(self.file.read(buf)?)
    }

    fn size(&self) -> u64 {
        self.size
    }
}
