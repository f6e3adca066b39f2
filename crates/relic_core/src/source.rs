//! The `VolumeSource` trait: random access to raw volume image bytes.
//!
//! Every analyzer in this crate reads through a single source handed down
//! from the driver; helpers never open their own handles, so one open image
//! serves an entire analysis run.

use crate::error::{CoreError, Result};
use std::io::{Read, Seek, SeekFrom};

/// A byte-addressable source of volume image data.
///
/// Implementations exist for disk image files and memory-mapped images in
/// `relic_io`, and for in-memory buffers via [`std::io::Cursor`] (used by
/// the synthetic-image tests).
pub trait VolumeSource {
    /// Reads up to `buf.len()` bytes starting at `offset`.
    ///
    /// Returns the number of bytes actually read, which is less than the
    /// buffer length only when the end of the source is reached.
    fn read_chunk(&mut self, offset: u64, buf: &mut [u8]) -> Result<usize>;

    /// Total size of the source in bytes.
    fn size(&self) -> u64;

    /// Fills `buf` exactly, failing with [`CoreError::UnexpectedEnd`] if the
    /// source ends first.
    fn read_exact_at(&mut self, offset: u64, buf: &mut [u8]) -> Result<()> {
        let mut filled = 0;
        while filled < buf.len() {
            let n = self.read_chunk(offset + filled as u64, &mut buf[filled..])?;
            if n == 0 {
                return Err(CoreError::UnexpectedEnd {
                    offset,
                    wanted: buf.len(),
                });
            }
            filled += n;
        }
        Ok(())
    }
}

impl<T: VolumeSource + ?Sized> VolumeSource for &mut T {
    fn read_chunk(&mut self, offset: u64, buf: &mut [u8]) -> Result<usize> {
        (**self).read_chunk(offset, buf)
    }

    fn size(&self) -> u64 {
        (**self).size()
    }
}

impl<T: VolumeSource + ?Sized> VolumeSource for Box<T> {
    fn read_chunk(&mut self, offset: u64, buf: &mut [u8]) -> Result<usize> {
        (**self).read_chunk(offset, buf)
    }

    fn size(&self) -> u64 {
        (**self).size()
    }
}

/// In-memory volume image, primarily for tests and fixtures.
impl VolumeSource for std::io::Cursor<Vec<u8>> {
    fn read_chunk(&mut self, offset: u64, buf: &mut [u8]) -> Result<usize> {
        self.seek(SeekFrom::Start(offset))?;
        Ok(self.read(buf)?)
    }

    fn size(&self) -> u64 {
        self.get_ref().len() as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_read_exact_at_fills_buffer() {
        let mut src = Cursor::new(vec![1u8, 2, 3, 4, 5, 6]);
        let mut buf = [0u8; 4];
        src.read_exact_at(1, &mut buf).unwrap();
        assert_eq!(buf, [2, 3, 4, 5]);
    }

    #[test]
    fn test_read_exact_at_past_end() {
        let mut src = Cursor::new(vec![0u8; 8]);
        let mut buf = [0u8; 4];
        let err = src.read_exact_at(6, &mut buf).unwrap_err();
        assert!(matches!(
            err,
            CoreError::UnexpectedEnd { offset: 6, wanted: 4 }
        ));
    }

    #[test]
    fn test_size() {
        let src = Cursor::new(vec![0u8; 123]);
        assert_eq!(VolumeSource::size(&src), 123);
    }
}
