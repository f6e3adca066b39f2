//! Fixed-layout record decoding over a [`VolumeSource`].
//!
//! Both on-disk formats handled by this crate are sequences of little-endian
//! records at computed offsets. `RecordReader` keeps an explicit position
//! that is always set before a read, so there is no hidden cursor state
//! between decoding steps.

use crate::error::{CoreError, Result};
use crate::source::VolumeSource;
use byteorder::{ByteOrder, LittleEndian};

/// Positioned little-endian reader over a volume source.
///
/// # Example
///
/// ```ignore
/// let mut r = RecordReader::new(&mut src);
/// r.seek(partition_start * 512);
/// let magic = r.read_u32()?;
/// ```
pub struct RecordReader<'a, S: VolumeSource> {
    src: &'a mut S,
    pos: u64,
}

impl<'a, S: VolumeSource> RecordReader<'a, S> {
    pub fn new(src: &'a mut S) -> Self {
        Self { src, pos: 0 }
    }

    /// Moves to an absolute byte offset.
    pub fn seek(&mut self, offset: u64) {
        self.pos = offset;
    }

    /// Current absolute byte offset.
    pub fn position(&self) -> u64 {
        self.pos
    }

    /// Advances the position without reading.
    pub fn skip(&mut self, bytes: u64) {
        self.pos += bytes;
    }

    /// Reads exactly `n` bytes, failing with `UnexpectedEnd` on a short read.
    pub fn read_bytes(&mut self, n: usize) -> Result<Vec<u8>> {
        let mut buf = vec![0u8; n];
        self.src.read_exact_at(self.pos, &mut buf)?;
        self.pos += n as u64;
        Ok(buf)
    }

    /// Reads a fixed-size array.
    pub fn read_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut buf = [0u8; N];
        self.src.read_exact_at(self.pos, &mut buf)?;
        self.pos += N as u64;
        Ok(buf)
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        Ok(self.read_array::<1>()?[0])
    }

    pub fn read_u16(&mut self) -> Result<u16> {
        Ok(LittleEndian::read_u16(&self.read_array::<2>()?))
    }

    pub fn read_u32(&mut self) -> Result<u32> {
        Ok(LittleEndian::read_u32(&self.read_array::<4>()?))
    }

    pub fn read_u64(&mut self) -> Result<u64> {
        Ok(LittleEndian::read_u64(&self.read_array::<8>()?))
    }

    /// Reads `byte_len` bytes of UTF-16LE text, stripping NUL codepoints.
    ///
    /// `byte_len` comes from a preceding length field; callers pass it after
    /// decoding the fixed prefix of the record.
    pub fn read_utf16le(&mut self, byte_len: usize) -> Result<String> {
        let offset = self.pos;
        let bytes = self.read_bytes(byte_len)?;
        decode_utf16le(&bytes, offset)
    }
}

/// Reads a little-endian u16 at an absolute offset.
pub fn read_u16_at<S: VolumeSource>(src: &mut S, offset: u64) -> Result<u16> {
    let mut buf = [0u8; 2];
    src.read_exact_at(offset, &mut buf)?;
    Ok(LittleEndian::read_u16(&buf))
}

/// Reads a little-endian u32 at an absolute offset.
pub fn read_u32_at<S: VolumeSource>(src: &mut S, offset: u64) -> Result<u32> {
    let mut buf = [0u8; 4];
    src.read_exact_at(offset, &mut buf)?;
    Ok(LittleEndian::read_u32(&buf))
}

/// Reads a little-endian u64 at an absolute offset.
pub fn read_u64_at<S: VolumeSource>(src: &mut S, offset: u64) -> Result<u64> {
    let mut buf = [0u8; 8];
    src.read_exact_at(offset, &mut buf)?;
    Ok(LittleEndian::read_u64(&buf))
}

/// Decodes a UTF-16LE byte slice, stripping NUL codepoints.
pub fn decode_utf16le(bytes: &[u8], offset: u64) -> Result<String> {
    if bytes.len() % 2 != 0 {
        return Err(CoreError::Format {
            offset,
            reason: format!("UTF-16LE field has odd length {}", bytes.len()),
        });
    }
    let units: Vec<u16> = bytes
        .chunks_exact(2)
        .map(LittleEndian::read_u16)
        .filter(|&u| u != 0)
        .collect();
    String::from_utf16(&units).map_err(|_| CoreError::Format {
        offset,
        reason: "UTF-16LE field is not valid Unicode".into(),
    })
}
