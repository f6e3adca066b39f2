//! MFT entry and attribute layouts.
//!
//! An MFT entry is a 1 KiB record: a fixed header followed by a chain of
//! attributes, each opening with a 16-byte common header and closing the
//! chain with the 0xFFFFFFFF end marker. Parsing operates on the in-memory
//! entry buffer; only non-resident `$DATA` content requires going back to
//! the volume.

use crate::error::{CoreError, Result};
use crate::reader::decode_utf16le;
use byteorder::{ByteOrder, LittleEndian};

/// MFT entry size in bytes.
pub const ENTRY_SIZE: usize = 0x400;

/// Entry signature "FILE".
pub const ENTRY_SIGNATURE: [u8; 4] = *b"FILE";

/// Attribute type codes.
pub const ATTR_FILE_NAME: u32 = 0x30;
pub const ATTR_DATA: u32 = 0x80;
pub const ATTR_END: u32 = 0xFFFF_FFFF;

/// Entry flag value of an in-use entry bit; 0x0000 marks a deleted entry.
pub const FLAG_DELETED: u16 = 0x0000;

fn field<const N: usize>(buf: &[u8], off: usize, entry: u32) -> Result<&[u8]> {
    buf.get(off..off + N).ok_or_else(|| CoreError::MalformedAttribute {
        entry,
        reason: format!("field at {off:#x}+{N} runs past the entry"),
    })
}

fn le_u16(buf: &[u8], off: usize, entry: u32) -> Result<u16> {
    Ok(LittleEndian::read_u16(field::<2>(buf, off, entry)?))
}

fn le_u32(buf: &[u8], off: usize, entry: u32) -> Result<u32> {
    Ok(LittleEndian::read_u32(field::<4>(buf, off, entry)?))
}

/// Fixed header of an MFT entry.
#[derive(Debug, Clone)]
pub struct EntryHeader {
    pub signature: [u8; 4],
    pub attrs_offset: u16,
    pub flags: u16,
    pub used_size: u32,
    pub allocated_size: u32,
    pub entry_number: u32,
}

impl EntryHeader {
    pub fn parse(buf: &[u8]) -> Result<Self> {
        let mut signature = [0u8; 4];
        signature.copy_from_slice(field::<4>(buf, 0, 0)?);
        Ok(Self {
            signature,
            attrs_offset: le_u16(buf, 0x14, 0)?,
            flags: le_u16(buf, 0x16, 0)?,
            used_size: le_u32(buf, 0x18, 0)?,
            allocated_size: le_u32(buf, 0x1C, 0)?,
            entry_number: le_u32(buf, 0x2C, 0)?,
        })
    }

    pub fn is_file_record(&self) -> bool {
        self.signature == ENTRY_SIGNATURE
    }

    pub fn is_deleted(&self) -> bool {
        self.flags == FLAG_DELETED
    }
}

/// Common 16-byte attribute header.
#[derive(Debug, Clone)]
pub struct AttrHeader {
    pub type_code: u32,
    pub total_length: u32,
    pub non_resident: bool,
    pub name_length: u8,
    pub name_offset: u16,
    pub flags: u16,
    pub id: u16,
}

impl AttrHeader {
    pub fn parse(buf: &[u8], off: usize, entry: u32) -> Result<Self> {
        Ok(Self {
            type_code: le_u32(buf, off, entry)?,
            total_length: le_u32(buf, off + 0x04, entry)?,
            non_resident: field::<1>(buf, off + 0x08, entry)?[0] != 0,
            name_length: field::<1>(buf, off + 0x09, entry)?[0],
            name_offset: le_u16(buf, off + 0x0A, entry)?,
            flags: le_u16(buf, off + 0x0C, entry)?,
            id: le_u16(buf, off + 0x0E, entry)?,
        })
    }
}

/// Resident attribute payload location: (content offset, content size),
/// both relative to the attribute start / in bytes.
pub fn resident_content(buf: &[u8], attr_off: usize, entry: u32) -> Result<(usize, usize)> {
    let size = le_u32(buf, attr_off + 0x10, entry)? as usize;
    let offset = le_u16(buf, attr_off + 0x14, entry)? as usize;
    Ok((attr_off + offset, size))
}

/// Offset of a non-resident attribute's run list, relative to the entry.
pub fn runlist_offset(buf: &[u8], attr_off: usize, entry: u32) -> Result<usize> {
    Ok(attr_off + le_u16(buf, attr_off + 0x20, entry)? as usize)
}

/// Decodes the Unicode name out of a resident `$FILE_NAME` payload.
pub fn file_name(buf: &[u8], content_off: usize, entry: u32) -> Result<String> {
    let name_len = field::<1>(buf, content_off + 0x40, entry)?[0] as usize;
    let name_bytes = buf
        .get(content_off + 0x42..content_off + 0x42 + name_len * 2)
        .ok_or_else(|| CoreError::MalformedAttribute {
            entry,
            reason: "$FILE_NAME name runs past the entry".into(),
        })?;
    decode_utf16le(name_bytes, content_off as u64)
}
