//! B+-tree page index walking.
//!
//! Every "MSB+" page hosts the same index skeleton: an Index Root right
//! after the page header, an Index Header it points at, and an array of
//! 4-byte key pointers whose low 16 bits locate the 14-byte index entries
//! within the header region. What the (key, value) pair of an entry means
//! depends on the table the page belongs to, so the walk dispatches on a
//! sum type carrying each table kind's accumulator.

use crate::error::{CoreError, Result};
use crate::reader::{decode_utf16le, read_u16_at, read_u32_at, read_u64_at};
use crate::refs::catalog::{ChildrenMap, ContainerMap, ObjectMap};
use crate::refs::directory::{DirRow, DirectoryPage, FileRow, Origin};
use crate::refs::page::{expect_page, PAGE_HEADER_LEN, SIG_INDEX};
use crate::refs::vbr::Geometry;
use crate::filetime::Filetime;
use crate::source::VolumeSource;

/// Index-entry key tag of a file record in a Directory Table page.
pub const KEY_TAG_FILE: u32 = 0x10030;

/// Index-entry key tag of a sub-directory record in a Directory Table page.
pub const KEY_TAG_DIRECTORY: u32 = 0x20030;

/// Container Table record: starting cluster field offset within the value.
const CONTAINER_RECORD_START_CLUSTER: u64 = 0x90;

/// Object Table value: the page reference follows a 0x20-byte prefix.
const OBJECT_VALUE_PAGE_REFERENCE: u64 = 0x20;

/// Parent-Child Table entry: field offsets within the raw 0x30-byte entry.
const PARENT_CHILD_PARENT: u64 = 0x18;
const PARENT_CHILD_CHILD: u64 = 0x28;

/// The per-table decode target of an index walk.
pub enum TableSink<'a> {
    /// Outer Container Table: values are page references to leaf pages.
    ContainerRoot(&'a mut ContainerMap),
    /// Container Table leaf: values are container records.
    ContainerLeaf(&'a mut ContainerMap),
    /// Object ID Table: object id → root page LCN.
    ObjectTable(&'a mut ObjectMap),
    /// Parent-Child Table: (parent, child) object id pairs.
    ParentChild(&'a mut ChildrenMap),
    /// Directory Table: file and sub-directory rows.
    Directory(&'a mut DirectoryPage),
}

/// One 14-byte index entry header. Key and value offsets are relative to
/// the entry start.
#[derive(Debug, Clone, Copy)]
pub struct IndexEntry {
    pub entry_length: u32,
    pub key_offset: u16,
    pub key_length: u16,
    pub flags: u16,
    pub value_offset: u16,
    pub value_length: u16,
}

impl IndexEntry {
    fn read<S: VolumeSource>(src: &mut S, offset: u64) -> Result<Self> {
        Ok(Self {
            entry_length: read_u32_at(src, offset)?,
            key_offset: read_u16_at(src, offset + 0x04)?,
            key_length: read_u16_at(src, offset + 0x06)?,
            flags: read_u16_at(src, offset + 0x08)?,
            value_offset: read_u16_at(src, offset + 0x0A)?,
            value_length: read_u16_at(src, offset + 0x0C)?,
        })
    }
}

/// Walks the index of the "MSB+" page at `page_vcn`, feeding each entry to
/// `sink`.
///
/// Catalog tables treat any decode failure as fatal; Directory Table rows
/// degrade to a warning so one damaged record does not hide a listing.
pub fn walk_index<S: VolumeSource>(
    src: &mut S,
    geom: &Geometry,
    page_vcn: u64,
    sink: &mut TableSink<'_>,
) -> Result<()> {
    expect_page(src, geom, page_vcn, SIG_INDEX, "MSB+")?;
    let root = geom.cluster_offset(page_vcn) + PAGE_HEADER_LEN;

    let header = root + read_u32_at(src, root)? as u64;
    let keys_offset = read_u32_at(src, header + 0x10)? as u64;
    let entry_count = read_u32_at(src, header + 0x14)?;

    for k in 0..entry_count {
        let key_pointer = read_u32_at(src, header + keys_offset + 4 * k as u64)?;
        let entry_base = header + (key_pointer & 0xFFFF) as u64;
        let entry = IndexEntry::read(src, entry_base)?;

        match sink {
            TableSink::ContainerRoot(map) => {
                let leaf_cluster = read_u64_at(src, entry_base + entry.value_offset as u64)?;
                walk_index(
                    src,
                    geom,
                    leaf_cluster,
                    &mut TableSink::ContainerLeaf(&mut **map),
                )?;
            }
            TableSink::ContainerLeaf(map) => {
                let value = entry_base + entry.value_offset as u64;
                let container_key = read_u64_at(src, value)?;
                let start_cluster =
                    read_u64_at(src, value + CONTAINER_RECORD_START_CLUSTER)?;
                map.insert(container_key, start_cluster);
            }
            TableSink::ObjectTable(map) => {
                let object_id = read_u64_at(src, entry_base + entry.key_offset as u64 + 8)?;
                let lcn = read_u64_at(
                    src,
                    entry_base + entry.value_offset as u64 + OBJECT_VALUE_PAGE_REFERENCE,
                )?;
                map.insert(object_id, lcn);
            }
            TableSink::ParentChild(map) => {
                let parent = read_u64_at(src, entry_base + PARENT_CHILD_PARENT)?;
                let child = read_u64_at(src, entry_base + PARENT_CHILD_CHILD)?;
                map.add(parent, child);
            }
            TableSink::Directory(page) => {
                if let Err(err) = decode_directory_entry(src, entry_base, &entry, page) {
                    log::warn!(
                        "skipping directory index entry at {entry_base:#x}: {err}"
                    );
                }
            }
        }
    }
    Ok(())
}

/// Decodes one Directory Table entry into a file or sub-directory row,
/// keyed by the entry's tag.
fn decode_directory_entry<S: VolumeSource>(
    src: &mut S,
    entry_base: u64,
    entry: &IndexEntry,
    page: &mut DirectoryPage,
) -> Result<()> {
    let key = entry_base + entry.key_offset as u64;
    let tag = read_u32_at(src, key)?;
    let name = entry_name(src, key, entry.key_length)?;
    let value = entry_base + entry.value_offset as u64;

    match tag {
        KEY_TAG_DIRECTORY => {
            let object_id = read_u64_at(src, value + 0x08)?;
            let accessed = Filetime(read_u64_at(src, value + 0x18)?);
            page.dirs.push(DirRow {
                name,
                object_id,
                accessed,
                origin: Origin::PageListed,
            });
        }
        KEY_TAG_FILE => {
            let accessed = Filetime(read_u64_at(src, value)?);
            let logical_size = read_u64_at(src, value + 0x08)?;
            let first_lcn = read_u64_at(src, value + 0x10)?;
            page.files.push(FileRow {
                name,
                accessed,
                logical_size,
                first_lcn,
            });
        }
        other => {
            return Err(CoreError::Format {
                offset: key,
                reason: format!("unknown directory index key tag {other:#x}"),
            });
        }
    }
    Ok(())
}

/// The UTF-16LE name filling the key area past the 4-byte tag.
fn entry_name<S: VolumeSource>(src: &mut S, key: u64, key_length: u16) -> Result<String> {
    let name_len = (key_length as usize).saturating_sub(4);
    let mut bytes = vec![0u8; name_len];
    src.read_exact_at(key + 4, &mut bytes)?;
    decode_utf16le(&bytes, key + 4)
}
