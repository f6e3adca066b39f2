//! Directory page contents: the file and sub-directory rows of one
//! directory object.

use crate::error::Result;
use crate::filetime::Filetime;
use crate::refs::index::{walk_index, TableSink};
use crate::refs::vbr::Geometry;
use crate::source::VolumeSource;

/// How a directory row was discovered.
///
/// Rows normally come from the directory's own page. A child known only
/// from the Parent-Child table marks a partially recovered tree and is
/// listed with a placeholder name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    PageListed,
    AdjacencyOnly,
}

/// A sub-directory row.
#[derive(Debug, Clone)]
pub struct DirRow {
    pub name: String,
    pub object_id: u64,
    pub accessed: Filetime,
    pub origin: Origin,
}

impl DirRow {
    /// Placeholder row for a child present in the adjacency but absent from
    /// the page listing.
    pub fn adjacency_only(object_id: u64) -> Self {
        Self {
            name: format!("Unknown (Object ID: {object_id:#x})"),
            object_id,
            accessed: Filetime(0),
            origin: Origin::AdjacencyOnly,
        }
    }
}

/// A file row.
#[derive(Debug, Clone)]
pub struct FileRow {
    pub name: String,
    pub accessed: Filetime,
    pub logical_size: u64,
    /// LCN of the file's first extent.
    pub first_lcn: u64,
}

/// Decoded rows of one directory page.
#[derive(Debug, Default)]
pub struct DirectoryPage {
    pub dirs: Vec<DirRow>,
    pub files: Vec<FileRow>,
}

/// Decodes the directory page at `vcn`. Individual rows that fail to decode
/// are skipped with a warning; a page without the index signature is fatal.
pub fn read_directory_page<S: VolumeSource>(
    src: &mut S,
    geom: &Geometry,
    vcn: u64,
) -> Result<DirectoryPage> {
    let mut page = DirectoryPage::default();
    walk_index(src, geom, vcn, &mut TableSink::Directory(&mut page))?;
    Ok(page)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_adjacency_only_placeholder_name() {
        let row = DirRow::adjacency_only(0x702);
        assert_eq!(row.name, "Unknown (Object ID: 0x702)");
        assert_eq!(row.origin, Origin::AdjacencyOnly);
        assert_eq!(row.accessed, Filetime(0));
    }
}
