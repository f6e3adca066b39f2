//! Interactive directory navigation over the catalogs.
//!
//! The session is a small state machine: a stack of visited directory
//! objects starting at the root (object id 0x600). Listings are produced on
//! demand by re-reading the directory page; nothing is cached, so a repeat
//! visit reflects exactly what the image holds.

use crate::error::Result;
use crate::refs::catalog::{Catalogs, ROOT_DIRECTORY_OBJECT_ID};
use crate::refs::directory::{read_directory_page, DirRow, FileRow};
use crate::refs::vbr::Geometry;
use crate::source::VolumeSource;

/// Message printed when ".." is entered at the root.
pub const MSG_ALREADY_AT_ROOT: &str = "Error: Already at the root directory.";

/// Message printed when a name does not match any listed directory.
pub fn not_found_message(name: &str) -> String {
    format!("Directory '{name}' not found.")
}

/// A file row resolved for display: its page VCN and the leading bytes of
/// its first extent.
#[derive(Debug, Clone)]
pub struct FileEntry {
    pub row: FileRow,
    /// VCN of the first extent.
    pub vcn: u64,
    /// First four bytes at that extent, when readable.
    pub signature: Option<[u8; 4]>,
}

/// One rendered directory listing.
#[derive(Debug)]
pub struct Listing {
    pub path: String,
    pub dirs: Vec<DirRow>,
    pub files: Vec<FileEntry>,
}

/// Result of feeding one input line to the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Descended,
    Ascended,
    /// ".." at the root; the caller reports [`MSG_ALREADY_AT_ROOT`].
    AtRoot,
    /// No listed directory carries this name.
    NotFound(String),
    Exited,
}

struct PathNode {
    object_id: u64,
    name: String,
}

/// Stateful walk over the directory tree of one ReFS volume.
pub struct NavigatorSession<'a, S: VolumeSource> {
    src: &'a mut S,
    geom: Geometry,
    catalogs: Catalogs,
    stack: Vec<PathNode>,
}

impl<'a, S: VolumeSource> NavigatorSession<'a, S> {
    pub fn new(src: &'a mut S, geom: Geometry, catalogs: Catalogs) -> Self {
        Self {
            src,
            geom,
            catalogs,
            stack: vec![PathNode {
                object_id: ROOT_DIRECTORY_OBJECT_ID,
                name: "Root".into(),
            }],
        }
    }

    /// Current location rendered as `.\Root\...`.
    pub fn path(&self) -> String {
        let names: Vec<&str> = self.stack.iter().map(|n| n.name.as_str()).collect();
        format!(".\\{}", names.join("\\"))
    }

    pub fn current_object_id(&self) -> u64 {
        self.stack
            .last()
            .map(|n| n.object_id)
            .unwrap_or(ROOT_DIRECTORY_OBJECT_ID)
    }

    /// Reads the current directory fresh from the image and produces its
    /// listing: page rows unioned with adjacency-only children.
    pub fn list(&mut self) -> Result<Listing> {
        let object_id = self.current_object_id();
        let lcn = self.catalogs.objects.lcn_of(object_id)?;
        let vcn = self.catalogs.containers.lcn_to_vcn(&self.geom, lcn)?;
        let page = read_directory_page(self.src, &self.geom, vcn)?;

        let mut dirs = page.dirs;
        for &child in self.catalogs.children.children_of(object_id) {
            if !dirs.iter().any(|d| d.object_id == child) {
                dirs.push(DirRow::adjacency_only(child));
            }
        }

        let mut files = Vec::with_capacity(page.files.len());
        for row in page.files {
            let vcn = self.catalogs.containers.lcn_to_vcn(&self.geom, row.first_lcn)?;
            let signature = match self.read_signature(vcn) {
                Ok(sig) => Some(sig),
                Err(err) => {
                    log::warn!("cannot read first extent of '{}': {err}", row.name);
                    None
                }
            };
            files.push(FileEntry {
                row,
                vcn,
                signature,
            });
        }

        Ok(Listing {
            path: self.path(),
            dirs,
            files,
        })
    }

    fn read_signature(&mut self, vcn: u64) -> Result<[u8; 4]> {
        let mut sig = [0u8; 4];
        self.src
            .read_exact_at(self.geom.cluster_offset(vcn), &mut sig)?;
        Ok(sig)
    }

    /// Applies one line of user input.
    pub fn handle_line(&mut self, line: &str) -> Result<Outcome> {
        match line.trim() {
            "exit" => Ok(Outcome::Exited),
            ".." => {
                if self.stack.len() <= 1 {
                    Ok(Outcome::AtRoot)
                } else {
                    self.stack.pop();
                    Ok(Outcome::Ascended)
                }
            }
            name => {
                // Resolve against a fresh listing of the current page.
                let listing = self.list()?;
                match listing.dirs.iter().find(|d| d.name == name) {
                    Some(dir) => {
                        self.stack.push(PathNode {
                            object_id: dir.object_id,
                            name: dir.name.clone(),
                        });
                        Ok(Outcome::Descended)
                    }
                    None => Ok(Outcome::NotFound(name.to_string())),
                }
            }
        }
    }
}
