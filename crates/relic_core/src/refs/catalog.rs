//! The three catalogs built from the checkpoint: Container map, Object-ID
//! map, and Parent-Child adjacency.
//!
//! Construction order matters: the Container map enables LCN→VCN
//! translation, which the other two walks depend on. Once built the
//! catalogs are immutable for the rest of the analysis; the navigator only
//! reads them.

use crate::error::{CoreError, Result};
use crate::refs::index::{walk_index, TableSink};
use crate::refs::page::{read_checkpoint, read_super_block};
use crate::refs::vbr::Geometry;
use crate::source::VolumeSource;
use std::collections::BTreeMap;

/// Object id of the root directory.
pub const ROOT_DIRECTORY_OBJECT_ID: u64 = 0x600;

/// Container Table contents: container key → starting volume cluster.
///
/// The key is the high-bit partition of a cluster address:
/// `key = lcn >> (container_shift + 1)`.
#[derive(Debug, Default)]
pub struct ContainerMap {
    entries: BTreeMap<u64, u64>,
}

impl ContainerMap {
    pub fn insert(&mut self, container_key: u64, start_cluster: u64) {
        self.entries.insert(container_key, start_cluster);
    }

    pub fn start_cluster(&self, container_key: u64) -> Option<u64> {
        self.entries.get(&container_key).copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (u64, u64)> + '_ {
        self.entries.iter().map(|(&k, &v)| (k, v))
    }

    /// Translates a logical cluster number into a volume cluster number.
    ///
    /// A key absent from the table means the image is inconsistent with its
    /// own checkpoint, which is fatal.
    pub fn lcn_to_vcn(&self, geom: &Geometry, lcn: u64) -> Result<u64> {
        let key = lcn >> (geom.container_shift + 1);
        let start = self
            .start_cluster(key)
            .ok_or(CoreError::UnknownContainerKey(key))?;
        Ok(start + (lcn & (geom.clusters_per_container - 1)))
    }
}

/// Object ID Table contents: object id → LCN of the object's root page.
#[derive(Debug, Default)]
pub struct ObjectMap {
    entries: BTreeMap<u64, u64>,
}

impl ObjectMap {
    pub fn insert(&mut self, object_id: u64, lcn: u64) {
        self.entries.insert(object_id, lcn);
    }

    pub fn lcn_of(&self, object_id: u64) -> Result<u64> {
        self.entries
            .get(&object_id)
            .copied()
            .ok_or(CoreError::UnknownObjectId(object_id))
    }

    pub fn contains(&self, object_id: u64) -> bool {
        self.entries.contains_key(&object_id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Parent-Child Table contents: parent object id → child object ids.
#[derive(Debug, Default)]
pub struct ChildrenMap {
    edges: BTreeMap<u64, Vec<u64>>,
}

impl ChildrenMap {
    pub fn add(&mut self, parent: u64, child: u64) {
        self.edges.entry(parent).or_default().push(child);
    }

    pub fn children_of(&self, parent: u64) -> &[u64] {
        self.edges.get(&parent).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn iter(&self) -> impl Iterator<Item = (u64, &[u64])> + '_ {
        self.edges.iter().map(|(&p, c)| (p, c.as_slice()))
    }
}

/// The immutable lookup state of one analysis run.
#[derive(Debug, Default)]
pub struct Catalogs {
    pub containers: ContainerMap,
    pub objects: ObjectMap,
    pub children: ChildrenMap,
}

impl Catalogs {
    /// Walks Super Block → Checkpoint → the three table roots.
    pub fn build<S: VolumeSource>(src: &mut S, geom: &Geometry) -> Result<Self> {
        let checkpoint_cluster = read_super_block(src, geom)?;
        let roots = read_checkpoint(src, geom, checkpoint_cluster)?;
        log::debug!(
            "checkpoint at cluster {checkpoint_cluster:#x}: container table {:#x}, \
             object table {:#x}, parent-child table {:#x}",
            roots.container_table_lcn,
            roots.object_table_lcn,
            roots.parent_child_lcn
        );

        let mut containers = ContainerMap::default();
        walk_index(
            src,
            geom,
            roots.container_table_lcn,
            &mut TableSink::ContainerRoot(&mut containers),
        )?;

        let mut objects = ObjectMap::default();
        let object_table_vcn = containers.lcn_to_vcn(geom, roots.object_table_lcn)?;
        walk_index(
            src,
            geom,
            object_table_vcn,
            &mut TableSink::ObjectTable(&mut objects),
        )?;

        let mut children = ChildrenMap::default();
        let parent_child_vcn = containers.lcn_to_vcn(geom, roots.parent_child_lcn)?;
        walk_index(
            src,
            geom,
            parent_child_vcn,
            &mut TableSink::ParentChild(&mut children),
        )?;

        log::debug!(
            "catalogs: {} containers, {} objects",
            containers.len(),
            objects.len()
        );
        Ok(Self {
            containers,
            objects,
            children,
        })
    }
}
