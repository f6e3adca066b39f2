//! ReFS page headers, page references, Super Block, and Checkpoint.
//!
//! Every metadata structure lives in a cluster-aligned page opening with a
//! 0x50-byte header whose first four bytes identify the page kind. A page
//! reference is a 0x30-byte record whose leading u64 is the referenced
//! page's cluster number.

use crate::error::{CoreError, Result};
use crate::reader::{read_u32_at, read_u64_at};
use crate::refs::vbr::{Geometry, SUPER_BLOCK_CLUSTER};
use crate::source::VolumeSource;

/// Page header length.
pub const PAGE_HEADER_LEN: u64 = 0x50;

/// Page reference record length.
pub const PAGE_REFERENCE_LEN: u64 = 0x30;

pub const SIG_SUPER_BLOCK: [u8; 4] = *b"SUPB";
pub const SIG_CHECKPOINT: [u8; 4] = *b"CHKP";
pub const SIG_INDEX: [u8; 4] = *b"MSB+";

/// Checkpoint struct offsets (past the page header) of the three root page
/// reference pointers. The pointer values are offsets from the page base.
const CHECKPOINT_OBJECT_TABLE_REF: u64 = 68;
const CHECKPOINT_PARENT_CHILD_REF: u64 = 84;
const CHECKPOINT_CONTAINER_TABLE_REF: u64 = 96;

/// Offset (past the page header) of the primary checkpoint cluster within
/// the Super Block.
const SUPER_BLOCK_CHECKPOINT: u64 = 0x70;

/// Reads the 4-byte page signature of the page at `vcn`.
pub fn read_page_signature<S: VolumeSource>(
    src: &mut S,
    geom: &Geometry,
    vcn: u64,
) -> Result<[u8; 4]> {
    let mut sig = [0u8; 4];
    src.read_exact_at(geom.cluster_offset(vcn), &mut sig)?;
    Ok(sig)
}

/// Fails with `BadSignature` unless the page at `vcn` carries `expected`.
pub fn expect_page<S: VolumeSource>(
    src: &mut S,
    geom: &Geometry,
    vcn: u64,
    expected: [u8; 4],
    name: &'static str,
) -> Result<()> {
    let found = read_page_signature(src, geom, vcn)?;
    if found != expected {
        return Err(CoreError::BadSignature {
            expected: name,
            found,
            offset: geom.cluster_offset(vcn),
        });
    }
    Ok(())
}

/// Cluster number carried by the page reference at `offset`.
pub fn read_page_reference<S: VolumeSource>(src: &mut S, offset: u64) -> Result<u64> {
    read_u64_at(src, offset)
}

/// Reads the Super Block and returns the primary Checkpoint cluster.
pub fn read_super_block<S: VolumeSource>(src: &mut S, geom: &Geometry) -> Result<u64> {
    expect_page(src, geom, SUPER_BLOCK_CLUSTER, SIG_SUPER_BLOCK, "SUPB")?;
    let base = geom.cluster_offset(SUPER_BLOCK_CLUSTER);
    read_u64_at(src, base + PAGE_HEADER_LEN + SUPER_BLOCK_CHECKPOINT)
}

/// Root page clusters named by the Checkpoint.
#[derive(Debug, Clone, Copy)]
pub struct CheckpointRoots {
    pub object_table_lcn: u64,
    pub parent_child_lcn: u64,
    pub container_table_lcn: u64,
}

/// Reads the Checkpoint page and resolves its three catalog root references.
pub fn read_checkpoint<S: VolumeSource>(
    src: &mut S,
    geom: &Geometry,
    checkpoint_cluster: u64,
) -> Result<CheckpointRoots> {
    expect_page(src, geom, checkpoint_cluster, SIG_CHECKPOINT, "CHKP")?;
    let base = geom.cluster_offset(checkpoint_cluster);

    let mut root_at = |ref_pointer: u64| -> Result<u64> {
        let ref_offset = read_u32_at(src, base + PAGE_HEADER_LEN + ref_pointer)?;
        read_page_reference(src, base + ref_offset as u64)
    };

    Ok(CheckpointRoots {
        object_table_lcn: root_at(CHECKPOINT_OBJECT_TABLE_REF)?,
        parent_child_lcn: root_at(CHECKPOINT_PARENT_CHILD_REF)?,
        container_table_lcn: root_at(CHECKPOINT_CONTAINER_TABLE_REF)?,
    })
}
