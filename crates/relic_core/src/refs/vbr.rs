//! ReFS volume boot record parsing.

use crate::error::{CoreError, Result};
use crate::reader::RecordReader;
use crate::source::VolumeSource;

/// Cluster hosting the Super Block, by on-disk convention.
pub const SUPER_BLOCK_CLUSTER: u64 = 0x1E;

/// Volume geometry derived from the VBR.
#[derive(Debug, Clone, Copy)]
pub struct Geometry {
    pub sector_size: u32,
    pub cluster_size: u32,
    pub container_size: u64,
    pub clusters_per_container: u64,
    /// log2 of `clusters_per_container`.
    pub container_shift: u32,
}

impl Geometry {
    /// Byte offset of a volume cluster.
    pub fn cluster_offset(&self, vcn: u64) -> u64 {
        vcn * self.cluster_size as u64
    }
}

/// Reads the VBR at offset 0 and derives the volume geometry.
///
/// Only ReFS 3.x is understood; other versions fail with `WrongVersion`.
/// The container size must be a whole power-of-two multiple of the cluster
/// size for the container-key arithmetic to be meaningful.
pub fn read_vbr<S: VolumeSource>(src: &mut S) -> Result<Geometry> {
    let mut r = RecordReader::new(src);
    r.seek(0);

    let _jump = r.read_array::<3>()?;
    let fs_name = r.read_array::<8>()?;
    if &fs_name[..4] != b"ReFS" {
        let mut found = [0u8; 4];
        found.copy_from_slice(&fs_name[..4]);
        return Err(CoreError::BadSignature {
            expected: "ReFS",
            found,
            offset: 3,
        });
    }

    r.seek(0x20);
    let sector_size = r.read_u32()?;
    let sectors_per_cluster = r.read_u32()?;
    let major = r.read_u8()?;
    let minor = r.read_u8()?;
    if major != 3 {
        return Err(CoreError::WrongVersion { major, minor });
    }

    r.seek(0x40);
    let container_size = r.read_u64()?;

    let cluster_size = sector_size
        .checked_mul(sectors_per_cluster)
        .filter(|&size| size > 0 && container_size > 0)
        .ok_or_else(|| CoreError::Format {
            offset: 0x20,
            reason: "VBR reports an unusable cluster or container size".into(),
        })?;
    let clusters_per_container = container_size / cluster_size as u64;
    if !clusters_per_container.is_power_of_two() {
        return Err(CoreError::Format {
            offset: 0x40,
            reason: format!(
                "container holds {clusters_per_container} clusters, which is not a power of two"
            ),
        });
    }

    Ok(Geometry {
        sector_size,
        cluster_size,
        container_size,
        clusters_per_container,
        container_shift: clusters_per_container.trailing_zeros(),
    })
}
