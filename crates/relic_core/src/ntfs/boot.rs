//! NTFS boot sector (BIOS Parameter Block) parsing.

use crate::error::{CoreError, Result};
use crate::reader::RecordReader;
use crate::source::VolumeSource;

/// Boot sector OEM id "NTFS    "
const NTFS_OEM_ID: [u8; 8] = *b"NTFS    ";

/// The BPB fields this tool consumes, read from the first sector of an NTFS
/// partition.
#[derive(Debug, Clone)]
pub struct NtfsBoot {
    pub jump: [u8; 3],
    pub oem_id: [u8; 8],
    pub bytes_per_sector: u16,
    pub sectors_per_cluster: u8,
    pub total_sectors: u64,
    pub mft_lcn: u64,
    pub mft_mirror_lcn: u64,
}

impl NtfsBoot {
    /// Reads the BPB at `partition_start_sector`.
    pub fn read<S: VolumeSource>(
        src: &mut S,
        partition_start_sector: u64,
        sector_size: u32,
    ) -> Result<Self> {
        let base = partition_start_sector * sector_size as u64;
        let mut r = RecordReader::new(src);
        r.seek(base);

        let jump = r.read_array::<3>()?;
        let oem_id = r.read_array::<8>()?;
        let bytes_per_sector = r.read_u16()?;
        let sectors_per_cluster = r.read_u8()?;
        r.seek(base + 0x28);
        let total_sectors = r.read_u64()?;
        let mft_lcn = r.read_u64()?;
        let mft_mirror_lcn = r.read_u64()?;

        let boot = Self {
            jump,
            oem_id,
            bytes_per_sector,
            sectors_per_cluster,
            total_sectors,
            mft_lcn,
            mft_mirror_lcn,
        };
        if !boot.is_valid() {
            return Err(CoreError::Format {
                offset: base,
                reason: "sector does not carry a valid NTFS BPB".into(),
            });
        }
        Ok(boot)
    }

    fn is_valid(&self) -> bool {
        self.oem_id == NTFS_OEM_ID
            && self.bytes_per_sector >= 512
            && self.sectors_per_cluster > 0
            && self.total_sectors > 0
    }

    /// First sector of the MFT, absolute within the image.
    pub fn mft_start_sector(&self, partition_start_sector: u64) -> u64 {
        partition_start_sector + self.mft_lcn * self.sectors_per_cluster as u64
    }

    /// Multi-line BPB summary for `mbr-print`.
    pub fn describe(&self, partition_start_sector: u64) -> String {
        let hex = |b: &[u8]| {
            b.iter()
                .map(|x| format!("{x:02x}"))
                .collect::<Vec<_>>()
                .join(" ")
        };
        let spc = self.sectors_per_cluster as u64;
        format!(
            "========= NTFS File System =========\n\
             Jump Boot Code : {} (Hex)\n\
             OEM ID : {} / {} (String / Hex)\n\
             Bytes Per Sector : {}\n\
             Sectors per Cluster : {}\n\
             Total Sector Count : {}\n\
             Starting for $MFT : {} / {} (Cluster / Sector)\n\
             Starting for $MFTMirr : {} / {} (Cluster / Sector)",
            hex(&self.jump),
            String::from_utf8_lossy(&self.oem_id).trim_end(),
            hex(&self.oem_id),
            self.bytes_per_sector,
            self.sectors_per_cluster,
            self.total_sectors,
            partition_start_sector / spc + self.mft_lcn,
            self.mft_start_sector(partition_start_sector),
            partition_start_sector / spc + self.mft_mirror_lcn,
            partition_start_sector + self.mft_mirror_lcn * spc,
        )
    }
}
