//! Deleted-file recovery over the MFT.
//!
//! The scan locates every NTFS partition through the MBR, sizes the MFT from
//! `$MFT`'s own first data run, and walks the 1 KiB entries looking for
//! "FILE" records whose flags mark them deleted. `$FILE_NAME` supplies the
//! output name, `$DATA` the content, either inline or materialized from the
//! run list.

use crate::error::{CoreError, Result};
use crate::mbr::{walk_partitions, PartitionKind};
use crate::ntfs::boot::NtfsBoot;
use crate::ntfs::mft::{
    self, AttrHeader, EntryHeader, ATTR_DATA, ATTR_END, ATTR_FILE_NAME, ENTRY_SIZE,
};
use crate::runlist::{run_byte_len, RunItem, RunListParser};
use crate::source::VolumeSource;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};

/// Default sector size for MBR-partitioned images.
pub const SECTOR_SIZE: u32 = 512;

/// One file written to the output directory.
#[derive(Debug, Clone)]
pub struct RecoveredFile {
    pub entry_number: u32,
    pub name: String,
    pub bytes: u64,
}

/// Summary of a recovery run.
#[derive(Debug, Default)]
pub struct RecoveryOutcome {
    pub partitions_scanned: usize,
    pub entries_scanned: u64,
    pub files: Vec<RecoveredFile>,
}

/// Scans every NTFS partition of `src` and writes each recoverable deleted
/// file to `out_dir`, overwriting leftovers from earlier runs.
///
/// `cancel` is polled between entries; `progress` receives
/// (entries scanned, entries total) for the partition being walked.
pub fn recover_deleted<S, F>(
    src: &mut S,
    out_dir: &Path,
    cancel: &AtomicBool,
    mut progress: F,
) -> Result<RecoveryOutcome>
where
    S: VolumeSource,
    F: FnMut(u64, u64),
{
    std::fs::create_dir_all(out_dir)?;

    let partitions = walk_partitions(src, SECTOR_SIZE)?;
    let mut outcome = RecoveryOutcome::default();

    for partition in partitions {
        if partition.kind != PartitionKind::Ntfs {
            continue;
        }
        outcome.partitions_scanned += 1;
        recover_partition(
            src,
            partition.start_sector,
            out_dir,
            cancel,
            &mut progress,
            &mut outcome,
        )?;
        if cancel.load(Ordering::Relaxed) {
            break;
        }
    }

    Ok(outcome)
}

fn recover_partition<S, F>(
    src: &mut S,
    partition_start: u64,
    out_dir: &Path,
    cancel: &AtomicBool,
    progress: &mut F,
    outcome: &mut RecoveryOutcome,
) -> Result<()>
where
    S: VolumeSource,
    F: FnMut(u64, u64),
{
    let boot = NtfsBoot::read(src, partition_start, SECTOR_SIZE)?;
    let spc = boot.sectors_per_cluster;
    let mft_base = boot.mft_start_sector(partition_start) * SECTOR_SIZE as u64;

    let entry0 = read_entry(src, mft_base)?;
    let mft_clusters = mft_data_clusters(&entry0)?;
    // 1 KiB entries, four per cluster under the standard geometry.
    let total_entries = mft_clusters * 4;
    log::debug!(
        "partition at sector {partition_start}: MFT spans {mft_clusters} clusters, \
         walking {total_entries} entries"
    );

    for i in 1..total_entries {
        if cancel.load(Ordering::Relaxed) {
            log::warn!("scan cancelled after {i} entries");
            return Ok(());
        }
        let buf = read_entry(src, mft_base + i * ENTRY_SIZE as u64)?;
        outcome.entries_scanned += 1;
        progress(i, total_entries - 1);

        let header = match EntryHeader::parse(&buf) {
            Ok(h) => h,
            Err(_) => continue,
        };
        if !header.is_file_record() || !header.is_deleted() {
            continue;
        }

        match extract_entry(src, &buf, &header, partition_start, spc) {
            Ok(Some((name, data))) => {
                let target = out_dir.join(&name);
                std::fs::write(&target, &data)?;
                log::info!(
                    "recovered '{}' ({} bytes) from MFT entry {}",
                    name,
                    data.len(),
                    header.entry_number
                );
                outcome.files.push(RecoveredFile {
                    entry_number: header.entry_number,
                    name,
                    bytes: data.len() as u64,
                });
            }
            Ok(None) => {}
            Err(CoreError::MalformedAttribute { entry, reason }) => {
                log::warn!("skipping MFT entry {entry}: {reason}");
            }
            Err(other) => return Err(other),
        }
    }
    Ok(())
}

fn read_entry<S: VolumeSource>(src: &mut S, offset: u64) -> Result<Vec<u8>> {
    let mut buf = vec![0u8; ENTRY_SIZE];
    src.read_exact_at(offset, &mut buf)?;
    Ok(buf)
}

/// Length in clusters of the MFT itself, taken from the first run of
/// `$MFT`'s non-resident `$DATA` attribute in entry 0.
fn mft_data_clusters(entry0: &[u8]) -> Result<u64> {
    let header = EntryHeader::parse(entry0)?;
    if !header.is_file_record() {
        let mut found = [0u8; 4];
        found.copy_from_slice(&entry0[..4]);
        return Err(CoreError::BadSignature {
            expected: "FILE",
            found,
            offset: 0,
        });
    }

    let mut off = header.attrs_offset as usize;
    loop {
        let attr = AttrHeader::parse(entry0, off, 0)?;
        if attr.type_code == ATTR_END {
            return Err(CoreError::Format {
                offset: 0,
                reason: "$MFT entry carries no non-resident $DATA attribute".into(),
            });
        }
        if attr.type_code == ATTR_DATA && attr.non_resident {
            let runs_at = mft::runlist_offset(entry0, off, 0)?;
            let mut parser = RunListParser::new(&entry0[runs_at..], 0);
            return match parser.next_run()? {
                RunItem::Run {
                    length_clusters, ..
                } => Ok(length_clusters),
                RunItem::Terminator => Err(CoreError::Format {
                    offset: 0,
                    reason: "$MFT data run list is empty".into(),
                }),
            };
        }
        off = advance(off, &attr, header.entry_number)?;
    }
}

fn advance(off: usize, attr: &AttrHeader, entry: u32) -> Result<usize> {
    let next = off + attr.total_length as usize;
    if attr.total_length < 0x10 || next > ENTRY_SIZE {
        return Err(CoreError::MalformedAttribute {
            entry,
            reason: format!("attribute length {:#x} leaves the entry", attr.total_length),
        });
    }
    Ok(next)
}

/// Pulls the name and content of one deleted entry. `None` when the entry
/// lacks either a `$FILE_NAME` or a `$DATA` attribute.
fn extract_entry<S: VolumeSource>(
    src: &mut S,
    buf: &[u8],
    header: &EntryHeader,
    partition_start: u64,
    spc: u8,
) -> Result<Option<(String, Vec<u8>)>> {
    let entry = header.entry_number;
    let mut name: Option<String> = None;
    let mut data: Option<Vec<u8>> = None;

    let mut off = header.attrs_offset as usize;
    loop {
        let attr = AttrHeader::parse(buf, off, entry)?;
        if attr.type_code == ATTR_END {
            break;
        }
        match attr.type_code {
            ATTR_FILE_NAME => {
                if attr.non_resident {
                    return Err(CoreError::MalformedAttribute {
                        entry,
                        reason: "$FILE_NAME has the non-resident flag set".into(),
                    });
                }
                let (content_off, _) = mft::resident_content(buf, off, entry)?;
                name = Some(mft::file_name(buf, content_off, entry)?);
            }
            ATTR_DATA => {
                data = Some(if attr.non_resident {
                    read_data_runs(src, buf, off, entry, partition_start, spc)?
                } else {
                    let (content_off, size) = mft::resident_content(buf, off, entry)?;
                    buf.get(content_off..content_off + size)
                        .ok_or_else(|| CoreError::MalformedAttribute {
                            entry,
                            reason: "resident $DATA runs past the entry".into(),
                        })?
                        .to_vec()
                });
            }
            _ => {}
        }
        off = advance(off, &attr, entry)?;
    }

    match (name, data) {
        (Some(name), Some(data)) => match sanitize_name(&name) {
            Some(clean) => Ok(Some((clean, data))),
            None => {
                log::warn!("entry {entry} has unusable file name '{name}'");
                Ok(None)
            }
        },
        _ => Ok(None),
    }
}

/// Materializes non-resident `$DATA`: each run contributes
/// `length * sectors_per_cluster * sector_size` bytes read at the run's
/// starting cluster within the partition.
fn read_data_runs<S: VolumeSource>(
    src: &mut S,
    buf: &[u8],
    attr_off: usize,
    entry: u32,
    partition_start: u64,
    spc: u8,
) -> Result<Vec<u8>> {
    let runs_at = mft::runlist_offset(buf, attr_off, entry)?;
    let mut parser = RunListParser::new(&buf[runs_at..], entry);
    let mut content = Vec::new();

    loop {
        match parser.next_run()? {
            RunItem::Terminator => break,
            RunItem::Run {
                length_clusters,
                offset_clusters,
            } => {
                let byte_len = run_byte_len(length_clusters, spc, SECTOR_SIZE);
                let start =
                    (partition_start + offset_clusters * spc as u64) * SECTOR_SIZE as u64;
                let mut extent = vec![0u8; byte_len as usize];
                src.read_exact_at(start, &mut extent)?;
                content.extend_from_slice(&extent);
            }
        }
    }
    Ok(content)
}

/// Keeps recovered names inside the output directory.
fn sanitize_name(name: &str) -> Option<String> {
    let clean: String = name
        .chars()
        .map(|c| if c == '/' || c == '\\' { '_' } else { c })
        .collect();
    match clean.as_str() {
        "" | "." | ".." => None,
        _ => Some(clean),
    }
}
