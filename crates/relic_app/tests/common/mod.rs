//! Synthetic volume image builders shared by the integration tests.
//!
//! Every image is built in memory, then written to a temp file and read
//! back through the real `VolumeSource` adapters.

#![allow(dead_code)]

use std::io::Write;
use tempfile::NamedTempFile;

pub const SECTOR_SIZE: usize = 512;
pub const SPC: u8 = 8;
pub const CLUSTER_SIZE: usize = SECTOR_SIZE * SPC as usize;

/// Sample FILETIME: 2023-06-16 18:00:56 UTC.
pub const SAMPLE_FILETIME: u64 = 0x01d9a07c80000000;

pub fn put_u16(buf: &mut [u8], at: usize, v: u16) {
    buf[at..at + 2].copy_from_slice(&v.to_le_bytes());
}

pub fn put_u32(buf: &mut [u8], at: usize, v: u32) {
    buf[at..at + 4].copy_from_slice(&v.to_le_bytes());
}

pub fn put_u64(buf: &mut [u8], at: usize, v: u64) {
    buf[at..at + 8].copy_from_slice(&v.to_le_bytes());
}

pub fn utf16le(text: &str) -> Vec<u8> {
    text.encode_utf16().flat_map(u16::to_le_bytes).collect()
}

/// Writes an image to a temp file for reading through `relic_io`.
pub fn write_image(image: &[u8]) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("temp file");
    file.write_all(image).expect("write image");
    file.flush().expect("flush image");
    file
}

// ---------------------------------------------------------------------------
// MBR + NTFS fixtures
// ---------------------------------------------------------------------------

/// Absolute starting sector of the fixture's NTFS partition.
pub const PARTITION_SECTOR: u64 = 2048;
pub const PARTITION_BYTES: usize = PARTITION_SECTOR as usize * SECTOR_SIZE;
/// MFT start cluster within the partition.
pub const MFT_LCN: u64 = 4;

fn round8(n: usize) -> usize {
    (n + 7) & !7
}

pub fn mbr_partition_entry(boot: u8, kind: u8, start_lba: u32, size: u32) -> [u8; 16] {
    let mut e = [0u8; 16];
    e[0] = boot;
    e[1..4].copy_from_slice(&[0x01, 0x01, 0x00]);
    e[4] = kind;
    e[5..8].copy_from_slice(&[0xFE, 0xFF, 0xFF]);
    e[8..12].copy_from_slice(&start_lba.to_le_bytes());
    e[12..16].copy_from_slice(&size.to_le_bytes());
    e
}

fn attr_common(type_code: u32, total_length: u32, non_resident: u8) -> [u8; 16] {
    let mut h = [0u8; 16];
    put_u32(&mut h, 0, type_code);
    put_u32(&mut h, 4, total_length);
    h[8] = non_resident;
    h
}

fn resident_attr(type_code: u32, content: &[u8]) -> Vec<u8> {
    let total = round8(0x18 + content.len());
    let mut attr = vec![0u8; total];
    attr[..16].copy_from_slice(&attr_common(type_code, total as u32, 0));
    put_u32(&mut attr, 0x10, content.len() as u32);
    put_u16(&mut attr, 0x14, 0x18);
    attr[0x18..0x18 + content.len()].copy_from_slice(content);
    attr
}

/// Resident `$FILE_NAME` carrying only the fields the recovery path reads.
pub fn attr_file_name(name: &str) -> Vec<u8> {
    let encoded = utf16le(name);
    let mut content = vec![0u8; 0x42 + encoded.len()];
    content[0x40] = name.encode_utf16().count() as u8;
    content[0x41] = 0x03;
    content[0x42..].copy_from_slice(&encoded);
    resident_attr(0x30, &content)
}

/// `$FILE_NAME` with the non-resident flag set, which is a layout violation.
pub fn attr_file_name_nonresident() -> Vec<u8> {
    let mut attr = vec![0u8; 0x48];
    attr[..16].copy_from_slice(&attr_common(0x30, 0x48, 1));
    attr
}

pub fn attr_data_resident(content: &[u8]) -> Vec<u8> {
    resident_attr(0x80, content)
}

/// Non-resident `$DATA` with 1-byte lengths and 2-byte cluster offsets.
pub fn attr_data_nonresident(runs: &[(u8, u16)]) -> Vec<u8> {
    let run_bytes = runs.len() * 4 + 1;
    let total = round8(0x40 + run_bytes);
    let mut attr = vec![0u8; total];
    attr[..16].copy_from_slice(&attr_common(0x80, total as u32, 1));
    put_u16(&mut attr, 0x20, 0x40);
    let mut at = 0x40;
    for &(length, offset) in runs {
        attr[at] = 0x21;
        attr[at + 1] = length;
        put_u16(&mut attr, at + 2, offset);
        at += 4;
    }
    attr[at] = 0x00;
    attr
}

pub fn mft_entry(number: u32, flags: u16, attrs: &[Vec<u8>]) -> [u8; 1024] {
    let mut entry = [0u8; 1024];
    entry[0..4].copy_from_slice(b"FILE");
    put_u16(&mut entry, 0x14, 0x38);
    put_u16(&mut entry, 0x16, flags);
    put_u32(&mut entry, 0x1C, 0x400);
    put_u32(&mut entry, 0x2C, number);

    let mut at = 0x38;
    for attr in attrs {
        entry[at..at + attr.len()].copy_from_slice(attr);
        at += attr.len();
    }
    put_u32(&mut entry, at, 0xFFFF_FFFF);
    put_u32(&mut entry, 0x18, (at + 8) as u32);
    entry
}

fn ntfs_boot_sector() -> [u8; 512] {
    let mut s = [0u8; 512];
    s[0..3].copy_from_slice(&[0xEB, 0x52, 0x90]);
    s[3..11].copy_from_slice(b"NTFS    ");
    put_u16(&mut s, 0x0B, SECTOR_SIZE as u16);
    s[0x0D] = SPC;
    put_u64(&mut s, 0x28, 204800);
    put_u64(&mut s, 0x30, MFT_LCN);
    put_u64(&mut s, 0x38, MFT_LCN * 2);
    s[510] = 0x55;
    s[511] = 0xAA;
    s
}

/// The recovery fixture: one NTFS partition, an MFT of 2 clusters
/// (8 entries), and a mix of deleted, allocated, and malformed entries.
pub struct NtfsFixture {
    pub image: Vec<u8>,
    pub frag_content: Vec<u8>,
}

pub fn ntfs_image() -> NtfsFixture {
    let mut image = vec![0u8; 2 * 1024 * 1024];

    image[446..462].copy_from_slice(&mbr_partition_entry(0x00, 0x07, PARTITION_SECTOR as u32, 204800));
    image[510] = 0x55;
    image[511] = 0xAA;

    image[PARTITION_BYTES..PARTITION_BYTES + 512].copy_from_slice(&ntfs_boot_sector());

    // Non-resident extent for frag.bin: 3 clusters at partition cluster 100.
    let frag_at = PARTITION_BYTES + 100 * CLUSTER_SIZE;
    let frag_content: Vec<u8> = (0..3 * CLUSTER_SIZE).map(|i| (i % 251) as u8).collect();
    image[frag_at..frag_at + frag_content.len()].copy_from_slice(&frag_content);

    let entries: Vec<[u8; 1024]> = vec![
        // $MFT itself: allocated, its $DATA run sizes the walk at 2 clusters.
        mft_entry(
            0,
            0x0001,
            &[attr_data_nonresident(&[(2, MFT_LCN as u16)])],
        ),
        // Deleted file with resident content.
        mft_entry(
            1,
            0x0000,
            &[attr_file_name("greet.txt"), attr_data_resident(b"hello\n")],
        ),
        // Deleted file with a 3-cluster non-resident extent.
        mft_entry(
            2,
            0x0000,
            &[attr_file_name("frag.bin"), attr_data_nonresident(&[(3, 100)])],
        ),
        // Allocated file: must not be touched.
        mft_entry(
            3,
            0x0001,
            &[attr_file_name("keep.txt"), attr_data_resident(b"keep me")],
        ),
        // Deleted entry with a malformed $FILE_NAME: skipped with a warning.
        mft_entry(
            4,
            0x0000,
            &[attr_file_name_nonresident(), attr_data_resident(b"never")],
        ),
        // Deleted entry after the malformed one: the scan must reach it.
        mft_entry(
            5,
            0x0000,
            &[attr_file_name("after.txt"), attr_data_resident(b"ok")],
        ),
    ];

    let mft_at = PARTITION_BYTES + (MFT_LCN as usize) * CLUSTER_SIZE;
    for (i, entry) in entries.iter().enumerate() {
        image[mft_at + i * 1024..mft_at + (i + 1) * 1024].copy_from_slice(entry);
    }

    NtfsFixture {
        image,
        frag_content,
    }
}

// ---------------------------------------------------------------------------
// ReFS fixtures
// ---------------------------------------------------------------------------

pub const REFS_CONTAINER_SIZE: u64 = 65536;
pub const ROOT_OID: u64 = 0x600;
pub const USERS_OID: u64 = 0x700;
pub const WINDOWS_OID: u64 = 0x701;
pub const ORPHAN_OID: u64 = 0x702;
/// LCN of the first extent of Users\readme.txt.
pub const README_LCN: u64 = 0x120;
pub const README_SIZE: u64 = 1234;

fn refs_vbr() -> [u8; 0x48] {
    let mut v = [0u8; 0x48];
    v[3..7].copy_from_slice(b"ReFS");
    put_u32(&mut v, 0x20, SECTOR_SIZE as u32);
    put_u32(&mut v, 0x24, SPC as u32);
    v[0x28] = 3;
    v[0x29] = 4;
    put_u64(&mut v, 0x40, REFS_CONTAINER_SIZE);
    v
}

/// 14-byte index entry header + key + value, key at 0x10.
pub fn index_entry(key: &[u8], value: &[u8]) -> Vec<u8> {
    let mut e = vec![0u8; 0x10 + key.len() + value.len()];
    let e_len = e.len() as u32;
    put_u32(&mut e, 0, e_len);
    put_u16(&mut e, 4, 0x10);
    put_u16(&mut e, 6, key.len() as u16);
    put_u16(&mut e, 10, (0x10 + key.len()) as u16);
    put_u16(&mut e, 12, value.len() as u16);
    e[0x10..0x10 + key.len()].copy_from_slice(key);
    e[0x10 + key.len()..].copy_from_slice(value);
    e
}

/// Raw 0x30-byte Parent-Child entry: parent at 0x18, child at 0x28.
pub fn parent_child_entry(parent: u64, child: u64) -> Vec<u8> {
    let mut e = vec![0u8; 0x30];
    put_u32(&mut e, 0, 0x30);
    put_u64(&mut e, 0x18, parent);
    put_u64(&mut e, 0x28, child);
    e
}

/// 0x30-byte page reference with the cluster number in front.
pub fn page_reference(cluster: u64) -> Vec<u8> {
    let mut r = vec![0u8; 0x30];
    put_u64(&mut r, 0, cluster);
    r
}

/// 0xA0-byte Container Table record.
pub fn container_record(container_key: u64, start_cluster: u64) -> Vec<u8> {
    let mut r = vec![0u8; 0xA0];
    put_u64(&mut r, 0, container_key);
    put_u64(&mut r, 0x90, start_cluster);
    r
}

pub fn object_key(object_id: u64) -> Vec<u8> {
    let mut k = vec![0u8; 0x10];
    put_u64(&mut k, 8, object_id);
    k
}

/// 0x20-byte value prefix followed by the page reference.
pub fn object_value(lcn: u64) -> Vec<u8> {
    let mut v = vec![0u8; 0x20];
    v.extend_from_slice(&page_reference(lcn));
    v
}

pub fn directory_key(name: &str) -> Vec<u8> {
    let mut k = 0x20030u32.to_le_bytes().to_vec();
    k.extend_from_slice(&utf16le(name));
    k
}

pub fn directory_value(child_oid: u64, accessed: u64) -> Vec<u8> {
    let mut v = vec![0u8; 0x30];
    put_u64(&mut v, 0x08, child_oid);
    put_u64(&mut v, 0x18, accessed);
    v
}

pub fn file_key(name: &str) -> Vec<u8> {
    let mut k = 0x10030u32.to_le_bytes().to_vec();
    k.extend_from_slice(&utf16le(name));
    k
}

pub fn file_value(accessed: u64, logical_size: u64, first_lcn: u64) -> Vec<u8> {
    let mut v = vec![0u8; 0x18];
    put_u64(&mut v, 0, accessed);
    put_u64(&mut v, 0x08, logical_size);
    put_u64(&mut v, 0x10, first_lcn);
    v
}

/// Lays out an "MSB+" page: root at +0x50, header at root+0x28, key
/// pointer array right after the header, entries packed behind it.
pub fn write_index_page(image: &mut [u8], vcn: u64, entries: &[Vec<u8>]) {
    let base = vcn as usize * CLUSTER_SIZE;
    image[base..base + 4].copy_from_slice(b"MSB+");
    let root = base + 0x50;
    put_u32(image, root, 0x28);
    let hdr = root + 0x28;
    put_u32(image, hdr + 0x10, 0x28);
    put_u32(image, hdr + 0x14, entries.len() as u32);

    let mut entry_off = round8(0x28 + 4 * entries.len());
    for (i, blob) in entries.iter().enumerate() {
        put_u32(image, hdr + 0x28 + 4 * i, entry_off as u32);
        image[hdr + entry_off..hdr + entry_off + blob.len()].copy_from_slice(blob);
        entry_off = round8(entry_off + blob.len());
    }
}

/// Clusters hosting the fixture's metadata pages.
pub const CHECKPOINT_CLUSTER: u64 = 0x20;
pub const CONTAINER_ROOT_LCN: u64 = 0x21;
pub const OBJECT_TABLE_LCN: u64 = 0x22;
pub const PARENT_CHILD_LCN: u64 = 0x23;
pub const CONTAINER_LEAF_CLUSTER: u64 = 0x24;
pub const ROOT_DIR_LCN: u64 = 0x40;
pub const USERS_DIR_LCN: u64 = 0x41;
pub const WINDOWS_DIR_LCN: u64 = 0x42;
pub const ORPHAN_DIR_LCN: u64 = 0x43;

/// A small ReFS 3.x volume: Root containing Users and Windows, Users
/// containing readme.txt. With `with_orphan`, a third child of Root exists
/// only in the Parent-Child table.
pub fn refs_image(with_orphan: bool) -> Vec<u8> {
    let mut image = vec![0u8; 0x128 * CLUSTER_SIZE];

    image[..0x48].copy_from_slice(&refs_vbr());

    // Super Block -> checkpoint cluster.
    let sb = 0x1E * CLUSTER_SIZE;
    image[sb..sb + 4].copy_from_slice(b"SUPB");
    put_u64(&mut image, sb + 0x50 + 0x70, CHECKPOINT_CLUSTER);

    // Checkpoint -> the three catalog roots.
    let cp = CHECKPOINT_CLUSTER as usize * CLUSTER_SIZE;
    image[cp..cp + 4].copy_from_slice(b"CHKP");
    put_u32(&mut image, cp + 0x50 + 68, 0x100);
    put_u32(&mut image, cp + 0x50 + 84, 0x130);
    put_u32(&mut image, cp + 0x50 + 96, 0x160);
    image[cp + 0x100..cp + 0x100 + 0x30].copy_from_slice(&page_reference(OBJECT_TABLE_LCN));
    image[cp + 0x130..cp + 0x130 + 0x30].copy_from_slice(&page_reference(PARENT_CHILD_LCN));
    image[cp + 0x160..cp + 0x160 + 0x30].copy_from_slice(&page_reference(CONTAINER_ROOT_LCN));

    // Container Table: root page referencing one leaf of three containers.
    // Every key satisfies key == start_cluster >> (shift + 1).
    write_index_page(
        &mut image,
        CONTAINER_ROOT_LCN,
        &[index_entry(&[], &page_reference(CONTAINER_LEAF_CLUSTER))],
    );
    write_index_page(
        &mut image,
        CONTAINER_LEAF_CLUSTER,
        &[
            index_entry(&[], &container_record(1, 0x20)),
            index_entry(&[], &container_record(2, 0x40)),
            index_entry(&[], &container_record(9, 0x120)),
        ],
    );

    // Object ID Table.
    let mut objects = vec![
        index_entry(&object_key(ROOT_OID), &object_value(ROOT_DIR_LCN)),
        index_entry(&object_key(USERS_OID), &object_value(USERS_DIR_LCN)),
        index_entry(&object_key(WINDOWS_OID), &object_value(WINDOWS_DIR_LCN)),
    ];
    if with_orphan {
        objects.push(index_entry(
            &object_key(ORPHAN_OID),
            &object_value(ORPHAN_DIR_LCN),
        ));
    }
    write_index_page(&mut image, OBJECT_TABLE_LCN, &objects);

    // Parent-Child Table.
    let mut edges = vec![
        parent_child_entry(ROOT_OID, USERS_OID),
        parent_child_entry(ROOT_OID, WINDOWS_OID),
    ];
    if with_orphan {
        edges.push(parent_child_entry(ROOT_OID, ORPHAN_OID));
    }
    write_index_page(&mut image, PARENT_CHILD_LCN, &edges);

    // Directory pages.
    write_index_page(
        &mut image,
        ROOT_DIR_LCN,
        &[
            index_entry(
                &directory_key("Users"),
                &directory_value(USERS_OID, SAMPLE_FILETIME),
            ),
            index_entry(
                &directory_key("Windows"),
                &directory_value(WINDOWS_OID, SAMPLE_FILETIME),
            ),
        ],
    );
    write_index_page(
        &mut image,
        USERS_DIR_LCN,
        &[index_entry(
            &file_key("readme.txt"),
            &file_value(SAMPLE_FILETIME, README_SIZE, README_LCN),
        )],
    );
    write_index_page(&mut image, WINDOWS_DIR_LCN, &[]);
    if with_orphan {
        write_index_page(&mut image, ORPHAN_DIR_LCN, &[]);
    }

    // readme.txt first extent.
    let content = README_LCN as usize * CLUSTER_SIZE;
    image[content..content + 4].copy_from_slice(b"RIFF");

    image
}
