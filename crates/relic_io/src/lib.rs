//! # Relic IO
//!
//! `VolumeSource` adapters for the Relic forensics toolkit: a plain
//! read-only file reader and a memory-mapped variant. Both serve whole-image
//! analysis; the drivers try mmap first and fall back to the file reader
//! for sources that refuse to map.

mod disk;
mod mmap;

pub use disk::DiskReader;
pub use mmap::MmapReader;
