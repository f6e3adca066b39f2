//! # Relic Core
//!
//! Domain logic for the Relic volume forensics toolkit: read-only analysis
//! of MBR-partitioned NTFS images and ReFS 3.x volumes.
//!
//! Two pipelines share the decoding substrate in [`reader`] and [`source`]:
//!
//! - NTFS deleted-file recovery ([`mbr`] → [`ntfs`]): partition table to
//!   MFT walk to materialized file content.
//! - ReFS analysis ([`refs`]): Super Block → Checkpoint → catalogs →
//!   navigable directory tree.
//!
//! Nothing in this crate mutates a volume image. The only writes are the
//! files the recovery engine emits into its output directory.

pub mod error;
pub mod filetime;
pub mod mbr;
pub mod ntfs;
pub mod reader;
pub mod refs;
pub mod runlist;
pub mod source;

pub use error::{CoreError, Result};
pub use filetime::Filetime;
pub use source::VolumeSource;
