//! NTFS structures and the deleted-file recovery engine.

pub mod boot;
pub mod mft;
pub mod recover;

pub use boot::NtfsBoot;
pub use recover::{recover_deleted, RecoveredFile, RecoveryOutcome};
