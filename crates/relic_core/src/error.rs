//! Core error types for the Relic forensics toolkit.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Fewer bytes remained in the image than a decode required
    #[error("unexpected end of image: wanted {wanted} bytes at offset {offset:#x}")]
    UnexpectedEnd { offset: u64, wanted: usize },

    /// A magic value did not match the expected structure signature
    #[error("bad signature at offset {offset:#x}: expected {expected:?}, found {found:02x?}")]
    BadSignature {
        expected: &'static str,
        found: [u8; 4],
        offset: u64,
    },

    /// The volume is a ReFS version this tool does not understand
    #[error("unsupported ReFS version {major}.{minor} (only 3.x is supported)")]
    WrongVersion { major: u8, minor: u8 },

    /// An LCN mapped to a container key absent from the Container Table
    #[error("container key {0:#x} is not present in the container table")]
    UnknownContainerKey(u64),

    /// An object id absent from the Object ID Table was dereferenced
    #[error("object id {0:#x} is not present in the object table")]
    UnknownObjectId(u64),

    /// An MFT attribute violated its layout contract
    #[error("malformed attribute in MFT entry {entry}: {reason}")]
    MalformedAttribute { entry: u32, reason: String },

    /// A field held a value no valid on-disk structure can carry
    #[error("invalid on-disk structure at offset {offset:#x}: {reason}")]
    Format { offset: u64, reason: String },
}

pub type Result<T> = std::result::Result<T, CoreError>;
