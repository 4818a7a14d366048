use std::io;
use thiserror::Error;

/// Coarse classification of an [`SbmError`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SbmErrorKind {
    /// The file could not be opened or read completely.
    IoFailure,
    /// The bytes were read but do not form a valid SBM image.
    FormatViolation,
}

#[derive(Debug, Error)]
pub enum SbmError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Short read: expected {expected} bytes, got {actual}")]
    ShortRead { expected: u64, actual: u64 },

    #[error("Bad magic 0x{found:08X}, expected 0x{expected:08X}")]
    BadMagic { found: u32, expected: u32 },

    #[error("Truncated {section}: need {needed} bytes, {available} available")]
    Truncated {
        section: &'static str,
        needed: u64,
        available: u64,
    },

    #[error("Frame {frame} covers vertices {first}..{end} but the mesh has {vertices}")]
    FrameOutOfRange {
        frame: u32,
        first: u32,
        end: u64,
        vertices: u32,
    },

    #[error("Unknown index type 0x{0:04X}")]
    UnknownIndexType(u32),
}

impl SbmError {
    pub fn kind(&self) -> SbmErrorKind {
        match self {
            Self::Io(_) | Self::ShortRead { .. } => SbmErrorKind::IoFailure,
            Self::BadMagic { .. }
            | Self::Truncated { .. }
            | Self::FrameOutOfRange { .. }
            | Self::UnknownIndexType(_) => SbmErrorKind::FormatViolation,
        }
    }
}

pub type Result<T> = std::result::Result<T, SbmError>;
