use std::fmt;

/// Fatal decode/consistency errors. All of these abort the run at the
/// offending height per the pipeline's no-retry failure semantics;
/// `SUBSIDY_ANOMALY` (spec §7) is deliberately not a member of this enum
/// since it is logged, not fatal, and never returned as an `Err`.
#[derive(Debug)]
pub enum CodecError {
    /// Read past the end of the available bytes.
    ShortRead { wanted: usize, available: usize },
    /// The 4-byte block magic did not match the expected network magic.
    BadMagic { found: [u8; 4] },
    /// A SegWit marker byte (`0x00`) was followed by a flag other than `0x01`.
    BadSegwitFlag { flag: u8 },
    /// The block's declared size did not match the number of bytes actually consumed.
    SizeMismatch { declared: u32, consumed: usize },
    /// A varint (wire or alt-format) overflowed `u64`.
    VarintOverflow,
    /// Encountered while disassembling a script for debug output only.
    UnknownOpcode(u8),
}

impl fmt::Display for CodecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CodecError::ShortRead { wanted, available } => {
                write!(f, "short read: wanted {wanted} bytes, {available} available")
            }
            CodecError::BadMagic { found } => write!(f, "bad block magic: {found:02x?}"),
            CodecError::BadSegwitFlag { flag } => write!(f, "bad segwit flag byte: 0x{flag:02x}"),
            CodecError::SizeMismatch { declared, consumed } => write!(
                f,
                "declared block size {declared} does not match {consumed} consumed bytes"
            ),
            CodecError::VarintOverflow => write!(f, "varint overflowed u64"),
            CodecError::UnknownOpcode(op) => write!(f, "unknown opcode 0x{op:02x}"),
        }
    }
}

impl std::error::Error for CodecError {}

pub type Result<T> = std::result::Result<T, CodecError>;
