//! Errors raised while walking the node's block-index LevelDB and
//! assembling the per-height array (component F).

use chain_codec::CodecError;

#[derive(Debug)]
pub enum IndexError {
    /// A hash in the supplied active-chain list has no `'b'`-prefixed
    /// record in the block-index database.
    MissingRecord { height: u32 },
    /// The record's own `status` marks it as failed validation; the
    /// active-chain hash list should never point at such a record.
    FailedBlock { height: u32, status: u32 },
    /// `record[i].height != i`, or `record[i].previous_hash !=
    /// record[i-1].block_hash` — the chain the hash list describes
    /// does not thread correctly.
    Broken { height: u32, reason: &'static str },
    Codec(CodecError),
    Db(String),
}

impl std::fmt::Display for IndexError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IndexError::MissingRecord { height } => {
                write!(f, "no block-index record for height {height}")
            }
            IndexError::FailedBlock { height, status } => {
                write!(f, "block at height {height} failed validation (status {status:#x})")
            }
            IndexError::Broken { height, reason } => {
                write!(f, "index broken at height {height}: {reason}")
            }
            IndexError::Codec(e) => write!(f, "{e}"),
            IndexError::Db(msg) => write!(f, "leveldb: {msg}"),
        }
    }
}

impl std::error::Error for IndexError {}

impl From<CodecError> for IndexError {
    fn from(e: CodecError) -> Self {
        IndexError::Codec(e)
    }
}

pub type Result<T> = std::result::Result<T, IndexError>;
