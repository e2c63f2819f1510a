//! Shared data model for the blockchain analytical pipeline: blocks,
//! transactions, scripts, the script-type taxonomy, UTXO keys, and
//! block-index records. No I/O and no parsing logic lives here — see
//! `chain-codec` for byte-level decoding and `chain-analytics` for the
//! UTXO map and metric computation.

pub mod block;
pub mod index_record;
pub mod script;
pub mod transaction;
pub mod utxo;

pub use block::{Block, BlockHeader, BLOCK_HEADER_SIZE};
pub use index_record::BlockIndexRecord;
pub use script::{Script, ScriptType};
pub use transaction::{Input, Output, Transaction, Txid, Witness};
pub use utxo::{UtxoEntry, UtxoKey};

pub type Height = u32;
