//! Byte-level decoding for the blockchain analytical pipeline: the
//! positioned byte reader and its two varint formats (§4.A), the
//! bounded file-handle pool, the script classifier (§4.B), and the
//! transaction/block deserialisers (§4.C, §4.D).

pub mod block_codec;
pub mod byte_reader;
pub mod error;
pub mod file_pool;
pub mod script_classifier;
pub mod transaction_codec;

pub use block_codec::{deserialize_block, locate_block, BlockLocateError, MAINNET_MAGIC};
pub use byte_reader::ByteReader;
pub use error::{CodecError, Result};
pub use file_pool::FilePool;
pub use script_classifier::{classify_created, classify_spent};
pub use transaction_codec::deserialize_transaction;
