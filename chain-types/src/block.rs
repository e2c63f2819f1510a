//! Block header and the fully deserialised block.

use crate::transaction::Transaction;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockHeader {
    pub version: i32,
    pub prev_hash: [u8; 32],
    pub merkle_root: [u8; 32],
    pub timestamp: u32,
    pub bits: u32,
    pub nonce: u32,
}

pub const BLOCK_HEADER_SIZE: usize = 80;

#[derive(Debug, Clone)]
pub struct Block {
    pub header: BlockHeader,
    pub transactions: Vec<Transaction>,
    /// Full on-wire serialised size, in bytes (the `size` written after
    /// the 4-byte magic in the `blk*.dat` file).
    pub size: usize,
    /// Serialised size excluding the 2-byte SegWit marker/flag and all
    /// witness data, summed across every transaction plus the header and
    /// transaction-count prefix.
    pub stripped_size: usize,
    /// `4 * stripped_size + (size - stripped_size)`.
    pub weight: u64,
}

impl Block {
    pub fn transactions_weight(&self) -> u64 {
        self.transactions.iter().map(|t| t.weight).sum()
    }

    pub fn segwit_tx_count(&self) -> usize {
        self.transactions.iter().filter(|t| t.is_segwit).count()
    }
}
