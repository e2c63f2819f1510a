//! Transaction, input, output and the legacy txid wrapper.

use crate::script::{Script, ScriptType};
use bitcoin::hashes::{sha256d, Hash};
use std::fmt;

/// The legacy (non-witness) transaction id: double-SHA256 of the
/// serialised transaction with the SegWit marker/flag and witness data
/// stripped, displayed in the network's big-endian hex convention.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Txid(pub [u8; 32]);

impl Txid {
    pub fn from_stripped_bytes(bytes: &[u8]) -> Self {
        let digest = sha256d::Hash::hash(bytes);
        Txid(*digest.as_byte_array())
    }

    pub const ZERO: Txid = Txid([0u8; 32]);

    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 32]
    }
}

impl fmt::Display for Txid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut reversed = self.0;
        reversed.reverse();
        for byte in reversed {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

/// A single witness stack item list, present iff the owning transaction
/// is SegWit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Witness(pub Vec<Vec<u8>>);

impl Witness {
    pub fn last(&self) -> Option<&[u8]> {
        self.0.last().map(|v| v.as_slice())
    }

    pub fn size(&self) -> usize {
        // 1-byte item-count prefix plus each item's own varint-length prefix.
        self.0.iter().map(|item| item.len()).sum::<usize>()
    }
}

pub const OUTPOINT_NULL_VOUT: u32 = 0xFFFF_FFFF;

#[derive(Debug, Clone)]
pub struct Input {
    pub prev_txid: Txid,
    pub prev_vout: u32,
    pub script_sig: Script,
    pub sequence: u32,
    pub witness: Option<Witness>,
    /// Filled in once the UTXO it references has been resolved.
    pub spent_type: Option<ScriptType>,
    pub spent_script: Option<Script>,
    pub spent_amount: Option<u64>,
}

impl Input {
    pub fn is_coinbase(&self) -> bool {
        self.prev_txid.is_zero() && self.prev_vout == OUTPOINT_NULL_VOUT
    }

    /// On-wire size of this input: 32 (txid) + 4 (vout) + script_sig
    /// varint-length-prefixed + 4 (sequence). Witness bytes are counted
    /// separately as part of the transaction's witness section.
    pub fn size(&self) -> usize {
        32 + 4 + varint_size(self.script_sig.len() as u64) + self.script_sig.len() + 4
    }
}

#[derive(Debug, Clone)]
pub struct Output {
    pub amount: u64,
    pub script_pubkey: Script,
    pub created_type: ScriptType,
}

impl Output {
    pub fn size(&self) -> usize {
        8 + varint_size(self.script_pubkey.len() as u64) + self.script_pubkey.len()
    }
}

#[derive(Debug, Clone)]
pub struct Transaction {
    pub version: i32,
    pub is_segwit: bool,
    pub inputs: Vec<Input>,
    pub outputs: Vec<Output>,
    pub locktime: u32,
    pub txid: Txid,
    /// Stripped (non-witness) serialised size, in bytes.
    pub stripped_size: usize,
    /// Full on-wire serialised size, in bytes.
    pub size: usize,
    /// `4 * stripped_size + (size - stripped_size)`.
    pub weight: u64,
    /// Filled in once all of the transaction's inputs have been resolved
    /// against the UTXO map. `None` only before that step runs.
    pub fee: Option<i64>,
}

impl Transaction {
    pub fn is_coinbase(&self) -> bool {
        self.inputs.len() == 1 && self.inputs[0].is_coinbase()
    }

    pub fn witness_size(&self) -> usize {
        self.inputs
            .iter()
            .filter_map(|i| i.witness.as_ref())
            .map(|w| w.size())
            .sum()
    }
}

/// Bitcoin's wire-format compact-size varint encoded length, used only to
/// recompute on-wire sizes from parsed fields (the byte reader does the
/// actual decoding in `chain-codec`).
pub fn varint_size(n: u64) -> usize {
    match n {
        0..=0xfc => 1,
        0xfd..=0xffff => 3,
        0x1_0000..=0xffff_ffff => 5,
        _ => 9,
    }
}
