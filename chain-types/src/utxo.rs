//! UTXO map key/value shapes. The map itself (insert/consume/clear)
//! lives in `chain-analytics`, which owns the mutable state; this crate
//! only describes its shape.

use std::hash::{Hash, Hasher};

use crate::script::Script;
use crate::transaction::Txid;

/// `txid || vout_as_4_big_endian_bytes`, used as the hash-map key. `Hash`
/// is implemented over that same 36-byte form (see `to_bytes`) rather than
/// derived field-by-field, so the map keying it can pair it with a fast
/// non-cryptographic hasher over the flat byte string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UtxoKey {
    pub txid: Txid,
    pub vout: u32,
}

impl UtxoKey {
    pub fn new(txid: Txid, vout: u32) -> Self {
        UtxoKey { txid, vout }
    }

    /// The 36-byte composite key: txid bytes (in their internal
    /// little-endian storage order) followed by the vout index as 4
    /// big-endian bytes.
    pub fn to_bytes(&self) -> [u8; 36] {
        let mut buf = [0u8; 36];
        buf[..32].copy_from_slice(&self.txid.0);
        buf[32..].copy_from_slice(&self.vout.to_be_bytes());
        buf
    }
}

impl Hash for UtxoKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write(&self.to_bytes());
    }
}

#[derive(Debug, Clone)]
pub struct UtxoEntry {
    pub amount: u64,
    pub script: Script,
}
