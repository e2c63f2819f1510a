//! Component E: the UTXO map. Outputs are moved in when their owning
//! transaction is parsed and removed the instant the input that spends
//! them is resolved; nothing is ever mutated in place, and the map is
//! never read again after a key is removed.

use std::collections::HashMap;

use ahash::RandomState;
use chain_types::{ScriptType, UtxoEntry, UtxoKey};

/// Tens of millions of live entries at chain tip, so the default SipHash
/// map is swapped for `ahash`'s non-cryptographic one, paired with
/// `UtxoKey`'s flat 36-byte `Hash` impl.
type UtxoHashMap = HashMap<UtxoKey, UtxoEntry, RandomState>;

#[derive(Debug, Default)]
pub struct UtxoMap {
    entries: UtxoHashMap,
}

impl UtxoMap {
    pub fn new() -> Self {
        UtxoMap { entries: UtxoHashMap::default() }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Insert every non-`OP_RETURN` output of `tx` keyed by
    /// `(txid, vout)`. `OP_RETURN` outputs are provably unspendable and
    /// are never inserted, per spec §3.
    pub fn add_transaction_outputs(&mut self, txid: chain_types::Txid, outputs: &[chain_types::Output]) {
        for (vout, output) in outputs.iter().enumerate() {
            if output.created_type == ScriptType::OpReturn {
                continue;
            }
            let key = UtxoKey::new(txid, vout as u32);
            let entry = UtxoEntry {
                amount: output.amount,
                script: output.script_pubkey.clone(),
            };
            self.entries.insert(key, entry);
        }
    }

    /// Remove and return the entry an input spends. `None` only for a
    /// coinbase input (which has no prior output) or a genuinely
    /// missing UTXO, which is a fatal `UTXO_MISSING` condition at the
    /// call site.
    pub fn consume(&mut self, key: &UtxoKey) -> Option<UtxoEntry> {
        self.entries.remove(key)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chain_types::{Output, Script, Txid};

    fn output(amount: u64, created_type: ScriptType) -> Output {
        Output {
            amount,
            script_pubkey: Script::new(vec![]),
            created_type,
        }
    }

    #[test]
    fn op_return_outputs_are_never_inserted() {
        let mut map = UtxoMap::new();
        let txid = Txid([1u8; 32]);
        map.add_transaction_outputs(
            txid,
            &[output(1_000, ScriptType::P2pkh), output(0, ScriptType::OpReturn)],
        );
        assert_eq!(map.len(), 1);
        assert!(map.consume(&UtxoKey::new(txid, 0)).is_some());
        assert!(map.consume(&UtxoKey::new(txid, 1)).is_none());
    }

    #[test]
    fn consume_removes_the_entry() {
        let mut map = UtxoMap::new();
        let txid = Txid([2u8; 32]);
        map.add_transaction_outputs(txid, &[output(500, ScriptType::P2pkh)]);
        let key = UtxoKey::new(txid, 0);
        assert!(map.consume(&key).is_some());
        assert!(map.consume(&key).is_none());
    }
}

/// Invariant 7 of the testable-properties list: after a sequence of
/// insertions and spends, the map contains exactly the `(txid, vout)`
/// pairs that were created and not OP_RETURN and not yet spent.
#[cfg(test)]
mod membership_properties {
    use super::*;
    use chain_types::{Output, Script, Txid};
    use proptest::prelude::*;
    use std::collections::HashSet;

    fn output(amount: u64, created_type: ScriptType) -> Output {
        Output { amount, script_pubkey: Script::new(vec![]), created_type }
    }

    proptest! {
        #[test]
        fn membership_tracks_created_minus_spent_minus_op_return(
            creates in proptest::collection::vec((0u8..10, any::<bool>()), 1..20),
            spend_mask in proptest::collection::vec(any::<bool>(), 0..20),
        ) {
            let mut map = UtxoMap::new();
            let mut expected: HashSet<(u8, u32)> = HashSet::new();

            for (i, (txid_byte, is_op_return)) in creates.iter().enumerate() {
                let txid = Txid([*txid_byte; 32]);
                let created_type = if *is_op_return { ScriptType::OpReturn } else { ScriptType::P2pkh };
                map.add_transaction_outputs(txid, &[output(1, created_type)]);
                if !*is_op_return {
                    expected.insert((*txid_byte, 0));
                }

                if spend_mask.get(i).copied().unwrap_or(false) && !expected.is_empty() {
                    let &(spend_byte, spend_vout) = expected.iter().next().unwrap();
                    let key = UtxoKey::new(Txid([spend_byte; 32]), spend_vout);
                    prop_assert!(map.consume(&key).is_some());
                    expected.remove(&(spend_byte, spend_vout));
                }
            }

            for &(txid_byte, vout) in &expected {
                prop_assert!(map.consume(&UtxoKey::new(Txid([txid_byte; 32]), vout)).is_some());
            }
        }
    }
}
