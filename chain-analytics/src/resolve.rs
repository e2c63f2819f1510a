//! The `fee_and_type` step of component G: resolves every input against
//! the UTXO map, annotating `spent_type`/`spent_script`/`spent_amount`
//! and filling in each transaction's `fee`. Runs once per block, after
//! `chain-codec::deserialize_block` has produced a pure `Block` value
//! and before that block reaches the output-insertion step below.

use chain_codec::classify_spent;
use chain_types::{Block, ScriptType, Transaction, UtxoKey};

use crate::utxo_map::UtxoMap;

#[derive(Debug)]
pub enum ResolveError {
    UtxoMissing { txid: chain_types::Txid, vout: u32 },
}

impl std::fmt::Display for ResolveError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResolveError::UtxoMissing { txid, vout } => {
                write!(f, "UTXO missing for {txid}:{vout}")
            }
        }
    }
}

impl std::error::Error for ResolveError {}

/// Resolves every transaction in `block` in order: for each transaction,
/// inputs are spent against the UTXO map *before* that transaction's own
/// outputs are inserted, matching the node's own same-block spend
/// ordering.
pub fn resolve_block(block: &mut Block, utxos: &mut UtxoMap) -> Result<(), ResolveError> {
    for tx in &mut block.transactions {
        resolve_transaction(tx, utxos)?;
    }
    Ok(())
}

fn resolve_transaction(tx: &mut Transaction, utxos: &mut UtxoMap) -> Result<(), ResolveError> {
    let mut input_sum: u64 = 0;
    let mut output_sum: u64 = 0;
    for output in &tx.outputs {
        output_sum += output.amount;
    }

    for input in &mut tx.inputs {
        if input.is_coinbase() {
            input.spent_type = Some(ScriptType::Coinbase);
            continue;
        }

        let key = UtxoKey::new(input.prev_txid, input.prev_vout);
        let entry = utxos.consume(&key).ok_or(ResolveError::UtxoMissing {
            txid: input.prev_txid,
            vout: input.prev_vout,
        })?;

        let witness_stack = input.witness.as_ref().map(|w| w.0.as_slice());
        let spent_type = classify_spent(&entry.script, &input.script_sig, witness_stack);

        input_sum += entry.amount;
        input.spent_type = Some(spent_type);
        input.spent_amount = Some(entry.amount);
        input.spent_script = Some(entry.script);
    }

    tx.fee = if tx.is_coinbase() {
        Some(0)
    } else {
        Some(input_sum as i64 - output_sum as i64)
    };

    utxos.add_transaction_outputs(tx.txid, &tx.outputs);
    Ok(())
}
