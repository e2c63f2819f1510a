//! Component H: pure transformation from a resolved `Block` into named
//! `(metric, value)` insertions on the window aggregator, plus the
//! per-input/per-output histogram recordings and the subsidy anomaly
//! check. Mirrors `statistics.py`'s `process` and its helper functions
//! one-for-one.

use chain_types::Block;

use crate::histogram::HistogramSet;
use crate::subsidy::{bits_to_diff, max_block_subsidy};
use crate::window::{Inserted, WindowAggregator};

/// A block whose `block_subsidy` doesn't match the halving schedule.
/// Logged, never fatal (spec §4.H/§7: rare historical quirks).
#[derive(Debug, Clone, Copy)]
pub struct SubsidyAnomaly {
    pub mean_height: u32,
    pub subsidy: i64,
    pub max_subsidy: u64,
}

/// Runs every analytics function over `block`, inserting into `window`
/// and `histograms`, and returns any subsidy anomaly found. The caller
/// is responsible for calling `window.flush_due(height)` afterwards.
pub fn process(block: &Block, height: u32, window: &mut WindowAggregator, histograms: &mut HistogramSet) -> Option<SubsidyAnomaly> {
    amount_transferred(block, window);
    inputs_and_outputs(block, window);
    spent_utxo_types(block, window, histograms);
    created_utxo_types(block, window, histograms);
    tx_count_size_weight(block, window);
    block_meta(block, window);
    fees_and_subsidy(block, window, height)
}

fn amount_transferred(block: &Block, window: &mut WindowAggregator) {
    let transferred_per_tx: Vec<f64> = block
        .transactions
        .iter()
        .map(|tx| tx.outputs.iter().map(|o| o.amount).sum::<u64>() as f64)
        .collect();
    let total: f64 = transferred_per_tx.iter().sum();
    window.insert("amount_transferred_per_tx", Inserted::List(transferred_per_tx));
    window.insert("amount_transferred_per_block", Inserted::Scalar(total));
}

fn inputs_and_outputs(block: &Block, window: &mut WindowAggregator) {
    let mut input_count = Vec::new();
    let mut output_count = Vec::new();
    let mut input_size = Vec::new();
    let mut output_size = Vec::new();

    for tx in &block.transactions {
        input_count.push(tx.inputs.len() as f64);
        output_count.push(tx.outputs.len() as f64);
        input_size.extend(tx.inputs.iter().map(|i| i.size() as f64));
        output_size.extend(tx.outputs.iter().map(|o| o.size() as f64));
    }

    let total_inputs: f64 = input_count.iter().sum();
    let total_outputs: f64 = output_count.iter().sum();

    window.insert("inputs_per_tx", Inserted::List(input_count));
    window.insert("outputs_per_tx", Inserted::List(output_count));
    window.insert("input_size_per_tx", Inserted::List(input_size));
    window.insert("output_size_per_tx", Inserted::List(output_size));
    window.insert("total_inputs_per_block", Inserted::Scalar(total_inputs));
    window.insert("total_outputs_per_block", Inserted::Scalar(total_outputs));
}

fn spent_utxo_types(block: &Block, window: &mut WindowAggregator, histograms: &mut HistogramSet) {
    use std::collections::HashMap;
    let mut counter: HashMap<String, u64> = HashMap::new();

    for tx in &block.transactions {
        for input in &tx.inputs {
            let Some(spent_type) = input.spent_type else { continue };
            let target = spent_type.metric_suffix();

            let spent_script_size = if spent_type == chain_types::ScriptType::Coinbase {
                0
            } else {
                input.spent_script.as_ref().map(|s| s.len()).unwrap_or(0)
            };
            let witness_size = input.witness.as_ref().map(|w| w.size()).unwrap_or(0);
            let script_sig_size = input.script_sig.len();

            histograms.record(&format!("input_{target}"), "script_sig", script_sig_size as u64);
            histograms.record(&format!("input_{target}"), "spent_UTXO_script_pubkey", spent_script_size as u64);
            histograms.record(&format!("input_{target}"), "witness", witness_size as u64);
            histograms.record(
                &format!("input_{target}"),
                "sum_scripts_and_witness",
                (script_sig_size + spent_script_size + witness_size) as u64,
            );
            histograms.record(&format!("input_{target}"), "total", input.size() as u64);

            *counter.entry(target).or_insert(0) += 1;
        }
    }

    for (target, count) in counter {
        window.insert(&format!("spent_UTXO_type_{target}"), Inserted::Scalar(count as f64));
    }
}

fn created_utxo_types(block: &Block, window: &mut WindowAggregator, histograms: &mut HistogramSet) {
    use std::collections::HashMap;
    let mut counter: HashMap<String, u64> = HashMap::new();

    for tx in &block.transactions {
        for output in &tx.outputs {
            let target = output.created_type.metric_suffix();
            histograms.record(&format!("output_{target}"), "script_pubkey", output.script_pubkey.len() as u64);
            histograms.record(&format!("output_{target}"), "total", output.size() as u64);
            *counter.entry(target).or_insert(0) += 1;
        }
    }

    for (target, count) in counter {
        window.insert(&format!("created_UTXO_type_{target}"), Inserted::Scalar(count as f64));
    }
}

fn tx_count_size_weight(block: &Block, window: &mut WindowAggregator) {
    let txs = &block.transactions;
    window.insert("number_of_tx_per_block", Inserted::Scalar(txs.len() as f64));

    let segwit_txs: Vec<_> = txs.iter().filter(|t| t.is_segwit).collect();
    window.insert("number_of_segwit_tx_per_block", Inserted::Scalar(segwit_txs.len() as f64));
    window.insert(
        "fraction_of_segwit_tx_per_block",
        Inserted::Scalar(segwit_txs.len() as f64 / txs.len() as f64),
    );

    window.insert(
        "tx_size",
        Inserted::List(txs.iter().map(|t| t.size as f64).collect()),
    );

    if !segwit_txs.is_empty() {
        let witness_sizes: Vec<f64> = segwit_txs.iter().map(|t| (t.size - t.stripped_size) as f64).collect();
        let ratios: Vec<f64> = segwit_txs
            .iter()
            .map(|t| (t.size - t.stripped_size) as f64 / t.size as f64)
            .collect();
        let witness_total: f64 = witness_sizes.iter().sum();
        let size_total: f64 = segwit_txs.iter().map(|t| t.size as f64).sum();

        window.insert("segwit_tx_witness_size", Inserted::List(witness_sizes));
        window.insert("segwit_ratio_in_segwit_tx", Inserted::List(ratios));
        window.insert("segwit_ratio_mean_in_segwit_tx", Inserted::Scalar(witness_total / size_total));
    }

    window.insert(
        "tx_weight",
        Inserted::List(txs.iter().map(|t| t.weight as f64).collect()),
    );
}

fn block_meta(block: &Block, window: &mut WindowAggregator) {
    window.insert("block_size", Inserted::Scalar(block.size as f64));
    window.insert("stripped_block_size", Inserted::Scalar(block.stripped_size as f64));
    window.insert("block_weight", Inserted::Scalar(block.weight as f64));
    window.insert("block_transactions_weight", Inserted::Scalar(block.transactions_weight() as f64));
    window.insert("block_diff", Inserted::Scalar(bits_to_diff(block.header.bits)));
    window.insert("block_timestamp", Inserted::Scalar(block.header.timestamp as f64));
    window.insert("block_version", Inserted::Scalar(block.header.version as f64));
}

fn fees_and_subsidy(block: &Block, window: &mut WindowAggregator, height: u32) -> Option<SubsidyAnomaly> {
    let txs = &block.transactions;
    let fees: Vec<i64> = txs.iter().map(|t| t.fee.unwrap_or(0)).collect();
    let sizes: Vec<f64> = txs.iter().map(|t| t.size as f64).collect();
    let weights: Vec<f64> = txs.iter().map(|t| t.weight as f64).collect();

    window.insert(
        "absolute_fee_per_tx_incl_coinbase",
        Inserted::List(fees.iter().map(|&f| f as f64).collect()),
    );
    if txs.len() > 1 {
        window.insert(
            "absolute_fee_per_tx_excl_coinbase",
            Inserted::List(fees[1..].iter().map(|&f| f as f64).collect()),
        );
    }

    let fees_per_byte: Vec<f64> = fees.iter().zip(&sizes).map(|(&f, &s)| f as f64 / s).collect();
    window.insert("relative_fee_per_tx_incl_coinbase", Inserted::List(fees_per_byte.clone()));
    let sum_fees: f64 = fees.iter().map(|&f| f as f64).sum();
    let sum_sizes: f64 = sizes.iter().sum();
    window.insert("relative_fee_per_tx_mean_incl_coinbase", Inserted::Scalar(sum_fees / sum_sizes));
    if txs.len() > 1 {
        window.insert("relative_fee_per_tx_excl_coinbase", Inserted::List(fees_per_byte[1..].to_vec()));
        let sum_fees_excl: f64 = fees[1..].iter().map(|&f| f as f64).sum();
        let sum_sizes_excl: f64 = sizes[1..].iter().sum();
        window.insert(
            "relative_fee_per_tx_mean_excl_coinbase",
            Inserted::Scalar(sum_fees_excl / sum_sizes_excl),
        );
    }

    let fees_per_wu: Vec<f64> = fees.iter().zip(&weights).map(|(&f, &w)| f as f64 / w).collect();
    window.insert("relative_fee_per_WU_per_tx_incl_coinbase", Inserted::List(fees_per_wu.clone()));
    let sum_weights: f64 = weights.iter().sum();
    window.insert(
        "relative_fee_per_WU_per_tx_mean_incl_coinbase",
        Inserted::Scalar(sum_fees / sum_weights),
    );
    if txs.len() > 1 {
        window.insert("relative_fee_per_WU_per_tx_excl_coinbase", Inserted::List(fees_per_wu[1..].to_vec()));
        let sum_fees_excl: f64 = fees[1..].iter().map(|&f| f as f64).sum();
        let sum_weights_excl: f64 = weights[1..].iter().sum();
        window.insert(
            "relative_fee_per_WU_per_tx_mean_excl_coinbase",
            Inserted::Scalar(sum_fees_excl / sum_weights_excl),
        );
    }

    window.insert("total_block_fees_incl_coinbase", Inserted::Scalar(sum_fees));
    if txs.len() > 1 {
        let sum_fees_excl: f64 = fees[1..].iter().map(|&f| f as f64).sum();
        window.insert("total_block_fees_excl_coinbase", Inserted::Scalar(sum_fees_excl));
    }

    let reward: u64 = txs.first().map(|t| t.outputs.iter().map(|o| o.amount).sum()).unwrap_or(0);
    window.insert("block_reward", Inserted::Scalar(reward as f64));
    let subsidy = reward as i64 - sum_fees.round() as i64;
    window.insert("block_subsidy", Inserted::Scalar(subsidy as f64));

    let max_subsidy = max_block_subsidy(height);
    if subsidy != max_subsidy as i64 {
        Some(SubsidyAnomaly { mean_height: height, subsidy, max_subsidy })
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chain_types::{BlockHeader, Input, Output, Script, ScriptType, Transaction, Txid};

    fn coinbase_tx() -> Transaction {
        Transaction {
            version: 1,
            is_segwit: false,
            inputs: vec![Input {
                prev_txid: Txid::ZERO,
                prev_vout: chain_types::transaction::OUTPOINT_NULL_VOUT,
                script_sig: Script::new(vec![0x00]),
                sequence: 0xffffffff,
                witness: None,
                spent_type: Some(ScriptType::Coinbase),
                spent_script: None,
                spent_amount: None,
            }],
            outputs: vec![Output {
                amount: 5_000_000_000,
                script_pubkey: Script::new(vec![]),
                created_type: ScriptType::P2pkh,
            }],
            locktime: 0,
            txid: Txid([1u8; 32]),
            stripped_size: 100,
            size: 100,
            weight: 400,
            fee: Some(0),
        }
    }

    fn block_with(txs: Vec<Transaction>) -> Block {
        Block {
            header: BlockHeader {
                version: 1,
                prev_hash: [0; 32],
                merkle_root: [0; 32],
                timestamp: 1_231_006_505,
                bits: 0x1d00ffff,
                nonce: 0,
            },
            transactions: txs,
            size: 285,
            stripped_size: 285,
            weight: 1140,
        }
    }

    #[test]
    fn genesis_style_block_reports_no_anomaly() {
        let block = block_with(vec![coinbase_tx()]);
        let mut window = WindowAggregator::new(vec![1]);
        let mut hist = HistogramSet::new();
        let anomaly = process(&block, 0, &mut window, &mut hist);
        assert!(anomaly.is_none());
    }

    #[test]
    fn subsidy_mismatch_is_flagged() {
        let mut tx = coinbase_tx();
        tx.outputs[0].amount = 6_000_000_000; // too much reward for height 0
        let block = block_with(vec![tx]);
        let mut window = WindowAggregator::new(vec![1]);
        let mut hist = HistogramSet::new();
        let anomaly = process(&block, 0, &mut window, &mut hist).unwrap();
        assert_eq!(anomaly.subsidy, 6_000_000_000);
        assert_eq!(anomaly.max_subsidy, 5_000_000_000);
    }
}
