//! Transaction deserialisation (spec §4.C): version, optional SegWit
//! marker/flag, inputs, outputs, optional per-input witness, locktime.
//!
//! The only explicit state machine in the pipeline lives here: SegWit
//! detection steps through `{HeaderRead, PeekingMarker, Legacy, Segwit,
//! WitnessRead, Done}` as parsing proceeds. It is inlined into
//! `deserialize_transaction` below rather than spelled out as a type,
//! since every state transition is taken exactly once per transaction
//! and the state never needs to be inspected from outside this function.

use crate::byte_reader::ByteReader;
use crate::error::{CodecError, Result};
use crate::script_classifier::classify_created;
use chain_types::transaction::{varint_size, OUTPOINT_NULL_VOUT};
use chain_types::{Input, Output, Script, Transaction, Txid, Witness};

pub fn deserialize_transaction(reader: &mut ByteReader) -> Result<Transaction> {
    let start = reader.position();
    let version = reader.read_le_u32()? as i32;

    // PeekingMarker: a `0x00` byte here is the SegWit marker rather than
    // an input count of zero (Bitcoin never serialises a tx with zero
    // inputs on the wire).
    let marker_pos = reader.position();
    let maybe_marker = reader.read_u8()?;
    let is_segwit = if maybe_marker == 0x00 {
        let flag = reader.read_u8()?;
        if flag != 0x01 {
            return Err(CodecError::BadSegwitFlag { flag });
        }
        true
    } else {
        reader.rewind_to(marker_pos);
        false
    };

    let stripped_start = if is_segwit { reader.position() } else { start };

    let input_count = reader.read_varint()?;
    let mut inputs = Vec::with_capacity(input_count as usize);
    for _ in 0..input_count {
        inputs.push(deserialize_input(reader)?);
    }

    let output_count = reader.read_varint()?;
    let mut outputs = Vec::with_capacity(output_count as usize);
    for _ in 0..output_count {
        outputs.push(deserialize_output(reader)?);
    }

    let stripped_end_marker = reader.position();

    if is_segwit {
        // WitnessRead: one witness stack per input, in input order.
        for input in inputs.iter_mut() {
            let item_count = reader.read_varint()?;
            let mut items = Vec::with_capacity(item_count as usize);
            for _ in 0..item_count {
                let len = reader.read_varint()? as usize;
                items.push(reader.read(len)?.to_vec());
            }
            input.witness = Some(Witness(items));
        }
    }

    let locktime = reader.read_le_u32()?;
    let end = reader.position();

    let size = end - start;
    let stripped_size = if is_segwit {
        // base size: version + inputs + outputs + locktime, skipping
        // the 2-byte marker/flag and the witness section entirely.
        4 + (stripped_end_marker - stripped_start) + 4
    } else {
        size
    };

    let weight = 4 * stripped_size as u64 + (size - stripped_size) as u64;

    let txid = if is_segwit {
        let stripped_bytes = reassemble_stripped(reader, start, stripped_start, stripped_end_marker, locktime);
        Txid::from_stripped_bytes(&stripped_bytes)
    } else {
        Txid::from_stripped_bytes(reader.span(start, end))
    };

    Ok(Transaction {
        version,
        is_segwit,
        inputs,
        outputs,
        locktime,
        txid,
        stripped_size,
        size,
        weight,
        fee: None,
    })
}

/// Legacy txid hashes version + inputs + outputs + locktime with the
/// marker/flag and witness section removed; those two spans are not
/// contiguous in a SegWit transaction's wire bytes, so they are
/// reassembled explicitly rather than hashed as a single slice.
fn reassemble_stripped(
    reader: &ByteReader,
    tx_start: usize,
    stripped_start: usize,
    stripped_end: usize,
    locktime: u32,
) -> Vec<u8> {
    let mut buf = Vec::new();
    buf.extend_from_slice(reader.span(tx_start, tx_start + 4)); // version
    buf.extend_from_slice(reader.span(stripped_start, stripped_end)); // inputs+outputs
    buf.extend_from_slice(&locktime.to_le_bytes());
    buf
}

fn deserialize_input(reader: &mut ByteReader) -> Result<Input> {
    let prev_txid_bytes = reader.read_array32()?;
    let prev_vout = reader.read_le_u32()?;
    let script_len = reader.read_varint()? as usize;
    let script_sig = Script::new(reader.read(script_len)?.to_vec());
    let sequence = reader.read_le_u32()?;

    Ok(Input {
        prev_txid: Txid(prev_txid_bytes),
        prev_vout,
        script_sig,
        sequence,
        witness: None,
        spent_type: None,
        spent_script: None,
        spent_amount: None,
    })
}

fn deserialize_output(reader: &mut ByteReader) -> Result<Output> {
    let amount = reader.read_le_u64()?;
    let script_len = reader.read_varint()? as usize;
    let script_pubkey = Script::new(reader.read(script_len)?.to_vec());
    let created_type = classify_created(&script_pubkey);
    Ok(Output {
        amount,
        script_pubkey,
        created_type,
    })
}

/// Sanity check used by property tests: recompute an output's on-wire
/// size from its parsed fields, matching `chain_types::Output::size`.
pub fn output_wire_size(output: &Output) -> usize {
    8 + varint_size(output.script_pubkey.len() as u64) + output.script_pubkey.len()
}

pub const COINBASE_NULL_VOUT: u32 = OUTPOINT_NULL_VOUT;
