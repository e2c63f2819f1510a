//! Component F: builds the ordered per-height `{file_no, data_pos}`
//! array the chain driver walks, by resolving each hash in an
//! externally-supplied active-chain hash list against the node's
//! block-index LevelDB.
//!
//! Hashes, here and in the returned records' `block_hash` /
//! `previous_hash` fields, are the node's internal (digest) byte order —
//! the same convention `chain_types::Txid` uses, not the reversed
//! display order RPCs print.

pub mod error;
pub mod idx_file;
pub mod record;

pub use error::{IndexError, Result};
pub use idx_file::{read_index_file, write_index_file};

use rusty_leveldb::{Options, DB};
use std::path::Path;
use tracing::{debug, info};

use chain_types::BlockIndexRecord;

const RECORD_KEY_PREFIX: u8 = b'b';

/// Opens the node's block-index LevelDB and resolves `active_chain`
/// (one 32-byte hash per height, genesis first) into an ordered array
/// of decoded records, with the height-monotonicity and hash-chaining
/// integrity check from spec §4.F applied across the whole array.
pub fn build_index(db_path: &Path, active_chain: &[[u8; 32]]) -> Result<Vec<BlockIndexRecord>> {
    let options = Options::default();
    let mut db = DB::open(db_path, options).map_err(|e| IndexError::Db(e.to_string()))?;

    info!(blocks = active_chain.len(), "building block-position index");

    let mut records = Vec::with_capacity(active_chain.len());
    for (height, hash) in active_chain.iter().enumerate() {
        let mut key = Vec::with_capacity(33);
        key.push(RECORD_KEY_PREFIX);
        key.extend_from_slice(hash);

        let value = db
            .get(&key)
            .ok_or(IndexError::MissingRecord { height: height as u32 })?;

        let record = record::decode_record(*hash, &value)?;
        if record.height != height as u32 {
            return Err(IndexError::Broken {
                height: height as u32,
                reason: "record height does not match position in active-chain list",
            });
        }

        if height % 10_000 == 0 {
            debug!(height, "indexed");
        }

        records.push(record);
    }

    verify_chain(&records)?;
    info!(blocks = records.len(), "index built");
    Ok(records)
}

/// `record[i].height == i` is already checked while resolving each
/// record above; this re-verifies the hash-chaining invariant:
/// `record[0].previous_hash == 0` and `record[i].previous_hash ==
/// record[i-1].block_hash`.
fn verify_chain(records: &[BlockIndexRecord]) -> Result<()> {
    let mut expected_prev = [0u8; 32];
    for (height, record) in records.iter().enumerate() {
        if record.previous_hash != expected_prev {
            return Err(IndexError::Broken {
                height: height as u32,
                reason: "previous_hash does not match the prior record's block_hash",
            });
        }
        expected_prev = record.block_hash;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rusty_leveldb::WriteBatch;

    fn encode_alt_varint(mut n: u64, out: &mut Vec<u8>) {
        let mut bytes = vec![(n & 0x7F) as u8];
        n >>= 7;
        while n > 0 {
            n -= 1;
            bytes.push(0x80 | (n & 0x7F) as u8);
            n >>= 7;
        }
        bytes.reverse();
        out.extend_from_slice(&bytes);
    }

    fn record_value(height: u32, prev_hash: [u8; 32], file_no: u32, data_pos: u32) -> Vec<u8> {
        let mut v = Vec::new();
        encode_alt_varint(190_001, &mut v);
        encode_alt_varint(height as u64, &mut v);
        encode_alt_varint(chain_types::index_record::STATUS_HAVE_DATA as u64, &mut v);
        encode_alt_varint(1, &mut v);
        encode_alt_varint(file_no as u64, &mut v);
        encode_alt_varint(data_pos as u64, &mut v);
        v.extend_from_slice(&1i32.to_le_bytes());
        v.extend_from_slice(&prev_hash);
        v.extend_from_slice(&[0u8; 32]);
        v.extend_from_slice(&1231006505u32.to_le_bytes());
        v.extend_from_slice(&0x1d00ffffu32.to_le_bytes());
        v.extend_from_slice(&2083236893u32.to_le_bytes());
        v
    }

    #[test]
    fn builds_and_verifies_a_two_block_chain() {
        let dir = tempfile::tempdir().unwrap();
        let options = Options::default();
        let mut db = DB::open(dir.path(), options).unwrap();

        let genesis_hash = [0x11u8; 32];
        let block1_hash = [0x22u8; 32];

        let mut batch = WriteBatch::new();
        let mut key0 = vec![RECORD_KEY_PREFIX];
        key0.extend_from_slice(&genesis_hash);
        batch.put(&key0, &record_value(0, [0u8; 32], 0, 100));

        let mut key1 = vec![RECORD_KEY_PREFIX];
        key1.extend_from_slice(&block1_hash);
        batch.put(&key1, &record_value(1, genesis_hash, 0, 250));

        db.write(batch, true).unwrap();
        drop(db);

        let records = build_index(dir.path(), &[genesis_hash, block1_hash]).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].data_pos, Some(100));
        assert_eq!(records[1].data_pos, Some(250));
        assert_eq!(records[1].previous_hash, genesis_hash);
    }

    #[test]
    fn missing_hash_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = build_index(dir.path(), &[[0x99u8; 32]]);
        assert!(matches!(result, Err(IndexError::MissingRecord { height: 0 })));
    }
}
