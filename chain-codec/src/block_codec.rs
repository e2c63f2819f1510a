//! Block location and deserialisation (spec §4.D and the locate step of
//! §4.G): seek to a block's position in its `blk*.dat` file, verify the
//! magic and declared size, then parse the 80-byte header followed by a
//! varint-prefixed transaction list.

use crate::byte_reader::ByteReader;
use crate::error::{CodecError, Result};
use crate::file_pool::FilePool;
use crate::transaction_codec::deserialize_transaction;
use chain_types::block::BLOCK_HEADER_SIZE;
use chain_types::{Block, BlockHeader};
use std::io;

pub const MAINNET_MAGIC: [u8; 4] = [0xF9, 0xBE, 0xB4, 0xD9];

/// Seek to `data_pos - 8` (4 bytes of magic precede the position the
/// index records, 4 bytes of declared size follow it), verify the
/// magic, and read back exactly the declared number of block bytes.
pub fn locate_block(
    pool: &mut FilePool,
    file_no: u32,
    data_pos: u32,
    expected_magic: [u8; 4],
) -> std::result::Result<Vec<u8>, BlockLocateError> {
    let header_offset = (data_pos as u64).saturating_sub(8);
    let header = pool
        .read_at(file_no, header_offset, 8)
        .map_err(BlockLocateError::Io)?;
    let mut magic = [0u8; 4];
    magic.copy_from_slice(&header[..4]);
    if magic != expected_magic {
        return Err(BlockLocateError::Codec(CodecError::BadMagic { found: magic }));
    }
    let declared_size = u32::from_le_bytes([header[4], header[5], header[6], header[7]]);
    pool.read_at(file_no, header_offset + 8, declared_size as usize)
        .map_err(BlockLocateError::Io)
}

#[derive(Debug)]
pub enum BlockLocateError {
    Io(io::Error),
    Codec(CodecError),
}

impl std::fmt::Display for BlockLocateError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BlockLocateError::Io(e) => write!(f, "{e}"),
            BlockLocateError::Codec(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for BlockLocateError {}

pub fn deserialize_block(raw: &[u8]) -> Result<Block> {
    let mut reader = ByteReader::new(raw);
    let header = deserialize_header(&mut reader)?;

    let tx_count = reader.read_varint()?;
    let mut transactions = Vec::with_capacity(tx_count as usize);
    for _ in 0..tx_count {
        transactions.push(deserialize_transaction(&mut reader)?);
    }

    if reader.remaining() != 0 {
        return Err(CodecError::SizeMismatch {
            declared: raw.len() as u32,
            consumed: reader.position(),
        });
    }

    let stripped_size = BLOCK_HEADER_SIZE
        + varint_len(tx_count)
        + transactions.iter().map(|t| t.stripped_size).sum::<usize>();
    let size = raw.len();
    let weight = 4 * stripped_size as u64 + (size - stripped_size) as u64;

    Ok(Block {
        header,
        transactions,
        size,
        stripped_size,
        weight,
    })
}

fn deserialize_header(reader: &mut ByteReader) -> Result<BlockHeader> {
    let version = reader.read_le_u32()? as i32;
    let prev_hash = reader.read_array32()?;
    let merkle_root = reader.read_array32()?;
    let timestamp = reader.read_le_u32()?;
    let bits = reader.read_le_u32()?;
    let nonce = reader.read_le_u32()?;
    Ok(BlockHeader {
        version,
        prev_hash,
        merkle_root,
        timestamp,
        bits,
        nonce,
    })
}

fn varint_len(n: u64) -> usize {
    chain_types::transaction::varint_size(n)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header_bytes() -> Vec<u8> {
        let mut h = Vec::new();
        h.extend_from_slice(&1i32.to_le_bytes());
        h.extend_from_slice(&[0u8; 32]);
        h.extend_from_slice(&[0u8; 32]);
        h.extend_from_slice(&1231006505u32.to_le_bytes());
        h.extend_from_slice(&0x1d00ffffu32.to_le_bytes());
        h.extend_from_slice(&2083236893u32.to_le_bytes());
        h
    }

    fn coinbase_tx_bytes() -> Vec<u8> {
        let mut tx = Vec::new();
        tx.extend_from_slice(&1i32.to_le_bytes());
        tx.push(1);
        tx.extend_from_slice(&[0u8; 32]);
        tx.extend_from_slice(&0xFFFF_FFFFu32.to_le_bytes());
        tx.push(0);
        tx.extend_from_slice(&0xFFFF_FFFFu32.to_le_bytes());
        tx.push(1);
        tx.extend_from_slice(&5_000_000_000u64.to_le_bytes());
        let pubkey_script = {
            let mut s = vec![65u8];
            s.extend_from_slice(&[0xAAu8; 65]);
            s.push(0xac);
            s
        };
        tx.push(pubkey_script.len() as u8);
        tx.extend_from_slice(&pubkey_script);
        tx.extend_from_slice(&0u32.to_le_bytes());
        tx
    }

    #[test]
    fn parses_single_tx_block() {
        let mut raw = header_bytes();
        raw.push(1); // tx count
        raw.extend_from_slice(&coinbase_tx_bytes());

        let block = deserialize_block(&raw).unwrap();
        assert_eq!(block.transactions.len(), 1);
        assert_eq!(block.size, raw.len());
        assert_eq!(block.stripped_size, block.size);
        assert_eq!(block.weight, 4 * block.size as u64);
    }

    #[test]
    fn rejects_trailing_garbage() {
        let mut raw = header_bytes();
        raw.push(1);
        raw.extend_from_slice(&coinbase_tx_bytes());
        raw.push(0xff); // trailing byte not declared by tx count

        assert!(matches!(
            deserialize_block(&raw),
            Err(CodecError::SizeMismatch { .. })
        ));
    }

    fn segwit_tx_bytes(witness_item_len: u8) -> Vec<u8> {
        let mut tx = Vec::new();
        tx.extend_from_slice(&2i32.to_le_bytes());
        tx.push(0x00);
        tx.push(0x01);
        tx.push(1);
        tx.extend_from_slice(&[0xAAu8; 32]);
        tx.extend_from_slice(&0u32.to_le_bytes());
        tx.push(0);
        tx.extend_from_slice(&0xFFFF_FFFFu32.to_le_bytes());
        tx.push(1);
        tx.extend_from_slice(&1000u64.to_le_bytes());
        tx.push(2);
        tx.extend_from_slice(&[0x51, 0x51]);
        tx.push(1);
        tx.push(witness_item_len);
        tx.extend_from_slice(&vec![0x07u8; witness_item_len as usize]);
        tx.extend_from_slice(&0u32.to_le_bytes());
        tx
    }

    proptest::proptest! {
        /// Invariant 1 of the testable-properties list: a block's weight
        /// always equals `4*stripped_size + Σ(t.size - t.stripped_size)`,
        /// for a mix of legacy and SegWit transactions.
        #[test]
        fn block_weight_matches_formula(
            segwit_count in 0usize..4,
            witness_item_len in 0u8..50,
        ) {
            let mut raw = header_bytes();
            let tx_count = 1 + segwit_count;
            raw.push(tx_count as u8);
            raw.extend_from_slice(&coinbase_tx_bytes());
            for _ in 0..segwit_count {
                raw.extend_from_slice(&segwit_tx_bytes(witness_item_len));
            }

            let block = deserialize_block(&raw).unwrap();
            let witness_delta: u64 = block.transactions.iter().map(|t| (t.size - t.stripped_size) as u64).sum();
            proptest::prop_assert_eq!(block.weight, 4 * block.stripped_size as u64 + witness_delta);
        }
    }
}
