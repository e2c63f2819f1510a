//! Decodes a single `'b'`-prefixed block-index value into a
//! [`BlockIndexRecord`].
//!
//! Layout (`CDiskBlockIndex::SerializationOp` in the node's `chain.h`),
//! every scalar field the node's internal "alt" varint: `client_version`,
//! `height`, `status`, `ntx`, then conditionally `file_no` (if
//! `HAVE_DATA | HAVE_UNDO`), `data_pos` (if `HAVE_DATA`), `undo_pos` (if
//! `HAVE_UNDO`), followed by the raw 80-byte block header.

use chain_codec::ByteReader;
use chain_types::index_record::{STATUS_FAILED_CHILD, STATUS_FAILED_VALID, STATUS_HAVE_DATA, STATUS_HAVE_UNDO};
use chain_types::BlockIndexRecord;

use crate::error::{IndexError, Result};

/// Decode one record. `block_hash` is the 32-byte hash used to look the
/// record up (the LevelDB key minus its leading `'b'`), carried through
/// untouched into the decoded record.
pub fn decode_record(block_hash: [u8; 32], value: &[u8]) -> Result<BlockIndexRecord> {
    let mut reader = ByteReader::new(value);

    let client_version = reader.read_alt_varint()?;
    let height = reader.read_alt_varint()? as u32;
    let status = reader.read_alt_varint()? as u32;

    if status & (STATUS_FAILED_VALID | STATUS_FAILED_CHILD) != 0 {
        return Err(IndexError::FailedBlock { height, status });
    }

    let ntx = reader.read_alt_varint()?;

    let file_no = if status & (STATUS_HAVE_DATA | STATUS_HAVE_UNDO) != 0 {
        Some(reader.read_alt_varint()? as u32)
    } else {
        None
    };
    let data_pos = if status & STATUS_HAVE_DATA != 0 {
        Some(reader.read_alt_varint()? as u32)
    } else {
        None
    };
    let undo_pos = if status & STATUS_HAVE_UNDO != 0 {
        Some(reader.read_alt_varint()? as u32)
    } else {
        None
    };

    let _block_version = reader.read_le_u32()?;
    let previous_hash = reader.read_array32()?;
    let _merkle_root = reader.read_array32()?;
    let _timestamp = reader.read_le_u32()?;
    let _bits = reader.read_le_u32()?;
    let _nonce = reader.read_le_u32()?;

    Ok(BlockIndexRecord {
        client_version,
        height,
        status,
        ntx,
        file_no,
        data_pos,
        undo_pos,
        block_hash,
        previous_hash,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

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

    fn build_record_value(height: u32, status: u32, file_no: u32, data_pos: u32) -> Vec<u8> {
        let mut v = Vec::new();
        encode_alt_varint(190_001, &mut v);
        encode_alt_varint(height as u64, &mut v);
        encode_alt_varint(status as u64, &mut v);
        encode_alt_varint(1, &mut v); // ntx
        if status & (STATUS_HAVE_DATA | STATUS_HAVE_UNDO) != 0 {
            encode_alt_varint(file_no as u64, &mut v);
        }
        if status & STATUS_HAVE_DATA != 0 {
            encode_alt_varint(data_pos as u64, &mut v);
        }
        v.extend_from_slice(&1i32.to_le_bytes());
        v.extend_from_slice(&[0u8; 32]); // previous_hash
        v.extend_from_slice(&[0u8; 32]); // merkle_root
        v.extend_from_slice(&1231006505u32.to_le_bytes());
        v.extend_from_slice(&0x1d00ffffu32.to_le_bytes());
        v.extend_from_slice(&2083236893u32.to_le_bytes());
        v
    }

    #[test]
    fn decodes_a_well_formed_record() {
        let value = build_record_value(5, STATUS_HAVE_DATA, 0, 123);
        let record = decode_record([0xAB; 32], &value).unwrap();
        assert_eq!(record.height, 5);
        assert_eq!(record.file_no, Some(0));
        assert_eq!(record.data_pos, Some(123));
        assert_eq!(record.undo_pos, None);
        assert!(record.has_data());
        assert!(!record.has_undo());
    }

    #[test]
    fn rejects_failed_status() {
        let value = build_record_value(5, STATUS_FAILED_VALID, 0, 0);
        assert!(matches!(
            decode_record([0; 32], &value),
            Err(IndexError::FailedBlock { .. })
        ));
    }
}
