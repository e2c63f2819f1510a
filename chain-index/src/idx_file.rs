//! A compact fixed-record on-disk form of a built index, so
//! `chain-pipeline` doesn't have to re-walk the block-index LevelDB on
//! every run. Not part of the original spec's interfaces; purely an
//! internal cache between the `build-index` binary and the driver.

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use chain_types::BlockIndexRecord;

/// `client_version`(8) + `height`(4) + `status`(4) + `ntx`(8) +
/// `file_no`(4) + `data_pos`(4) + `undo_pos`(4) + `block_hash`(32) +
/// `previous_hash`(32). The three `Option<u32>` fields store `u32::MAX`
/// for "absent".
pub const RECORD_SIZE: usize = 8 + 4 + 4 + 8 + 4 + 4 + 4 + 32 + 32;

pub fn write_index_file(path: &Path, records: &[BlockIndexRecord]) -> std::io::Result<()> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    for record in records {
        writer.write_all(&encode_record(record))?;
    }
    writer.flush()
}

pub fn read_index_file(path: &Path) -> std::io::Result<Vec<BlockIndexRecord>> {
    let file = File::open(path)?;
    let mut reader = BufReader::new(file);
    let mut buf = Vec::new();
    reader.read_to_end(&mut buf)?;
    Ok(buf.chunks_exact(RECORD_SIZE).map(decode_record).collect())
}

fn encode_record(record: &BlockIndexRecord) -> Vec<u8> {
    let mut buf = Vec::with_capacity(RECORD_SIZE);
    buf.extend_from_slice(&record.client_version.to_le_bytes());
    buf.extend_from_slice(&record.height.to_le_bytes());
    buf.extend_from_slice(&record.status.to_le_bytes());
    buf.extend_from_slice(&record.ntx.to_le_bytes());
    buf.extend_from_slice(&record.file_no.unwrap_or(u32::MAX).to_le_bytes());
    buf.extend_from_slice(&record.data_pos.unwrap_or(u32::MAX).to_le_bytes());
    buf.extend_from_slice(&record.undo_pos.unwrap_or(u32::MAX).to_le_bytes());
    buf.extend_from_slice(&record.block_hash);
    buf.extend_from_slice(&record.previous_hash);
    debug_assert_eq!(buf.len(), RECORD_SIZE);
    buf
}

fn decode_record(buf: &[u8]) -> BlockIndexRecord {
    let client_version = u64::from_le_bytes(buf[0..8].try_into().unwrap());
    let height = u32::from_le_bytes(buf[8..12].try_into().unwrap());
    let status = u32::from_le_bytes(buf[12..16].try_into().unwrap());
    let ntx = u64::from_le_bytes(buf[16..24].try_into().unwrap());
    let file_no = u32::from_le_bytes(buf[24..28].try_into().unwrap());
    let data_pos = u32::from_le_bytes(buf[28..32].try_into().unwrap());
    let undo_pos = u32::from_le_bytes(buf[32..36].try_into().unwrap());
    let mut block_hash = [0u8; 32];
    block_hash.copy_from_slice(&buf[36..68]);
    let mut previous_hash = [0u8; 32];
    previous_hash.copy_from_slice(&buf[68..100]);
    BlockIndexRecord {
        client_version,
        height,
        status,
        ntx,
        file_no: (file_no != u32::MAX).then_some(file_no),
        data_pos: (data_pos != u32::MAX).then_some(data_pos),
        undo_pos: (undo_pos != u32::MAX).then_some(undo_pos),
        block_hash,
        previous_hash,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chain.idx");

        let records = vec![
            BlockIndexRecord {
                client_version: 190_001,
                height: 0,
                status: 0b0001_1000,
                ntx: 1,
                file_no: Some(0),
                data_pos: Some(8),
                undo_pos: None,
                block_hash: [0x11; 32],
                previous_hash: [0; 32],
            },
            BlockIndexRecord {
                client_version: 190_001,
                height: 1,
                status: 0b0001_1000,
                ntx: 2,
                file_no: Some(0),
                data_pos: Some(500),
                undo_pos: Some(600),
                block_hash: [0x22; 32],
                previous_hash: [0x11; 32],
            },
        ];

        write_index_file(&path, &records).unwrap();
        let read_back = read_index_file(&path).unwrap();

        assert_eq!(read_back.len(), 2);
        assert_eq!(read_back[1].undo_pos, Some(600));
        assert_eq!(read_back[0].undo_pos, None);
        assert_eq!(read_back[1].previous_hash, [0x11; 32]);
    }
}
