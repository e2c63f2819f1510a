//! Shared fixtures: known-good raw bytes and small on-disk builders, so
//! each crate's tests don't have to hand-roll the same block/script
//! byte strings.

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

/// The Bitcoin genesis block, raw wire bytes (no magic/size prefix).
pub const GENESIS_BLOCK_HEX: &str = concat!(
    "0100000000000000000000000000000000000000000000000000000000000000000000003ba3edfd",
    "7a7b12b27ac72c3e67768f617fc81bc3888a51323a9fb8aa4b1e5e4a29ab5f49ffff001d1dac2b7c01",
    "01000000010000000000000000000000000000000000000000000000000000000000000000ffffffff",
    "4d04ffff001d0104455468652054696d65732030332f4a616e2f2009204368616e63656c6c6f72206f6e",
    "206272696e6b206f66207365636f6e64206261696c6f757420666f722062616e6b73ffffffff0100f205",
    "2a01000000434104678afdb0fe5548271967f1a67130b7105cd6a828e03909a67962e0ea1f61deb649f6",
    "bc3f4cef38c4f35504e51ec112de5c384df7ba0b8d578a4c702b6bf11d5fac00000000",
);

pub fn genesis_block_bytes() -> Vec<u8> {
    hex::decode(GENESIS_BLOCK_HEX).expect("fixture hex is well-formed")
}

pub const MAINNET_MAGIC: [u8; 4] = [0xF9, 0xBE, 0xB4, 0xD9];

/// Write one or more raw blocks into `dir/blk{file_no:05}.dat`, each
/// preceded by the 4-byte magic and 4-byte little-endian size the node
/// itself writes, mirroring the on-disk layout `chain-codec::FilePool`
/// and `locate_block` expect. Returns the byte offset of each block's
/// first header byte (i.e. the `data_pos` a block-index record would
/// carry for it).
pub fn write_blk_file(dir: &Path, file_no: u32, blocks: &[Vec<u8>]) -> (PathBuf, Vec<u32>) {
    let path = dir.join(format!("blk{file_no:05}.dat"));
    let mut file = File::create(&path).expect("create blk file");
    let mut positions = Vec::with_capacity(blocks.len());
    let mut offset = 0u32;
    for block in blocks {
        file.write_all(&MAINNET_MAGIC).unwrap();
        file.write_all(&(block.len() as u32).to_le_bytes()).unwrap();
        offset += 8;
        positions.push(offset);
        file.write_all(block).unwrap();
        offset += block.len() as u32;
    }
    (path, positions)
}

/// A P2SH-P2WPKH input fixture straight out of spec scenario S6: a
/// 22-byte `OP_0 <20>` redeem script pushed by a 34-byte script_sig.
pub fn p2sh_p2wpkh_fixture() -> (Vec<u8>, Vec<u8>) {
    let redeem = {
        let mut v = vec![0x00u8, 0x14];
        v.extend_from_slice(&[0xABu8; 20]);
        v
    };
    let script_sig = {
        let mut v = vec![redeem.len() as u8];
        v.extend_from_slice(&redeem);
        v
    };
    let prev_script = {
        let mut v = vec![0xa9u8, 0x14];
        v.extend_from_slice(&[0xCDu8; 20]);
        v.push(0x87);
        v
    };
    (script_sig, prev_script)
}
