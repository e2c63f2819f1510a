//! Bootstrapping binary for component F: reads the active-chain hash
//! list and the node's block-index LevelDB, resolves every hash to its
//! `{file_no, data_pos}` position, and writes the result out as a
//! compact fixed-record `.idx` file so `chain-pipeline` doesn't have to
//! re-walk LevelDB on every run.
//!
//! Mirrors `bootstrap/utxo-dump/src/main.rs`'s shape: a `clap` derive
//! `Args`, `anyhow::Result` at the application boundary, plain progress
//! printing.

use std::fs::File;
use std::io::Read;
use std::path::PathBuf;

use anyhow::{Context, Result};
use chain_index::{build_index, write_index_file};
use clap::Parser;

const VERSION: &str = "1.0.0";

#[derive(Parser)]
#[command(name = "build-index")]
#[command(about = "Resolves the active-chain hash list against the node's block-index LevelDB")]
#[command(version = VERSION)]
struct Args {
    /// Path to a binary file of concatenated 32-byte active-chain block
    /// hashes, genesis first, in the node's internal (digest) byte order.
    #[arg(short = 'c', long = "chain")]
    hash_list: PathBuf,

    /// Path to the node's `blocks/index` LevelDB directory.
    #[arg(short = 'd', long = "db")]
    block_index_db: PathBuf,

    /// Output `.idx` file.
    #[arg(short = 'o', long = "output", default_value = "chain.idx")]
    output: PathBuf,

    /// Do not display progress.
    #[arg(short = 'q', long = "quiet")]
    quiet: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();
    let args = Args::parse();

    let hashes = read_hash_list(&args.hash_list)
        .with_context(|| format!("reading hash list {}", args.hash_list.display()))?;

    if !args.quiet {
        println!("resolving {} hashes against {}", hashes.len(), args.block_index_db.display());
    }

    let records = build_index(&args.block_index_db, &hashes)
        .map_err(|e| anyhow::anyhow!("{e}"))
        .context("building block-position index")?;

    write_index_file(&args.output, &records)
        .with_context(|| format!("writing index to {}", args.output.display()))?;

    if !args.quiet {
        println!("wrote {} records to {}", records.len(), args.output.display());
    }
    Ok(())
}

fn read_hash_list(path: &std::path::Path) -> std::io::Result<Vec<[u8; 32]>> {
    let mut file = File::open(path)?;
    let mut buf = Vec::new();
    file.read_to_end(&mut buf)?;
    Ok(buf
        .chunks_exact(32)
        .map(|chunk| {
            let mut h = [0u8; 32];
            h.copy_from_slice(chunk);
            h
        })
        .collect())
}
