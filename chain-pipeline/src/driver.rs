//! Component G: the chain driver. Walks `records` height by height,
//! locating and deserialising each block, resolving it against the
//! running UTXO map, feeding the window aggregator and histograms, and
//! flushing whichever windows close at that height.

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chain_analytics::{process, resolve_block, HistogramSet, ReportWriter, UtxoMap, WindowAggregator};
use chain_codec::{deserialize_block, locate_block, FilePool, MAINNET_MAGIC};
use chain_types::BlockIndexRecord;
use tracing::{debug, info, warn};

const HEARTBEAT_INTERVAL: u32 = 10_000;

#[derive(Debug)]
pub enum DriverError {
    MissingBlockData { height: u32 },
    Locate(chain_codec::BlockLocateError),
    Codec(chain_codec::CodecError),
    Resolve(chain_analytics::ResolveError),
    Report(chain_analytics::ReportError),
}

impl std::fmt::Display for DriverError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DriverError::MissingBlockData { height } => write!(f, "block at height {height} has no on-disk data (status lacks HAVE_DATA)"),
            DriverError::Locate(e) => write!(f, "{e}"),
            DriverError::Codec(e) => write!(f, "{e}"),
            DriverError::Resolve(e) => write!(f, "{e}"),
            DriverError::Report(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for DriverError {}

impl From<chain_codec::BlockLocateError> for DriverError {
    fn from(e: chain_codec::BlockLocateError) -> Self {
        DriverError::Locate(e)
    }
}

impl From<chain_codec::CodecError> for DriverError {
    fn from(e: chain_codec::CodecError) -> Self {
        DriverError::Codec(e)
    }
}

impl From<chain_analytics::ResolveError> for DriverError {
    fn from(e: chain_analytics::ResolveError) -> Self {
        DriverError::Resolve(e)
    }
}

impl From<chain_analytics::ReportError> for DriverError {
    fn from(e: chain_analytics::ReportError) -> Self {
        DriverError::Report(e)
    }
}

pub struct DriverConfig {
    pub blocks_dir: std::path::PathBuf,
    pub output_dir: std::path::PathBuf,
    pub window_sizes: Vec<u64>,
    pub compress: bool,
}

/// Runs the full walk over `records` (genesis-first, one entry per
/// height). Returns the height actually reached, which is short of
/// `records.len()` only if `running` was cleared mid-walk.
pub fn run(records: &[BlockIndexRecord], config: &DriverConfig, running: Arc<AtomicBool>) -> Result<u32, DriverError> {
    let mut pool = FilePool::new(&config.blocks_dir);
    let mut utxos = UtxoMap::new();
    let mut window = WindowAggregator::new(config.window_sizes.clone());
    let mut histograms = HistogramSet::new();
    let mut report = ReportWriter::new(&config.output_dir)?;

    info!(blocks = records.len(), dir = %config.blocks_dir.display(), "starting chain walk");

    let mut reached = 0u32;
    for (height, record) in records.iter().enumerate() {
        let height = height as u32;
        if !running.load(Ordering::SeqCst) {
            warn!(height, "interrupt received, stopping walk");
            break;
        }

        let (file_no, data_pos) = match (record.file_no, record.data_pos) {
            (Some(f), Some(d)) if record.has_data() => (f, d),
            _ => return Err(DriverError::MissingBlockData { height }),
        };

        let raw = locate_block(&mut pool, file_no, data_pos, MAINNET_MAGIC)?;
        let mut block = deserialize_block(&raw)?;
        resolve_block(&mut block, &mut utxos)?;

        if let Some(anomaly) = process(&block, height, &mut window, &mut histograms) {
            warn!(height, subsidy = anomaly.subsidy, max_subsidy = anomaly.max_subsidy, "block subsidy does not match the halving schedule");
            report.write_anomaly(&anomaly)?;
        }

        for (metric, window_size, stats) in window.flush_due(height) {
            report.write_stats(&metric, window_size, &stats)?;
        }

        if height % HEARTBEAT_INTERVAL == 0 {
            debug!(height, utxos = utxos.len(), "processed");
        }

        reached = height + 1;
    }

    report.write_histograms(&histograms)?;
    report.finish(config.compress)?;
    info!(reached, "chain walk finished");
    Ok(reached)
}

pub fn load_records(idx_path: Option<&Path>, db_path: Option<&Path>, chain_path: Option<&Path>) -> anyhow::Result<Vec<BlockIndexRecord>> {
    if let Some(idx_path) = idx_path {
        info!(path = %idx_path.display(), "loading cached block-position index");
        return Ok(chain_index::read_index_file(idx_path)?);
    }

    let db_path = db_path.ok_or_else(|| anyhow::anyhow!("either --idx or --db must be given"))?;
    let chain_path = chain_path.ok_or_else(|| anyhow::anyhow!("--chain is required when building the index from --db"))?;

    let active_chain = read_hash_list(chain_path)?;
    Ok(chain_index::build_index(db_path, &active_chain)?)
}

fn read_hash_list(path: &Path) -> anyhow::Result<Vec<[u8; 32]>> {
    let bytes = std::fs::read(path)?;
    if bytes.len() % 32 != 0 {
        anyhow::bail!("active-chain hash list {} is not a multiple of 32 bytes", path.display());
    }
    Ok(bytes.chunks_exact(32).map(|c| c.try_into().expect("chunked to 32 bytes")).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chain_types::index_record::STATUS_HAVE_DATA;

    fn genesis_record(file_no: u32, data_pos: u32) -> BlockIndexRecord {
        BlockIndexRecord {
            client_version: 190_001,
            height: 0,
            status: STATUS_HAVE_DATA,
            ntx: 1,
            file_no: Some(file_no),
            data_pos: Some(data_pos),
            undo_pos: None,
            block_hash: [0x11; 32],
            previous_hash: [0; 32],
        }
    }

    #[test]
    fn walks_a_single_block_and_writes_a_report() {
        let blocks_dir = tempfile::tempdir().unwrap();
        let output_dir = tempfile::tempdir().unwrap();

        let genesis = chain_test_utils::genesis_block_bytes();
        let (_, positions) = chain_test_utils::write_blk_file(blocks_dir.path(), 0, &[genesis]);

        let records = vec![genesis_record(0, positions[0])];
        let config = DriverConfig {
            blocks_dir: blocks_dir.path().to_path_buf(),
            output_dir: output_dir.path().to_path_buf(),
            window_sizes: vec![1],
            compress: false,
        };

        let reached = run(&records, &config, Arc::new(AtomicBool::new(true))).unwrap();
        assert_eq!(reached, 1);
        assert!(output_dir.path().join("block_size-1.csv").exists());
    }

    #[test]
    fn stopping_the_running_flag_halts_before_the_first_block() {
        let blocks_dir = tempfile::tempdir().unwrap();
        let output_dir = tempfile::tempdir().unwrap();
        let records = vec![genesis_record(0, 8)];
        let config = DriverConfig {
            blocks_dir: blocks_dir.path().to_path_buf(),
            output_dir: output_dir.path().to_path_buf(),
            window_sizes: vec![1],
            compress: false,
        };

        let reached = run(&records, &config, Arc::new(AtomicBool::new(false))).unwrap();
        assert_eq!(reached, 0);
    }
}
