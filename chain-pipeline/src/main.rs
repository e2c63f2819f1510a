mod config;
mod driver;
mod logging;

use std::path::PathBuf;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use signal_hook::{consts::TERM_SIGNALS, iterator::Signals};

use driver::DriverConfig;

const VERSION: &str = "1.0.0";
const DEFAULT_WINDOWS: &[u64] = &[1, 6, 144, 432];

#[derive(Parser)]
#[command(name = "chain-pipeline")]
#[command(about = "Walks a Bitcoin-family chain from blk*.dat files, computing windowed chain metrics")]
#[command(version = VERSION)]
struct Args {
    /// Optional TOML config file; any field not given on the command line
    /// falls back to this file, then to the built-in defaults.
    #[arg(long = "config", value_hint = clap::ValueHint::FilePath)]
    config: Option<PathBuf>,

    /// Path to a cached `.idx` file produced by `build-index`. Mutually
    /// exclusive with --db/--chain; skips re-walking the block-index LevelDB.
    #[arg(long = "idx", value_hint = clap::ValueHint::FilePath)]
    idx: Option<PathBuf>,

    /// Path to the node's block-index LevelDB (chainstate's sibling `blocks/index`).
    #[arg(short = 'd', long = "db", value_hint = clap::ValueHint::DirPath)]
    db: Option<PathBuf>,

    /// Path to a flat file of 32-byte active-chain block hashes, genesis first.
    #[arg(short = 'c', long = "chain", value_hint = clap::ValueHint::FilePath)]
    chain: Option<PathBuf>,

    /// Directory containing the node's blk*.dat files.
    #[arg(short = 'b', long = "blocks", value_hint = clap::ValueHint::DirPath)]
    blocks: Option<PathBuf>,

    /// Directory to write per-metric CSVs, histograms, and the anomaly log to.
    #[arg(short = 'o', long = "output")]
    output: Option<PathBuf>,

    /// Comma-separated window sizes, in blocks.
    #[arg(short = 'w', long = "windows", value_delimiter = ',')]
    windows: Option<Vec<u64>>,

    /// Skip gzipping the CSV/histogram files once the walk finishes
    /// (compression runs by default, matching the original's unconditional
    /// end-of-run compression step).
    #[arg(long = "no-compress", action = clap::ArgAction::SetFalse)]
    compress: bool,

    /// Directory to additionally write a daily-rolling log file to.
    #[arg(long = "log-dir", value_hint = clap::ValueHint::DirPath)]
    log_dir: Option<PathBuf>,

    /// Suppress info-level logging (warnings and errors only).
    #[arg(short = 'q', long = "quiet")]
    quiet: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();
    let file_config = match &args.config {
        Some(path) => config::load(path).context("failed to load config file")?,
        None => config::FileConfig::default(),
    };

    let quiet = args.quiet || file_config.quiet.unwrap_or(false);
    let log_dir = args.log_dir.clone().or_else(|| file_config.log_dir.clone());
    let _guard = logging::init(quiet, log_dir.as_deref());

    let idx = args.idx.clone().or_else(|| file_config.idx.clone());
    let db = args.db.clone().or_else(|| file_config.db.clone());
    let chain = args.chain.clone().or_else(|| file_config.chain.clone());
    let blocks = config::resolve(args.blocks.clone(), file_config.blocks.clone(), PathBuf::new());
    if blocks.as_os_str().is_empty() {
        anyhow::bail!("a blk*.dat directory is required (--blocks or the config file's `blocks` key)");
    }
    let output = config::resolve(args.output.clone(), file_config.output.clone(), PathBuf::from("report"));
    let windows = config::resolve(args.windows.clone(), file_config.windows.clone(), DEFAULT_WINDOWS.to_vec());
    let compress = args.compress && file_config.compress.unwrap_or(true);

    let records = driver::load_records(idx.as_deref(), db.as_deref(), chain.as_deref())
        .context("failed to load the block-position index")?;

    let running = Arc::new(AtomicBool::new(true));
    let running_for_signal = running.clone();
    std::thread::spawn(move || {
        let mut signals = Signals::new(TERM_SIGNALS).expect("failed to register signal handler");
        signals.wait();
        running_for_signal.store(false, std::sync::atomic::Ordering::SeqCst);
    });

    let config = DriverConfig {
        blocks_dir: blocks,
        output_dir: output,
        window_sizes: windows,
        compress,
    };

    let reached = driver::run(&records, &config, running).context("chain walk failed")?;
    if !quiet {
        println!("processed {reached} blocks");
    }
    Ok(())
}
