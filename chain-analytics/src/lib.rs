//! UTXO map maintenance, input/output resolution, metric computation,
//! window aggregation, and report output for a deserialised block
//! stream. `chain-pipeline` drives this crate one block at a time; none
//! of these modules touch the filesystem beyond `csv_writer`.

pub mod csv_writer;
pub mod histogram;
pub mod metrics;
pub mod resolve;
pub mod subsidy;
pub mod utxo_map;
pub mod window;

pub use csv_writer::{ReportError, ReportWriter};
pub use histogram::HistogramSet;
pub use metrics::{process, SubsidyAnomaly};
pub use resolve::{resolve_block, ResolveError};
pub use subsidy::{bits_to_diff, max_block_subsidy};
pub use utxo_map::UtxoMap;
pub use window::{FlushedStats, Inserted, WindowAggregator};
