//! Component J: turns flushed window stats, histograms, and subsidy
//! anomalies into the run's on-disk report. Mirrors `Logger`'s lazily
//! opened per-target files, its `histogram_<target>.dat` dump, and its
//! end-of-run compression step — gzipped via `flate2` here rather than
//! the original's bz2/pandas round-trip, since `flate2` is already part
//! of this workspace's dependency stack and a bz2 crate is not.

use std::collections::HashMap;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use flate2::write::GzEncoder;
use flate2::Compression;

use crate::histogram::HistogramSet;
use crate::metrics::SubsidyAnomaly;
use crate::window::FlushedStats;

const STATS_HEADER: &[&str] = &[
    "mean_height", "min", "max", "mean", "median", "q1", "q5", "q10", "q25", "q75", "q90", "q95", "q99", "CV",
];

#[derive(Debug)]
pub enum ReportError {
    Io(std::io::Error),
    Csv(csv::Error),
}

impl std::fmt::Display for ReportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReportError::Io(e) => write!(f, "I/O error: {e}"),
            ReportError::Csv(e) => write!(f, "CSV error: {e}"),
        }
    }
}

impl std::error::Error for ReportError {}

impl From<std::io::Error> for ReportError {
    fn from(e: std::io::Error) -> Self {
        ReportError::Io(e)
    }
}

impl From<csv::Error> for ReportError {
    fn from(e: csv::Error) -> Self {
        ReportError::Csv(e)
    }
}

pub type Result<T> = std::result::Result<T, ReportError>;

/// Writes `<metric>-<window_size>.csv` files, `histogram_<target>.dat`
/// dumps, and `lost_subsidy.csv`, all under one output directory.
/// A target's CSV writer is opened on first write and kept open for the
/// life of the run, matching `Logger.open`'s one-file-per-target model.
pub struct ReportWriter {
    directory: PathBuf,
    stats_writers: HashMap<String, csv::Writer<File>>,
    anomaly_writer: Option<csv::Writer<File>>,
}

impl ReportWriter {
    pub fn new(directory: impl Into<PathBuf>) -> Result<Self> {
        let directory = directory.into();
        fs::create_dir_all(&directory)?;
        Ok(ReportWriter { directory, stats_writers: HashMap::new(), anomaly_writer: None })
    }

    pub fn write_stats(&mut self, metric: &str, window_size: u64, stats: &FlushedStats) -> Result<()> {
        let target = format!("{metric}-{window_size}");
        if !self.stats_writers.contains_key(&target) {
            let path = self.directory.join(format!("{target}.csv"));
            let mut writer = csv::WriterBuilder::new().has_headers(false).from_path(&path)?;
            writer.write_record(STATS_HEADER)?;
            self.stats_writers.insert(target.clone(), writer);
        }
        let writer = self.stats_writers.get_mut(&target).expect("just inserted");
        writer.write_record(&[
            stats.mean_height.to_string(),
            stats.min.to_string(),
            stats.max.to_string(),
            stats.mean.to_string(),
            stats.median.to_string(),
            stats.q1.to_string(),
            stats.q5.to_string(),
            stats.q10.to_string(),
            stats.q25.to_string(),
            stats.q75.to_string(),
            stats.q90.to_string(),
            stats.q95.to_string(),
            stats.q99.to_string(),
            stats.cv.to_string(),
        ])?;
        Ok(())
    }

    pub fn write_anomaly(&mut self, anomaly: &SubsidyAnomaly) -> Result<()> {
        if self.anomaly_writer.is_none() {
            let path = self.directory.join("lost_subsidy.csv");
            let mut writer = csv::WriterBuilder::new().has_headers(false).from_path(&path)?;
            writer.write_record(["mean_height", "subsidy", "max_subsidy"])?;
            self.anomaly_writer = Some(writer);
        }
        let writer = self.anomaly_writer.as_mut().expect("just inserted");
        writer.write_record(&[
            anomaly.mean_height.to_string(),
            anomaly.subsidy.to_string(),
            anomaly.max_subsidy.to_string(),
        ])?;
        Ok(())
    }

    /// Dumps every accumulated histogram to its own `histogram_<target>.dat`
    /// file, `value occurrence` pairs one per line, matching
    /// `Logger.write_histograms`'s flat text format.
    pub fn write_histograms(&self, histograms: &HistogramSet) -> Result<()> {
        for (target, counts) in histograms.iter() {
            let path = self.directory.join(format!("histogram_{target}.dat"));
            let mut file = File::create(path)?;
            writeln!(file, "# {target}")?;
            writeln!(file, "# value occurrence")?;
            for (value, count) in counts {
                writeln!(file, "{value} {count}")?;
            }
        }
        Ok(())
    }

    /// Flushes every open CSV writer, then gzips each `.csv`/`.dat` file
    /// in place and removes the uncompressed original.
    pub fn finish(mut self, compress: bool) -> Result<()> {
        for writer in self.stats_writers.values_mut() {
            writer.flush()?;
        }
        if let Some(writer) = self.anomaly_writer.as_mut() {
            writer.flush()?;
        }
        drop(self.stats_writers);
        drop(self.anomaly_writer);

        if compress {
            compress_directory(&self.directory)?;
        }
        Ok(())
    }
}

fn compress_directory(directory: &Path) -> Result<()> {
    for entry in fs::read_dir(directory)? {
        let path = entry?.path();
        let Some(extension) = path.extension().and_then(|e| e.to_str()) else { continue };
        if extension != "csv" && extension != "dat" {
            continue;
        }
        let data = fs::read(&path)?;
        let gz_path = path.with_extension(format!("{extension}.gz"));
        let gz_file = File::create(&gz_path)?;
        let mut encoder = GzEncoder::new(gz_file, Compression::default());
        encoder.write_all(&data)?;
        encoder.finish()?;
        fs::remove_file(&path)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::window::{Inserted, WindowAggregator};

    fn sample_stats() -> FlushedStats {
        let mut w = WindowAggregator::new(vec![1]);
        w.insert("m", Inserted::Scalar(42.0));
        w.flush_due(0).remove(0).2
    }

    #[test]
    fn writes_a_header_and_row_per_target() {
        let dir = tempfile::tempdir().unwrap();
        let mut report = ReportWriter::new(dir.path()).unwrap();
        report.write_stats("block_size", 1, &sample_stats()).unwrap();
        report.finish(false).unwrap();

        let contents = fs::read_to_string(dir.path().join("block_size-1.csv")).unwrap();
        let mut lines = contents.lines();
        assert_eq!(lines.next().unwrap(), STATS_HEADER.join(","));
        assert!(lines.next().unwrap().starts_with("0,42,42,42,42"));
    }

    #[test]
    fn anomaly_log_records_mismatched_subsidy() {
        let dir = tempfile::tempdir().unwrap();
        let mut report = ReportWriter::new(dir.path()).unwrap();
        report
            .write_anomaly(&SubsidyAnomaly { mean_height: 100, subsidy: 1, max_subsidy: 5_000_000_000 })
            .unwrap();
        report.finish(false).unwrap();

        let contents = fs::read_to_string(dir.path().join("lost_subsidy.csv")).unwrap();
        assert!(contents.contains("100,1,5000000000"));
    }

    #[test]
    fn compress_gzips_and_removes_originals() {
        let dir = tempfile::tempdir().unwrap();
        let mut report = ReportWriter::new(dir.path()).unwrap();
        report.write_stats("block_size", 1, &sample_stats()).unwrap();
        report.finish(true).unwrap();

        assert!(dir.path().join("block_size-1.csv.gz").exists());
        assert!(!dir.path().join("block_size-1.csv").exists());
    }
}
