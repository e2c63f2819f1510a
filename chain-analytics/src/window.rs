//! Component I: the window aggregator. Mirrors `Window.insert`/
//! `Window.process` exactly — a metric's value type (scalar vs. list) is
//! fixed at first insertion, scalar buffers short of a full window are
//! zero-padded at flush, list buffers are flattened, and quantiles use
//! the standard linear-interpolated ("inclusive") definition.

use std::collections::HashMap;

/// A value passed to `insert`: either a single observation, or several
/// (e.g. one per transaction in a block), flattened together at flush.
#[derive(Debug, Clone)]
pub enum Inserted {
    Scalar(f64),
    List(Vec<f64>),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlushedStats {
    pub mean_height: f64,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub median: f64,
    pub q1: f64,
    pub q5: f64,
    pub q10: f64,
    pub q25: f64,
    pub q75: f64,
    pub q90: f64,
    pub q95: f64,
    pub q99: f64,
    pub cv: f64,
}

struct MetricBuffers {
    /// `None` until the first insertion fixes whether this metric holds
    /// scalars or lists.
    is_list: Option<bool>,
    per_window: HashMap<u64, Vec<Inserted>>,
}

pub struct WindowAggregator {
    window_sizes: Vec<u64>,
    metrics: HashMap<String, MetricBuffers>,
}

impl WindowAggregator {
    pub fn new(window_sizes: Vec<u64>) -> Self {
        WindowAggregator { window_sizes, metrics: HashMap::new() }
    }

    pub fn insert(&mut self, metric: &str, value: Inserted) {
        let is_list_value = matches!(value, Inserted::List(_));
        let window_sizes = &self.window_sizes;
        let entry = self.metrics.entry(metric.to_string()).or_insert_with(|| MetricBuffers {
            is_list: None,
            per_window: window_sizes.iter().map(|&w| (w, Vec::new())).collect(),
        });

        match entry.is_list {
            None => entry.is_list = Some(is_list_value),
            Some(is_list) => debug_assert_eq!(
                is_list, is_list_value,
                "metric {metric} mixed scalar and list insertions"
            ),
        }

        for buffer in entry.per_window.values_mut() {
            buffer.push(value.clone());
        }
    }

    /// Flush every metric's `window_size` buffer, for the window sizes
    /// whose period just closed at `height`. Returns `(metric_name,
    /// window_size, stats)` for every non-empty buffer, then clears
    /// them.
    pub fn flush_due(&mut self, height: u32) -> Vec<(String, u64, FlushedStats)> {
        let mut out = Vec::new();
        for &window_size in &self.window_sizes {
            if (height as u64 + 1) % window_size != 0 {
                continue;
            }
            for (name, buffers) in self.metrics.iter_mut() {
                let Some(buffer) = buffers.per_window.get_mut(&window_size) else { continue };
                if buffer.is_empty() {
                    continue;
                }

                let is_list = buffers.is_list.unwrap_or(false);
                let mut values: Vec<f64> = if is_list {
                    buffer
                        .drain(..)
                        .flat_map(|v| match v {
                            Inserted::List(xs) => xs,
                            Inserted::Scalar(x) => vec![x],
                        })
                        .collect()
                } else {
                    let mut scalars: Vec<f64> = buffer
                        .drain(..)
                        .map(|v| match v {
                            Inserted::Scalar(x) => x,
                            Inserted::List(xs) => xs.into_iter().sum(),
                        })
                        .collect();
                    if scalars.len() < window_size as usize {
                        scalars.resize(window_size as usize, 0.0);
                    }
                    scalars
                };

                if values.is_empty() {
                    continue;
                }

                let mean_height = height as f64 - (window_size as f64 - 1.0) / 2.0;
                let stats = key_values(&mut values, mean_height);
                out.push((name.clone(), window_size, stats));
            }
        }
        out
    }
}

/// Mirrors `Window.py`'s `key_values`: min/max/mean/quantiles/CV over an
/// (unsorted) slice of observations. Sorts `values` in place for the
/// quantile computation.
fn key_values(values: &mut [f64], mean_height: f64) -> FlushedStats {
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / n;
    let cv = if mean != 0.0 { variance.sqrt() / mean } else { f64::NAN };

    values.sort_by(|a, b| a.partial_cmp(b).unwrap());
    let quantile = |p: f64| linear_quantile(values, p);

    FlushedStats {
        mean_height,
        min,
        max,
        mean,
        median: quantile(0.5),
        q1: quantile(0.01),
        q5: quantile(0.05),
        q10: quantile(0.10),
        q25: quantile(0.25),
        q75: quantile(0.75),
        q90: quantile(0.90),
        q95: quantile(0.95),
        q99: quantile(0.99),
        cv,
    }
}

/// The "inclusive" linear-interpolated quantile (numpy's default):
/// index `p * (n-1)` into the sorted slice, interpolating between its
/// floor and ceiling.
fn linear_quantile(sorted: &[f64], p: f64) -> f64 {
    if sorted.len() == 1 {
        return sorted[0];
    }
    let rank = p * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    if lo == hi {
        return sorted[lo];
    }
    let frac = rank - lo as f64;
    sorted[lo] + (sorted[hi] - sorted[lo]) * frac
}


/// Invariant 9 of the testable-properties list: for any window size and
/// any height at which it closes, the flushed `mean_height` follows
/// `height - (window_size-1)/2`, and re-flushing the same height (with
/// nothing re-inserted) yields nothing, since the buffer was cleared.
#[cfg(test)]
mod flush_properties {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn mean_height_matches_formula(window_size in 1u64..500, repeats in 1u32..20) {
            let height = window_size * repeats as u64 - 1;
            prop_assume!(height <= u32::MAX as u64);
            let height = height as u32;

            let mut w = WindowAggregator::new(vec![window_size]);
            w.insert("m", Inserted::Scalar(1.0));
            let flushed = w.flush_due(height);

            prop_assert_eq!(flushed.len(), 1);
            let (_, _, stats) = &flushed[0];
            let expected = height as f64 - (window_size as f64 - 1.0) / 2.0;
            prop_assert!((stats.mean_height - expected).abs() < 1e-9);

            prop_assert!(w.flush_due(height).is_empty());
        }
    }
}
