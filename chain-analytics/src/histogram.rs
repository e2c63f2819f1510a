//! Per-input and per-output histograms: `value -> occurrence count` maps
//! keyed by `<base>.<field>`, accumulated across the whole run and
//! flushed once at the end (spec §6 secondary outputs).

use std::collections::BTreeMap;

#[derive(Debug, Default)]
pub struct HistogramSet {
    histograms: BTreeMap<String, BTreeMap<u64, u64>>,
}

impl HistogramSet {
    pub fn new() -> Self {
        HistogramSet::default()
    }

    /// Record one observation of `value` under `<base>.<field>`,
    /// mirroring the original's `Logger.hist(base, {field: value, ...})`
    /// calls in the per-input/per-output analytics.
    pub fn record(&mut self, base: &str, field: &str, value: u64) {
        let metric = format!("{base}.{field}");
        *self.histograms.entry(metric).or_default().entry(value).or_insert(0) += 1;
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &BTreeMap<u64, u64>)> {
        self.histograms.iter().map(|(k, v)| (k.as_str(), v))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_repeated_observations() {
        let mut h = HistogramSet::new();
        h.record("input_P2PKH", "script_sig", 107);
        h.record("input_P2PKH", "script_sig", 107);
        h.record("input_P2PKH", "script_sig", 108);

        let table = h.iter().find(|(k, _)| *k == "input_P2PKH.script_sig").unwrap().1;
        assert_eq!(table[&107], 2);
        assert_eq!(table[&108], 1);
    }
}
