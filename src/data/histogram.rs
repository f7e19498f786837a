//! Histogram values.
//!
//! A [`HistogramBin`] starts with start, end and count unset and becomes
//! initialized once all three are set. A [`Histogram`] is a key-value map
//! from bin start to a one-element list holding the bin; it is initialized
//! once both its min and max bounds are set.

use crate::data::keyval::{ExplicitKeyValMap, KeyValMap};
use crate::data::value::Data;
use std::cmp::Ordering;

/// Count of values falling in `[start, end)`.
#[derive(Debug, Clone, Copy, Default)]
pub struct HistogramBin {
    start: Option<f64>,
    end: Option<f64>,
    count: Option<i64>,
}

impl HistogramBin {
    /// A bin with every field unset.
    pub fn new() -> Self {
        Self::default()
    }

    /// A fully initialized bin.
    pub fn with(start: f64, end: f64, count: i64) -> Self {
        Self {
            start: Some(start),
            end: Some(end),
            count: Some(count),
        }
    }

    pub fn set_start(&mut self, start: f64) {
        self.start = Some(start);
    }

    pub fn set_end(&mut self, end: f64) {
        self.end = Some(end);
    }

    pub fn set_count(&mut self, count: i64) {
        self.count = Some(count);
    }

    pub fn start(&self) -> Option<f64> {
        self.start
    }

    pub fn end(&self) -> Option<f64> {
        self.end
    }

    pub fn count(&self) -> Option<i64> {
        self.count
    }

    pub fn is_initialized(&self) -> bool {
        self.start.is_some() && self.end.is_some() && self.count.is_some()
    }

    /// Add `other`'s count when both bins cover exactly the same range.
    ///
    /// Bins with different (or unset) ranges are left untouched and `false`
    /// is returned; the caller decides whether that is an error.
    pub fn merge(&mut self, other: &HistogramBin) -> bool {
        let same_range = self.is_initialized()
            && other.is_initialized()
            && self.start == other.start
            && self.end == other.end;
        if !same_range {
            return false;
        }
        if let (Some(mine), Some(theirs)) = (self.count, other.count) {
            self.count = Some(mine + theirs);
        }
        true
    }

    pub(crate) fn compare(&self, other: &HistogramBin) -> Ordering {
        compare_opt_f64(self.start, other.start)
            .then_with(|| compare_opt_f64(self.end, other.end))
            .then_with(|| self.count.cmp(&other.count))
    }
}

/// Bins keyed by their start value.
#[derive(Debug, Clone, Default)]
pub struct Histogram {
    min: Option<f64>,
    max: Option<f64>,
    bins: ExplicitKeyValMap,
}

impl Histogram {
    pub fn new() -> Self {
        Self::default()
    }

    /// An initialized, empty histogram over `[min, max]`.
    pub fn with_bounds(min: f64, max: f64) -> Self {
        Self {
            min: Some(min),
            max: Some(max),
            bins: ExplicitKeyValMap::new(),
        }
    }

    pub fn set_min(&mut self, min: f64) {
        self.min = Some(min);
    }

    pub fn set_max(&mut self, max: f64) {
        self.max = Some(max);
    }

    pub fn min(&self) -> Option<f64> {
        self.min
    }

    pub fn max(&self) -> Option<f64> {
        self.max
    }

    pub fn is_initialized(&self) -> bool {
        self.min.is_some() && self.max.is_some()
    }

    /// Insert a copy of `bin` at `key`, or merge it into the bin already
    /// there. Returns `false` when an existing bin's range did not match.
    pub fn aggregate_bin(&mut self, key: f64, bin: &HistogramBin) -> bool {
        let key = Data::Double(key);
        if let Some(list) = self.bins.get_mut(&key) {
            return match list.first_mut() {
                Some(Data::HistogramBin(existing)) => existing.merge(bin),
                _ => unreachable!("histogram entries always hold one bin"),
            };
        }
        self.bins.insert(key, Data::HistogramBin(*bin));
        true
    }

    /// Aggregate every bin of `other` into `self`, bin by bin. Returns the
    /// number of bins whose ranges did not match.
    pub fn join(&mut self, other: &Histogram) -> usize {
        let mut mismatched = 0;
        for (key, bin) in other.bins() {
            if !self.aggregate_bin(key, bin) {
                mismatched += 1;
            }
        }
        mismatched
    }

    pub fn bin(&self, key: f64) -> Option<&HistogramBin> {
        match self.bins.get(&Data::Double(key))?.first()? {
            Data::HistogramBin(bin) => Some(bin),
            _ => None,
        }
    }

    /// Bins in ascending start order.
    pub fn bins(&self) -> impl Iterator<Item = (f64, &HistogramBin)> {
        self.bins.iter().filter_map(|(key, list)| match (key, list.first()) {
            (Data::Double(start), Some(Data::HistogramBin(bin))) => Some((*start, bin)),
            _ => None,
        })
    }

    pub fn bin_count(&self) -> usize {
        self.bins.len()
    }

    /// Sum of all set bin counts.
    pub fn total_count(&self) -> i64 {
        self.bins().filter_map(|(_, bin)| bin.count()).sum()
    }

    pub(crate) fn as_map(&self) -> &ExplicitKeyValMap {
        &self.bins
    }

    pub(crate) fn from_parts(min: f64, max: f64, bins: ExplicitKeyValMap) -> Self {
        Self {
            min: Some(min),
            max: Some(max),
            bins,
        }
    }

    pub(crate) fn compare(&self, other: &Histogram) -> Ordering {
        compare_opt_f64(self.min, other.min)
            .then_with(|| compare_opt_f64(self.max, other.max))
            .then_with(|| self.bins.compare(&other.bins))
    }
}

impl KeyValMap for Histogram {
    fn lookup(&self, key: &Data) -> Option<&[Data]> {
        self.bins.get(key)
    }

    fn keys(&self) -> Box<dyn Iterator<Item = &Data> + '_> {
        self.bins.keys()
    }

    fn key_count(&self) -> usize {
        self.bins.len()
    }
}

fn compare_opt_f64(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (Some(x), Some(y)) => x.total_cmp(&y),
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
    }
}
