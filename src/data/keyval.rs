//! Key → value-list maps and their multi-way join.
//!
//! A key-value map associates each key with an ordered list of values.
//! [`ExplicitKeyValMap`] is the in-memory realization; [`KeyValMap`] is the
//! read-only view that [`align_maps`] works against, so histograms can take
//! part in a join as well.

use crate::data::value::{compare_slices, Data};
use std::cmp::Ordering;
use std::collections::BTreeMap;

/// Read-only key → value-list view.
pub trait KeyValMap {
    /// Values stored under `key`, in arrival order.
    fn lookup(&self, key: &Data) -> Option<&[Data]>;

    /// Keys in the map's iteration order.
    fn keys(&self) -> Box<dyn Iterator<Item = &Data> + '_>;

    fn key_count(&self) -> usize;
}

/// In-memory multimap from key to a list of values.
#[derive(Debug, Clone, Default)]
pub struct ExplicitKeyValMap {
    entries: BTreeMap<Data, Vec<Data>>,
}

impl ExplicitKeyValMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `value` to the list stored under `key`.
    pub fn insert(&mut self, key: Data, value: Data) {
        self.entries.entry(key).or_default().push(value);
    }

    /// Append every value in `values` under `key`.
    pub fn insert_all(&mut self, key: Data, values: impl IntoIterator<Item = Data>) {
        self.entries.entry(key).or_default().extend(values);
    }

    pub fn get(&self, key: &Data) -> Option<&[Data]> {
        self.entries.get(key).map(Vec::as_slice)
    }

    pub(crate) fn get_mut(&mut self, key: &Data) -> Option<&mut Vec<Data>> {
        self.entries.get_mut(key)
    }

    pub fn contains_key(&self, key: &Data) -> bool {
        self.entries.contains_key(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Data, &[Data])> {
        self.entries.iter().map(|(k, v)| (k, v.as_slice()))
    }

    /// Number of distinct keys.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Total number of values across all keys.
    pub fn value_count(&self) -> usize {
        self.entries.values().map(Vec::len).sum()
    }

    /// Union `other` into `self`. Keys missing here take `other`'s list as
    /// is; keys present in both get `other`'s values appended after the
    /// existing ones.
    pub fn aggregate(&mut self, other: &ExplicitKeyValMap) {
        for (key, values) in &other.entries {
            match self.entries.get_mut(key) {
                Some(existing) => existing.extend(values.iter().cloned()),
                None => {
                    self.entries.insert(key.clone(), values.clone());
                }
            }
        }
    }

    /// Join `self` (as the designated map) with `peers`.
    ///
    /// Each emitted combination holds this map's value first, followed by
    /// one value from each peer in `peers` order. Returns the number of
    /// combinations emitted.
    pub fn align_with<F>(&self, peers: &[&dyn KeyValMap], emit: F) -> usize
    where
        F: FnMut(&Data, &[&Data]),
    {
        let mut maps: Vec<&dyn KeyValMap> = Vec::with_capacity(peers.len() + 1);
        maps.push(self);
        maps.extend_from_slice(peers);
        align_maps(&maps, 0, emit)
    }

    pub(crate) fn compare(&self, other: &ExplicitKeyValMap) -> Ordering {
        for ((ka, va), (kb, vb)) in self.entries.iter().zip(&other.entries) {
            let ord = ka.compare(kb).then_with(|| compare_slices(va, vb));
            if ord != Ordering::Equal {
                return ord;
            }
        }
        self.entries.len().cmp(&other.entries.len())
    }
}

impl KeyValMap for ExplicitKeyValMap {
    fn lookup(&self, key: &Data) -> Option<&[Data]> {
        self.get(key)
    }

    fn keys(&self) -> Box<dyn Iterator<Item = &Data> + '_> {
        Box::new(self.entries.keys())
    }

    fn key_count(&self) -> usize {
        self.entries.len()
    }
}

impl FromIterator<(Data, Data)> for ExplicitKeyValMap {
    fn from_iter<I: IntoIterator<Item = (Data, Data)>>(iter: I) -> Self {
        let mut map = Self::new();
        for (key, value) in iter {
            map.insert(key, value);
        }
        map
    }
}

/// Multi-way equi-join over maps that share one schema.
///
/// For every key of `maps[designated]`, the value lists of *all* maps are
/// collected. A key missing from any map (or holding no values there) is
/// dropped. For the remaining keys, every combination of the per-map value
/// lists is passed to `emit`, one value per map in `maps` order; the first
/// map varies slowest and each list is walked in its stored order.
///
/// Returns the number of combinations emitted.
///
/// # Panics
///
/// Panics if `designated` is out of range.
pub fn align_maps<F>(maps: &[&dyn KeyValMap], designated: usize, mut emit: F) -> usize
where
    F: FnMut(&Data, &[&Data]),
{
    let lead = maps[designated];
    let mut emitted = 0;

    'keys: for key in lead.keys() {
        let mut lists: Vec<&[Data]> = Vec::with_capacity(maps.len());
        for map in maps {
            match map.lookup(key) {
                Some(values) if !values.is_empty() => lists.push(values),
                _ => continue 'keys,
            }
        }
        emitted += emit_product(key, &lists, &mut emit);
    }
    emitted
}

/// Odometer walk over the Cartesian product of `lists`.
fn emit_product<F>(key: &Data, lists: &[&[Data]], emit: &mut F) -> usize
where
    F: FnMut(&Data, &[&Data]),
{
    if lists.is_empty() {
        return 0;
    }
    let mut positions = vec![0usize; lists.len()];
    let mut combo: Vec<&Data> = Vec::with_capacity(lists.len());
    let mut emitted = 0;

    loop {
        combo.clear();
        combo.extend(lists.iter().zip(&positions).map(|(list, &i)| &list[i]));
        emit(key, &combo);
        emitted += 1;

        let mut slot = lists.len();
        loop {
            if slot == 0 {
                return emitted;
            }
            slot -= 1;
            positions[slot] += 1;
            if positions[slot] < lists[slot].len() {
                break;
            }
            positions[slot] = 0;
        }
    }
}
