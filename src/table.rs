use alloc::vec::Vec;
use core::fmt::Debug;

use crate::bucket::Bucket;
use crate::bucket::DefaultBucket;
use crate::bucket::Entries;
use crate::config::Config;
use crate::error::Error;
use crate::hash_policy::HashPolicy;
use crate::hash_policy::ModuloHash;

/// A fixed-capacity multimap from `i32` keys to `i32` values using chained
/// hashing.
///
/// The bucket count is fixed at creation to `requested_size * amplification`
/// and never changes; there is no rehashing. Duplicate keys are always
/// accepted, and entries sharing a bucket are kept most-recent-first. Every
/// operation computes one bucket index through the table's [`HashPolicy`]
/// and touches only that bucket's chain.
///
/// `B` selects the chain representation, see [`Bucket`].
///
/// ## Example
///
/// ```rust
/// # use chained_multimap::ChainedTable;
/// # use chained_multimap::Config;
/// # use chained_multimap::ModuloHash;
/// #
/// let mut table: ChainedTable =
///     ChainedTable::with_config(10, ModuloHash, Config::new().amplification(5)).unwrap();
/// table.put(0, -1).unwrap();
/// table.put(0, 1).unwrap();
/// table.put(0, 2).unwrap();
///
/// // Too small a buffer still reports the total number of matches.
/// let mut values = [0; 1];
/// assert_eq!(table.get(0, &mut values), 3);
/// assert_eq!(values, [2]);
///
/// let mut values = [0; 3];
/// assert_eq!(table.get(0, &mut values), 3);
/// assert_eq!(values, [2, 1, -1]);
/// ```
pub struct ChainedTable<P = ModuloHash, B = DefaultBucket> {
    buckets: Vec<B>,
    policy: P,
    amplification: usize,
    populated: usize,
}

impl<P, B: Bucket> Debug for ChainedTable<P, B> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ChainedTable")
            .field("capacity", &self.capacity())
            .field("populated", &self.populated)
            .field("amplification", &self.amplification)
            .field("entries", &DebugEntries(self))
            .finish()
    }
}

struct DebugEntries<'a, P, B>(&'a ChainedTable<P, B>);

impl<P, B: Bucket> Debug for DebugEntries<'_, P, B> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_map().entries(self.0.iter()).finish()
    }
}

impl<B: Bucket> ChainedTable<ModuloHash, B> {
    /// Creates a table sized for `requested_size` entries using the default
    /// [`Config`] and [`ModuloHash`].
    ///
    /// # Errors
    ///
    /// See [`ChainedTable::with_config`].
    pub fn with_size(requested_size: usize) -> Result<Self, Error> {
        Self::with_config(requested_size, ModuloHash, Config::new())
    }
}

impl<P: HashPolicy, B: Bucket> ChainedTable<P, B> {
    /// Creates a table sized for `requested_size` entries with the given
    /// policy and the default [`Config`].
    ///
    /// # Errors
    ///
    /// See [`ChainedTable::with_config`].
    pub fn with_size_and_policy(requested_size: usize, policy: P) -> Result<Self, Error> {
        Self::with_config(requested_size, policy, Config::new())
    }

    /// Creates a table of `requested_size * config.amplification_factor()`
    /// empty buckets.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidSize`] if `requested_size` or the amplification
    ///   factor is zero.
    /// - [`Error::AllocationFailure`] if the bucket count overflows or the
    ///   bucket array cannot be allocated. Nothing is left allocated.
    ///
    /// ```rust
    /// # use chained_multimap::ChainedTable;
    /// # use chained_multimap::ConstantHash;
    /// # use chained_multimap::Config;
    /// # use chained_multimap::Error;
    /// # use chained_multimap::InlineBucket;
    /// #
    /// let table: Result<ChainedTable<_, InlineBucket>, _> =
    ///     ChainedTable::with_config(0, ConstantHash, Config::new());
    /// assert_eq!(table.unwrap_err(), Error::InvalidSize);
    /// ```
    pub fn with_config(requested_size: usize, policy: P, config: Config) -> Result<Self, Error> {
        let amplification = config.amplification_factor();
        if requested_size == 0 || amplification == 0 {
            return Err(Error::InvalidSize);
        }

        let Some(capacity) = config.capacity_for(requested_size) else {
            log::warn!("bucket count {requested_size} x {amplification} overflows usize");
            return Err(Error::AllocationFailure);
        };

        let mut buckets = Vec::new();
        if let Err(err) = buckets.try_reserve_exact(capacity) {
            log::warn!("bucket array allocation for {capacity} buckets failed: {err}");
            return Err(Error::AllocationFailure);
        }
        buckets.resize_with(capacity, B::default);

        log::debug!(
            "created table for {requested_size} entries with {capacity} buckets (amplification {amplification})"
        );

        Ok(Self {
            buckets,
            policy,
            amplification,
            populated: 0,
        })
    }

    #[inline(always)]
    fn bucket_index(&self, key: i32) -> usize {
        let index = self.policy.bucket_index(key, self.buckets.len());
        debug_assert!(
            index < self.buckets.len(),
            "hash policy returned bucket {index} for capacity {}",
            self.buckets.len()
        );
        index
    }

    /// Inserts `(key, value)` as the most recent entry for `key`.
    ///
    /// Duplicates are always accepted and the table never grows, regardless
    /// of chain length.
    ///
    /// # Errors
    ///
    /// [`Error::AllocationFailure`] if the entry cannot be allocated; the
    /// table is unchanged.
    ///
    /// # Panics
    ///
    /// If the hash policy returns an index outside `0..capacity`.
    pub fn put(&mut self, key: i32, value: i32) -> Result<(), Error> {
        let index = self.bucket_index(key);
        self.buckets[index].push_front(key, value)?;
        self.populated += 1;
        Ok(())
    }

    /// Copies the values stored under `key` into `out`, most recent first,
    /// and returns the total number of matches.
    ///
    /// At most `out.len()` values are written. A return value larger than
    /// `out.len()` means the caller should retry with a buffer at least that
    /// long to see the remaining values. Slots past the number of matches
    /// are left untouched.
    ///
    /// ```rust
    /// # use chained_multimap::ChainedTable;
    /// #
    /// let mut table: ChainedTable = ChainedTable::with_size(4).unwrap();
    /// for value in 0..5 {
    ///     table.put(7, value).unwrap();
    /// }
    ///
    /// let mut values = vec![0; 2];
    /// let matches = table.get(7, &mut values);
    /// if matches > values.len() {
    ///     values.resize(matches, 0);
    ///     table.get(7, &mut values);
    /// }
    /// assert_eq!(values, [4, 3, 2, 1, 0]);
    /// ```
    pub fn get(&self, key: i32, out: &mut [i32]) -> usize {
        let mut matches = 0;
        for value in self.values(key) {
            if let Some(slot) = out.get_mut(matches) {
                *slot = value;
            }
            matches += 1;
        }
        matches
    }

    /// Returns an iterator over the values stored under `key`, most recent
    /// first.
    pub fn values(&self, key: i32) -> Values<'_> {
        let index = self.bucket_index(key);
        Values {
            entries: self.buckets[index].entries(),
            key,
        }
    }

    /// Returns the number of entries stored under `key`.
    pub fn count(&self, key: i32) -> usize {
        self.values(key).count()
    }

    /// Returns `true` if at least one entry is stored under `key`.
    pub fn contains_key(&self, key: i32) -> bool {
        self.values(key).next().is_some()
    }

    /// Removes every entry stored under `key` and returns how many were
    /// removed. Erasing an absent key does nothing.
    ///
    /// Entries sharing the bucket keep their relative order.
    pub fn erase(&mut self, key: i32) -> usize {
        let index = self.bucket_index(key);
        let removed = self.buckets[index].remove_key(key);
        self.populated -= removed;
        log::trace!("erased {removed} entries for key {key} from bucket {index}");
        removed
    }
}

impl<P, B: Bucket> ChainedTable<P, B> {
    /// Returns the number of entries in the table.
    pub fn len(&self) -> usize {
        self.populated
    }

    /// Returns `true` if the table holds no entries.
    pub fn is_empty(&self) -> bool {
        self.populated == 0
    }

    /// Returns the fixed number of buckets.
    pub fn capacity(&self) -> usize {
        self.buckets.len()
    }

    /// Returns the amplification factor the table was created with.
    pub fn amplification(&self) -> usize {
        self.amplification
    }

    /// Returns `len / capacity`.
    pub fn load_factor(&self) -> f64 {
        self.populated as f64 / self.buckets.len() as f64
    }

    /// Returns the table's hash policy.
    pub fn policy(&self) -> &P {
        &self.policy
    }

    #[cfg(any(test, feature = "stats"))]
    pub(crate) fn buckets(&self) -> &[B] {
        &self.buckets
    }

    /// Iterates over every `(key, value)` pair.
    ///
    /// Buckets are visited in index order and each chain most-recent-first;
    /// no ordering across keys is implied.
    pub fn iter(&self) -> Iter<'_, B> {
        Iter {
            buckets: self.buckets.iter(),
            current: None,
            remaining: self.populated,
        }
    }

    /// Frees every entry while keeping the bucket array. Returns the number
    /// of entries freed.
    pub fn clear(&mut self) -> usize {
        let freed: usize = self.buckets.iter_mut().map(Bucket::clear).sum();
        debug_assert_eq!(freed, self.populated);
        self.populated = 0;
        freed
    }

    /// Frees every entry in every chain, then the bucket array and the table
    /// itself. Returns the number of entries freed.
    ///
    /// Dropping the table releases the same resources; this only makes the
    /// teardown explicit.
    pub fn destroy(mut self) -> usize {
        let freed = self.clear();
        log::debug!(
            "destroyed table with {} buckets, freed {freed} entries",
            self.buckets.len()
        );
        freed
    }
}

impl<'a, P, B: Bucket> IntoIterator for &'a ChainedTable<P, B> {
    type Item = (i32, i32);
    type IntoIter = Iter<'a, B>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// An iterator over the values stored under one key.
///
/// Created by [`ChainedTable::values`].
#[derive(Clone)]
pub struct Values<'a> {
    entries: Entries<'a>,
    key: i32,
}

impl Iterator for Values<'_> {
    type Item = i32;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        let key = self.key;
        self.entries
            .by_ref()
            .find_map(|(k, v)| (k == key).then_some(v))
    }
}

impl core::iter::FusedIterator for Values<'_> {}

/// An iterator over every entry of a table.
///
/// Created by [`ChainedTable::iter`].
pub struct Iter<'a, B> {
    buckets: core::slice::Iter<'a, B>,
    current: Option<Entries<'a>>,
    remaining: usize,
}

impl<'a, B: Bucket> Iterator for Iter<'a, B> {
    type Item = (i32, i32);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(entry) = self.current.as_mut().and_then(Iterator::next) {
                self.remaining -= 1;
                return Some(entry);
            }
            if self.remaining == 0 {
                return None;
            }
            self.current = Some(self.buckets.next()?.entries());
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<B: Bucket> ExactSizeIterator for Iter<'_, B> {}

#[cfg(test)]
mod tests {
    use alloc::vec;
    use alloc::vec::Vec;

    use rand::Rng;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    use super::*;
    use crate::bucket::InlineBucket;
    use crate::bucket::LinkedBucket;
    use crate::hash_policy::ConstantHash;

    fn table_of<P: HashPolicy, B: Bucket>(size: usize, policy: P) -> ChainedTable<P, B> {
        ChainedTable::with_config(size, policy, Config::new().amplification(5)).unwrap()
    }

    fn get_all<P: HashPolicy, B: Bucket>(table: &ChainedTable<P, B>, key: i32) -> Vec<i32> {
        let mut out = vec![0; table.count(key)];
        let matches = table.get(key, &mut out);
        assert_eq!(matches, out.len());
        out
    }

    #[test]
    fn capacity_is_amplified() {
        let table: ChainedTable = table_of(10, ModuloHash);
        assert_eq!(table.capacity(), 50);
        assert_eq!(table.amplification(), 5);
        assert!(table.is_empty());

        let table: ChainedTable = ChainedTable::with_size(10).unwrap();
        assert_eq!(table.capacity(), 100);
    }

    #[test]
    fn invalid_sizes() {
        let table: Result<ChainedTable, _> = ChainedTable::with_size(0);
        assert_eq!(table.unwrap_err(), Error::InvalidSize);

        let table: Result<ChainedTable, _> =
            ChainedTable::with_config(10, ModuloHash, Config::new().amplification(0));
        assert_eq!(table.unwrap_err(), Error::InvalidSize);
    }

    #[test]
    fn unsatisfiable_bucket_array() {
        let table: Result<ChainedTable, _> = ChainedTable::with_size(usize::MAX);
        assert_eq!(table.unwrap_err(), Error::AllocationFailure);

        // Fits in usize, but not in the address space.
        let table: Result<ChainedTable, _> =
            ChainedTable::with_config(usize::MAX / 2, ModuloHash, Config::new().amplification(1));
        assert_eq!(table.unwrap_err(), Error::AllocationFailure);
    }

    fn check_discover_then_retry<P: HashPolicy, B: Bucket>(policy: P) {
        let mut table: ChainedTable<P, B> = table_of(10, policy);
        table.put(0, -1).unwrap();
        table.put(0, 1).unwrap();
        table.put(0, 2).unwrap();

        let mut small = [0; 1];
        assert_eq!(table.get(0, &mut small), 3);
        assert_eq!(small, [2]);

        let mut full = [0; 3];
        assert_eq!(table.get(0, &mut full), 3);
        assert_eq!(full, [2, 1, -1]);

        let mut empty: [i32; 0] = [];
        assert_eq!(table.get(0, &mut empty), 3);

        let mut roomy = [99; 5];
        assert_eq!(table.get(0, &mut roomy), 3);
        assert_eq!(roomy, [2, 1, -1, 99, 99]);
    }

    #[test]
    fn discover_then_retry() {
        check_discover_then_retry::<_, LinkedBucket>(ModuloHash);
        check_discover_then_retry::<_, InlineBucket>(ModuloHash);
        check_discover_then_retry::<_, LinkedBucket>(ConstantHash);
        check_discover_then_retry::<_, InlineBucket>(ConstantHash);
    }

    fn check_colliding_keys<B: Bucket>() {
        let mut table: ChainedTable<_, B> = table_of(4, ConstantHash);
        for k in 0..20 {
            table.put(k, k * 10).unwrap();
            table.put(k, k * 10 + 1).unwrap();
        }
        assert_eq!(table.len(), 40);
        assert_eq!(table.buckets()[0].len(), 40);

        for k in 0..20 {
            assert_eq!(get_all(&table, k), vec![k * 10 + 1, k * 10], "{table:?}");
        }

        for k in (0..20).step_by(3) {
            assert_eq!(table.erase(k), 2);
        }
        for k in 0..20 {
            let expected = if k % 3 == 0 {
                vec![]
            } else {
                vec![k * 10 + 1, k * 10]
            };
            assert_eq!(get_all(&table, k), expected);
        }
        assert_eq!(table.len(), 40 - 14);
    }

    #[test]
    fn colliding_keys() {
        check_colliding_keys::<LinkedBucket>();
        check_colliding_keys::<InlineBucket>();
    }

    #[test]
    fn erase_absent_key_is_noop() {
        let mut table: ChainedTable = table_of(4, ModuloHash);
        table.put(1, 1).unwrap();
        table.put(21, 2).unwrap();

        let before: Vec<_> = table.iter().collect();
        assert_eq!(table.erase(41), 0);
        assert_eq!(table.erase(-3), 0);
        assert_eq!(table.iter().collect::<Vec<_>>(), before);
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn erase_then_get_finds_nothing() {
        let mut table: ChainedTable = table_of(2, ModuloHash);
        for v in 0..6 {
            table.put(3, v).unwrap();
            table.put(13, v).unwrap();
        }
        assert_eq!(table.erase(3), 6);
        assert_eq!(table.get(3, &mut [0; 4]), 0);
        assert!(!table.contains_key(3));
        assert_eq!(table.count(13), 6);
    }

    #[test]
    fn negative_keys() {
        let mut table: ChainedTable = table_of(3, ModuloHash);
        table.put(-1, 5).unwrap();
        table.put(i32::MIN, 6).unwrap();
        table.put(i32::MAX, 7).unwrap();
        assert_eq!(get_all(&table, -1), vec![5]);
        assert_eq!(get_all(&table, i32::MIN), vec![6]);
        assert_eq!(get_all(&table, i32::MAX), vec![7]);
    }

    #[test]
    fn iter_visits_every_entry() {
        let mut table: ChainedTable = table_of(8, ModuloHash);
        for k in 0..30 {
            table.put(k, -k).unwrap();
        }
        let iter = table.iter();
        assert_eq!(iter.len(), 30);
        let mut seen: Vec<_> = iter.collect();
        seen.sort_unstable();
        let mut expected: Vec<_> = (0..30).map(|k| (k, -k)).collect();
        expected.sort_unstable();
        assert_eq!(seen, expected);
    }

    #[test]
    fn clear_and_destroy() {
        let mut table: ChainedTable<_, InlineBucket> = table_of(2, ConstantHash);
        for k in 0..10 {
            table.put(k % 3, k).unwrap();
        }
        assert_eq!(table.clear(), 10);
        assert!(table.is_empty());
        assert_eq!(table.capacity(), 10);

        table.put(1, 1).unwrap();
        table.put(2, 2).unwrap();
        assert_eq!(table.destroy(), 2);
    }

    #[test]
    fn load_factor_tracks_population() {
        let mut table: ChainedTable = table_of(2, ModuloHash);
        assert_eq!(table.load_factor(), 0.0);
        for k in 0..5 {
            table.put(k, k).unwrap();
        }
        assert_eq!(table.load_factor(), 0.5);
    }

    /// Runs the same random workload against two bucket representations and
    /// a hashbrown model, comparing every lookup.
    fn differential<P: HashPolicy + Clone>(policy: P, seed: u64) {
        let mut rng = SmallRng::seed_from_u64(seed);
        let mut linked: ChainedTable<P, LinkedBucket> = table_of(8, policy.clone());
        let mut inline: ChainedTable<P, InlineBucket> = table_of(8, policy);
        let mut model: hashbrown::HashMap<i32, Vec<i32>> = hashbrown::HashMap::new();

        for _ in 0..4000 {
            let key = rng.random_range(-24..24);
            match rng.random_range(0..10) {
                0..=5 => {
                    let value = rng.random::<i32>();
                    linked.put(key, value).unwrap();
                    inline.put(key, value).unwrap();
                    model.entry(key).or_default().push(value);
                }
                6 | 7 => {
                    let expected = model.remove(&key).map_or(0, |v| v.len());
                    assert_eq!(linked.erase(key), expected);
                    assert_eq!(inline.erase(key), expected);
                }
                _ => {
                    let expected: Vec<i32> = model
                        .get(&key)
                        .map(|v| v.iter().rev().copied().collect())
                        .unwrap_or_default();
                    let cap = rng.random_range(0..6);
                    let mut a = vec![0; cap];
                    let mut b = vec![0; cap];
                    assert_eq!(linked.get(key, &mut a), expected.len());
                    assert_eq!(inline.get(key, &mut b), expected.len());
                    let written = cap.min(expected.len());
                    assert_eq!(a[..written], expected[..written]);
                    assert_eq!(a, b);
                }
            }
            assert_eq!(linked.len(), inline.len());
        }

        let total: usize = model.values().map(Vec::len).sum();
        assert_eq!(linked.len(), total);
        for (key, values) in &model {
            let expected: Vec<i32> = values.iter().rev().copied().collect();
            assert_eq!(get_all(&linked, *key), expected);
            assert_eq!(get_all(&inline, *key), expected);
        }
        assert!(linked.iter().eq(inline.iter()));
    }

    #[test]
    fn differential_modulo() {
        differential(ModuloHash, 1);
        differential(ModuloHash, 2);
    }

    #[test]
    fn differential_constant() {
        differential(ConstantHash, 3);
        differential(ConstantHash, 4);
    }

    #[test]
    fn differential_closure() {
        differential(|key: i32, capacity: usize| (key.unsigned_abs() as usize / 4) % capacity, 5);
    }

    #[cfg(feature = "foldhash")]
    #[test]
    fn differential_foldhash() {
        differential(crate::hash_policy::FoldHash::with_seed(0xfeed), 6);
    }
}
