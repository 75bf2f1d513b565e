use core::hash::BuildHasher;

/// Maps a key to the index of the bucket that owns it.
///
/// Implementations must be deterministic and, for any `capacity > 0`, must
/// return a value in `0..capacity`. Tables panic on an out-of-range index.
///
/// Any `Fn(i32, usize) -> usize` closure is a policy, which keeps ad-hoc
/// distributions cheap to write in tests.
///
/// ```rust
/// # use chained_multimap::ChainedTable;
/// # use chained_multimap::Config;
/// # use chained_multimap::LinkedBucket;
/// #
/// // Send even keys to bucket 0 and odd keys to bucket 1.
/// let parity = |key: i32, _capacity: usize| (key & 1) as usize;
/// let table: ChainedTable<_, LinkedBucket> =
///     ChainedTable::with_config(1, parity, Config::new().amplification(2)).unwrap();
/// assert_eq!(table.capacity(), 2);
/// ```
pub trait HashPolicy {
    /// Returns the bucket index for `key` in a table of `capacity` buckets.
    fn bucket_index(&self, key: i32, capacity: usize) -> usize;
}

impl<F> HashPolicy for F
where
    F: Fn(i32, usize) -> usize,
{
    #[inline(always)]
    fn bucket_index(&self, key: i32, capacity: usize) -> usize {
        self(key, capacity)
    }
}

/// The default policy: the key's two's-complement bit pattern modulo the
/// capacity.
///
/// Negative keys are reinterpreted as `u32` first, so `-1` lands in bucket
/// `u32::MAX % capacity`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ModuloHash;

impl HashPolicy for ModuloHash {
    #[inline(always)]
    fn bucket_index(&self, key: i32, capacity: usize) -> usize {
        (key as u32 as usize) % capacity
    }
}

/// A degenerate policy that sends every key to bucket 0.
///
/// Useful for exercising worst-case chaining: every entry in the table ends
/// up in a single chain.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ConstantHash;

impl HashPolicy for ConstantHash {
    #[inline(always)]
    fn bucket_index(&self, _key: i32, _capacity: usize) -> usize {
        0
    }
}

/// Adapts any [`BuildHasher`] into a policy by hashing the key and reducing
/// the 64-bit digest modulo the capacity.
///
/// The builder must hash a given key to the same value for the whole life
/// of the table. Each table owns its builder instance, so a randomly seeded
/// builder such as `std`'s `RandomState` qualifies.
#[derive(Clone, Copy, Debug, Default)]
pub struct BuildHasherPolicy<S> {
    hash_builder: S,
}

impl<S> BuildHasherPolicy<S> {
    /// Wraps `hash_builder`.
    pub const fn new(hash_builder: S) -> Self {
        Self { hash_builder }
    }

    /// Returns the wrapped builder.
    pub fn hasher(&self) -> &S {
        &self.hash_builder
    }
}

impl<S: BuildHasher> HashPolicy for BuildHasherPolicy<S> {
    #[inline(always)]
    fn bucket_index(&self, key: i32, capacity: usize) -> usize {
        (self.hash_builder.hash_one(key) % capacity as u64) as usize
    }
}

/// A seeded foldhash policy. Spreads clustered or strided keys that defeat
/// [`ModuloHash`].
#[cfg(feature = "foldhash")]
pub type FoldHash = BuildHasherPolicy<foldhash::fast::FixedState>;

#[cfg(feature = "foldhash")]
impl FoldHash {
    /// Creates a foldhash policy with a fixed seed.
    pub fn with_seed(seed: u64) -> Self {
        Self::new(foldhash::fast::FixedState::with_seed(seed))
    }
}
