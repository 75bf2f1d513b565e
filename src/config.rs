/// Amplification factor used when a [`Config`] does not override it.
pub const DEFAULT_AMPLIFICATION: usize = 10;

/// Per-table creation settings.
///
/// A table sized for `n` expected entries gets `n * amplification` buckets
/// and never grows afterwards, so the amplification factor is the only
/// control over the load factor.
///
/// ```rust
/// # use chained_multimap::ChainedTable;
/// # use chained_multimap::Config;
/// # use chained_multimap::ModuloHash;
/// #
/// let table: ChainedTable = ChainedTable::with_config(10, ModuloHash, Config::new().amplification(5)).unwrap();
/// assert_eq!(table.capacity(), 50);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Config {
    amplification: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

impl Config {
    /// Returns the default configuration.
    pub const fn new() -> Self {
        Self {
            amplification: DEFAULT_AMPLIFICATION,
        }
    }

    /// Sets the amplification factor. Must be at least 1 for table creation
    /// to succeed.
    pub const fn amplification(mut self, amplification: usize) -> Self {
        self.amplification = amplification;
        self
    }

    /// Returns the configured amplification factor.
    pub const fn amplification_factor(&self) -> usize {
        self.amplification
    }

    /// Computes the bucket count for `requested_size` expected entries.
    ///
    /// Returns `None` if the product overflows `usize`.
    pub(crate) const fn capacity_for(&self, requested_size: usize) -> Option<usize> {
        requested_size.checked_mul(self.amplification)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_amplification() {
        assert_eq!(Config::default().amplification_factor(), DEFAULT_AMPLIFICATION);
        assert_eq!(Config::new().capacity_for(10), Some(100));
    }

    #[test]
    fn capacity_overflow_is_reported() {
        let config = Config::new().amplification(5);
        assert_eq!(config.capacity_for(10), Some(50));
        assert_eq!(config.capacity_for(usize::MAX / 2), None);
    }
}
