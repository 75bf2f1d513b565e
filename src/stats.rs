use alloc::vec;
use alloc::vec::Vec;

use crate::bucket::Bucket;
use crate::table::ChainedTable;

/// Chain-length statistics for a table.
#[derive(Debug, Clone, PartialEq)]
pub struct ChainStats {
    /// Number of entries currently in the table
    pub entries: usize,
    /// Number of buckets
    pub capacity: usize,
    /// Number of buckets holding at least one entry
    pub occupied_buckets: usize,
    /// Length of the longest chain
    pub longest_chain: usize,
    /// Load factor (entries / capacity)
    pub load_factor: f64,
    /// Mean chain length over occupied buckets
    pub mean_occupied_chain: f64,
}

impl ChainStats {
    /// Pretty-print the statistics.
    #[cfg(feature = "std")]
    pub fn print(&self) {
        println!("=== Chained Table Statistics ===");
        println!(
            "Population: {} entries in {} buckets ({:.2}% load factor)",
            self.entries,
            self.capacity,
            self.load_factor * 100.0
        );
        println!(
            "Occupied: {}/{} buckets ({:.2}%)",
            self.occupied_buckets,
            self.capacity,
            self.occupied_buckets as f64 / self.capacity as f64 * 100.0
        );
        println!(
            "Chains: longest {}, mean {:.2} over occupied buckets",
            self.longest_chain, self.mean_occupied_chain
        );
    }
}

/// Number of buckets per chain length. Index `n` counts the buckets whose
/// chain holds exactly `n` entries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainHistogram {
    counts: Vec<usize>,
}

impl ChainHistogram {
    /// Returns the per-length bucket counts.
    pub fn counts(&self) -> &[usize] {
        &self.counts
    }

    /// Pretty-prints the histogram as a horizontal bar chart on stdout.
    #[cfg(feature = "std")]
    pub fn print(&self) {
        let max = self.counts.iter().copied().max().unwrap_or(0);
        if max == 0 {
            println!("chain histogram: empty");
            return;
        }

        let max_bar = 60usize;
        let total_units = max_bar * 8;
        println!("chain histogram ({} buckets):", self.counts.iter().sum::<usize>());

        let make_bar = |count: usize| -> alloc::string::String {
            if count == 0 {
                return alloc::string::String::new();
            }
            let units = ((count as u128 * total_units as u128).div_ceil(max as u128)) as usize;
            let mut bar = "█".repeat(units / 8);
            let partial = ['▏', '▎', '▍', '▌', '▋', '▊', '▉'];
            if let Some(&ch) = (units % 8).checked_sub(1).and_then(|i| partial.get(i)) {
                bar.push(ch);
            }
            bar
        };

        for (length, &count) in self.counts.iter().enumerate() {
            println!("{:>3} | {} ({})", length, make_bar(count), count);
        }
    }
}

impl<P, B: Bucket> ChainedTable<P, B> {
    /// Returns chain-length statistics. Walks every bucket.
    pub fn stats(&self) -> ChainStats {
        let mut occupied_buckets = 0;
        let mut longest_chain = 0;
        for bucket in self.buckets() {
            let length = bucket.len();
            if length > 0 {
                occupied_buckets += 1;
            }
            longest_chain = longest_chain.max(length);
        }

        ChainStats {
            entries: self.len(),
            capacity: self.capacity(),
            occupied_buckets,
            longest_chain,
            load_factor: self.load_factor(),
            mean_occupied_chain: if occupied_buckets == 0 {
                0.0
            } else {
                self.len() as f64 / occupied_buckets as f64
            },
        }
    }

    /// Computes the distribution of chain lengths. Walks every bucket.
    pub fn chain_length_histogram(&self) -> ChainHistogram {
        let mut counts = vec![0usize; 1];
        for bucket in self.buckets() {
            let length = bucket.len();
            if length >= counts.len() {
                counts.resize(length + 1, 0);
            }
            counts[length] += 1;
        }
        ChainHistogram { counts }
    }
}
