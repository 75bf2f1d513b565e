#![warn(missing_docs)]
#![doc = include_str!("../README.md")]
#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

/// Chain storage for a single bucket.
///
/// Provides the [`Bucket`] trait and its two representations: a uniform
/// linked chain and a chain whose most recent entry is stored inline.
pub mod bucket;

/// Per-table creation settings.
pub mod config;

mod error;

/// A nullable slot owning at most one table, reporting misuse as errors.
pub mod handle;

/// Key-to-bucket mapping strategies.
///
/// Tables take their policy by value at creation, so a degenerate policy
/// can be swapped in to test worst-case chaining without touching the
/// table itself.
pub mod hash_policy;

#[cfg(feature = "stats")]
mod stats;

pub mod table;

pub use bucket::Bucket;
pub use bucket::DefaultBucket;
pub use bucket::InlineBucket;
pub use bucket::LinkedBucket;
pub use config::Config;
pub use error::Error;
#[cfg(feature = "foldhash")]
pub use hash_policy::FoldHash;
pub use hash_policy::BuildHasherPolicy;
pub use hash_policy::ConstantHash;
pub use hash_policy::HashPolicy;
pub use hash_policy::ModuloHash;
pub use handle::TableHandle;
#[cfg(feature = "stats")]
pub use stats::ChainHistogram;
#[cfg(feature = "stats")]
pub use stats::ChainStats;
pub use table::ChainedTable;
