use alloc::vec;
use alloc::vec::Vec;
use core::fmt::Debug;

use crate::bucket::Bucket;
use crate::bucket::DefaultBucket;
use crate::config::Config;
use crate::error::Error;
use crate::hash_policy::HashPolicy;
use crate::hash_policy::ModuloHash;
use crate::table::ChainedTable;

/// A slot that is either empty or owns one [`ChainedTable`].
///
/// This is the lifecycle surface for callers that keep a table in a
/// long-lived location and need the empty/populated distinction reported
/// as errors: allocating into a populated handle fails with
/// [`Error::AlreadyInitialized`], and every other operation on an empty
/// handle fails with [`Error::NullTable`]. Deallocating twice therefore
/// reports `NullTable` on the second call.
///
/// ```rust
/// # use chained_multimap::Error;
/// # use chained_multimap::TableHandle;
/// #
/// let mut handle: TableHandle = TableHandle::new();
/// assert_eq!(handle.put(1, 1), Err(Error::NullTable));
///
/// handle.allocate(10).unwrap();
/// assert_eq!(handle.allocate(10), Err(Error::AlreadyInitialized));
///
/// handle.put(1, 10).unwrap();
/// handle.put(1, 11).unwrap();
/// assert_eq!(handle.get_all(1).unwrap(), [11, 10]);
///
/// handle.erase(1).unwrap();
/// assert_eq!(handle.get(1, &mut []).unwrap(), 0);
///
/// handle.deallocate().unwrap();
/// assert_eq!(handle.deallocate(), Err(Error::NullTable));
/// ```
pub struct TableHandle<P = ModuloHash, B = DefaultBucket> {
    table: Option<ChainedTable<P, B>>,
}

impl<P, B: Bucket> Debug for TableHandle<P, B> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match &self.table {
            Some(table) => f.debug_tuple("TableHandle").field(table).finish(),
            None => f.write_str("TableHandle(null)"),
        }
    }
}

impl<P, B> Default for TableHandle<P, B> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P, B> TableHandle<P, B> {
    /// Creates an empty handle.
    pub const fn new() -> Self {
        Self { table: None }
    }

    /// Returns `true` if the handle currently owns a table.
    pub fn is_allocated(&self) -> bool {
        self.table.is_some()
    }

    /// Returns the owned table, if any.
    pub fn table(&self) -> Option<&ChainedTable<P, B>> {
        self.table.as_ref()
    }

    /// Returns the owned table mutably, if any.
    pub fn table_mut(&mut self) -> Option<&mut ChainedTable<P, B>> {
        self.table.as_mut()
    }

    fn populated(&self) -> Result<&ChainedTable<P, B>, Error> {
        self.table.as_ref().ok_or(Error::NullTable)
    }

    fn populated_mut(&mut self) -> Result<&mut ChainedTable<P, B>, Error> {
        self.table.as_mut().ok_or(Error::NullTable)
    }
}

impl<B: Bucket> TableHandle<ModuloHash, B> {
    /// Allocates a table for `requested_size` entries with [`ModuloHash`]
    /// and the default [`Config`].
    ///
    /// # Errors
    ///
    /// See [`TableHandle::allocate_with`].
    pub fn allocate(&mut self, requested_size: usize) -> Result<(), Error> {
        self.allocate_with(requested_size, ModuloHash, Config::new())
    }
}

impl<P: HashPolicy, B: Bucket> TableHandle<P, B> {
    /// Allocates a table into this handle.
    ///
    /// # Errors
    ///
    /// - [`Error::AlreadyInitialized`] if the handle already owns a table;
    ///   the existing table is left untouched.
    /// - Any error from [`ChainedTable::with_config`]; the handle stays
    ///   empty.
    pub fn allocate_with(
        &mut self,
        requested_size: usize,
        policy: P,
        config: Config,
    ) -> Result<(), Error> {
        if self.table.is_some() {
            log::warn!("refusing to allocate into an initialized table handle");
            return Err(Error::AlreadyInitialized);
        }

        self.table = Some(ChainedTable::with_config(requested_size, policy, config)?);
        Ok(())
    }

    /// Inserts `(key, value)`. See [`ChainedTable::put`].
    ///
    /// # Errors
    ///
    /// [`Error::NullTable`] on an empty handle, or
    /// [`Error::AllocationFailure`].
    pub fn put(&mut self, key: i32, value: i32) -> Result<(), Error> {
        self.populated_mut()?.put(key, value)
    }

    /// Copies matching values into `out` and returns the total match count.
    /// See [`ChainedTable::get`].
    ///
    /// # Errors
    ///
    /// [`Error::NullTable`] on an empty handle.
    pub fn get(&self, key: i32, out: &mut [i32]) -> Result<usize, Error> {
        Ok(self.populated()?.get(key, out))
    }

    /// Returns every value stored under `key`, most recent first.
    ///
    /// # Errors
    ///
    /// [`Error::NullTable`] on an empty handle.
    pub fn get_all(&self, key: i32) -> Result<Vec<i32>, Error> {
        let table = self.populated()?;
        let mut values = vec![0; 1];
        let matches = table.get(key, &mut values);
        if matches > values.len() {
            values.resize(matches, 0);
            table.get(key, &mut values);
        }
        values.truncate(matches);
        Ok(values)
    }

    /// Removes every entry stored under `key`. Erasing an absent key
    /// succeeds.
    ///
    /// # Errors
    ///
    /// [`Error::NullTable`] on an empty handle.
    pub fn erase(&mut self, key: i32) -> Result<(), Error> {
        self.populated_mut()?.erase(key);
        Ok(())
    }

    /// Frees every entry and the table, leaving the handle empty.
    ///
    /// # Errors
    ///
    /// [`Error::NullTable`] if the handle is already empty.
    pub fn deallocate(&mut self) -> Result<(), Error> {
        self.table.take().ok_or(Error::NullTable)?.destroy();
        Ok(())
    }
}
