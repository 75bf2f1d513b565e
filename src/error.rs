/// Errors reported by table creation, mutation and teardown.
///
/// Every failure is reported to the immediate caller and leaves the table
/// exactly as it was before the failed call.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// A table was requested through a handle that already holds one.
    #[error("table handle is already initialized")]
    AlreadyInitialized,

    /// Storage for the bucket array or an entry could not be obtained.
    ///
    /// Also reported when the requested size multiplied by the
    /// amplification factor does not fit in `usize`.
    #[error("allocation failed")]
    AllocationFailure,

    /// An operation other than creation was invoked on an empty handle.
    #[error("table handle is not initialized")]
    NullTable,

    /// A table was requested with a size or amplification factor of zero.
    #[error("requested size and amplification factor must both be positive")]
    InvalidSize,
}
