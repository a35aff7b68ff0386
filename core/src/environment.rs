//! Injected dependencies for actors.
//!
//! Actors never call a random number generator directly. They draw batch
//! sizes through [`BatchSource`], so production code can use a real RNG while
//! tests script exact sequences.

use crate::config::BatchRange;

/// Source of batch sizes for vendors and customers.
///
/// # Examples
///
/// ```
/// use ticket_pool_core::config::BatchRange;
/// use ticket_pool_core::environment::BatchSource;
///
/// struct AlwaysMin;
/// impl BatchSource for AlwaysMin {
///     fn next_batch(&self, range: BatchRange) -> u32 {
///         range.min
///     }
/// }
///
/// assert_eq!(AlwaysMin.next_batch(BatchRange::VENDOR_DEFAULT), 1);
/// ```
pub trait BatchSource: Send + Sync {
    /// Draw a batch size. Implementations should stay within `range`;
    /// the pool rejects anything it cannot admit.
    fn next_batch(&self, range: BatchRange) -> u32;
}

impl<T: BatchSource + ?Sized> BatchSource for std::sync::Arc<T> {
    fn next_batch(&self, range: BatchRange) -> u32 {
        (**self).next_batch(range)
    }
}
