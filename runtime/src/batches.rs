//! Production batch source.

use rand::Rng;
use ticket_pool_core::config::BatchRange;
use ticket_pool_core::environment::BatchSource;

/// Draws batch sizes uniformly from the requested range using the
/// thread-local RNG.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomBatches;

impl BatchSource for RandomBatches {
    fn next_batch(&self, range: BatchRange) -> u32 {
        if range.min >= range.max {
            return range.min;
        }
        rand::thread_rng().gen_range(range.min..=range.max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_draws_stay_in_range() {
        let range = BatchRange::new(2, 6);
        for _ in 0..500 {
            assert!(range.contains(RandomBatches.next_batch(range)));
        }
    }

    #[test]
    fn test_degenerate_range_returns_min() {
        assert_eq!(RandomBatches.next_batch(BatchRange::new(4, 4)), 4);
        assert_eq!(RandomBatches.next_batch(BatchRange::new(5, 3)), 5);
    }
}
