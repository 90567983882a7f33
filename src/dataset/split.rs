//! Seeded train/validation index splits.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

/// Row indices of the two partitions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Split {
    pub train: Vec<usize>,
    pub validation: Vec<usize>,
}

/// Shuffles `0..n` with `seed` and holds out `ceil(n * validation_fraction)`
/// rows (capped at `n`) for validation.
///
/// Either partition may come back empty; callers decide whether that is an
/// error.
///
/// ```
/// use queuenet::dataset::shuffled_split;
///
/// let split = shuffled_split(10, 0.2, 42);
/// assert_eq!(split.validation.len(), 2);
/// assert_eq!(split.train.len(), 8);
/// assert_eq!(split, shuffled_split(10, 0.2, 42));
/// ```
pub fn shuffled_split(n: usize, validation_fraction: f64, seed: u64) -> Split {
    let n_val = validation_count(n, validation_fraction);
    let mut order: Vec<usize> = (0..n).collect();
    order.shuffle(&mut StdRng::seed_from_u64(seed));

    let train = order.split_off(n_val);
    Split {
        train,
        validation: order,
    }
}

/// `ceil(n * fraction)`, clamped to `0..=n`.
pub fn validation_count(n: usize, fraction: f64) -> usize {
    if n == 0 || fraction <= 0.0 {
        return 0;
    }
    ((n as f64 * fraction).ceil() as usize).min(n)
}
