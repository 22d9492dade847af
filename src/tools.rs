//! Utility routines.

use std::ops::Range;

use itertools::Itertools;
use rand::distributions::uniform::SampleUniform;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Generate a random sequence for testing and benchmarking.
///
/// Values are drawn uniformly from `range`. In the distributed sort only
/// rank 0 prepares a sequence; every other rank starts empty handed.
pub fn generate_random_sequence<T, R>(length: usize, range: Range<T>, rng: &mut R) -> Vec<T>
where
    T: SampleUniform + PartialOrd + Copy,
    R: Rng + ?Sized,
{
    let mut result = Vec::<T>::with_capacity(length);

    for _ in 0..length {
        result.push(rng.gen_range(range.clone()));
    }

    result
}

/// Check if an array is sorted.
pub fn is_sorted_array<T: Ord>(arr: &[T]) -> bool {
    arr.iter()
        .tuple_windows()
        .all(|(elem1, elem2)| elem1 <= elem2)
}

/// Get a seeded rng
pub fn seeded_rng(seed: usize) -> ChaCha8Rng {
    ChaCha8Rng::seed_from_u64(seed as u64)
}
