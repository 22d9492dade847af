//! Binary merge of sorted runs and the sequential sort built on it.
//!
//! The same two-pointer merge is the base operation of the local sort and of
//! the cross-worker tree reduction.

/// Merge two ascending runs into a single ascending run.
///
/// The output is built into fresh storage in `O(first.len() + second.len())`
/// steps. On equal elements the one from `first` wins, so runs merge stably
/// when `first` holds the elements that came earlier in the original
/// sequence. Either input may be empty.
pub fn merge<T: Ord + Copy>(first: &[T], second: &[T]) -> Vec<T> {
    let mut result = Vec::with_capacity(first.len() + second.len());

    let mut i = 0;
    let mut j = 0;
    while i < first.len() && j < second.len() {
        if first[i] <= second[j] {
            result.push(first[i]);
            i += 1;
        } else {
            result.push(second[j]);
            j += 1;
        }
    }

    // At most one of the two tails is non-empty.
    result.extend_from_slice(&first[i..]);
    result.extend_from_slice(&second[j..]);

    result
}

/// Sort a chunk by recursive merge sort, returning the sorted run.
///
/// Chunks of fewer than two elements are already sorted. Everything else is
/// split at the midpoint and the sorted halves are merged. Pure computation,
/// no communication.
pub fn local_sort<T: Ord + Copy>(chunk: &[T]) -> Vec<T> {
    if chunk.len() < 2 {
        return chunk.to_vec();
    }

    let middle = chunk.len() / 2;
    merge(&local_sort(&chunk[..middle]), &local_sort(&chunk[middle..]))
}
