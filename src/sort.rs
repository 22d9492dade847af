//! The distributed merge sort.

use std::error::Error;
use std::fmt;

use crate::comm::{Communicator, Rank, Sortable};
use crate::merge::local_sort;
use crate::reduce::gather_merge;
use crate::scatter::scatter;

/// Failure of a distributed sort run.
///
/// None of these are recoverable mid-run; whichever worker hits one gives
/// up, and its peers fail in turn when their transfers lose the other end.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortError {
    /// The worker pool size is not positive.
    InvalidTopology {
        /// The rejected pool size.
        size: Rank,
    },
    /// The initial sequence was missing on rank 0 or supplied elsewhere.
    InvalidInput(&'static str),
    /// A sequence is too long for the wire's 4-byte element counter.
    LengthOverflow(usize),
    /// The peer of a transfer went away before the transfer completed.
    Disconnected {
        /// Rank the transfer was coming from.
        source: Rank,
        /// Rank the transfer was going to.
        dest: Rank,
    },
    /// A transfer delivered its messages out of protocol order.
    Protocol {
        /// Tag the protocol called for.
        expected: i32,
        /// Tag actually received.
        actual: i32,
    },
}

impl fmt::Display for SortError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortError::InvalidTopology { size } => {
                write!(f, "worker pool size must be positive, got {size}")
            }
            SortError::InvalidInput(what) => write!(f, "invalid input: {what}"),
            SortError::LengthOverflow(len) => {
                write!(f, "sequence of {len} elements does not fit the wire counter")
            }
            SortError::Disconnected { source, dest } => {
                write!(f, "transfer from rank {source} to rank {dest} lost its peer")
            }
            SortError::Protocol { expected, actual } => {
                write!(f, "expected message tag {expected}, received tag {actual}")
            }
        }
    }
}

impl Error for SortError {}

/// Sort a sequence cooperatively across the whole worker pool.
///
/// Call collectively on every rank. Rank 0 passes the full sequence, every
/// other rank passes `None`. Three phases run back to back: the sequence is
/// scattered into contiguous chunks, each worker merge sorts its chunk
/// locally, and the sorted runs are merged pairwise up a binary tree until
/// rank 0 owns the result. Rank 0 gets `Some(sorted)`, everyone else `None`.
///
/// The outcome is the same stable ascending order for every pool size,
/// including a pool of one, where both communication phases degenerate to
/// nothing.
pub fn merge_sort<T, C>(comm: &C, data: Option<Vec<T>>) -> Result<Option<Vec<T>>, SortError>
where
    T: Sortable,
    C: Communicator<T>,
{
    let rank = comm.rank();
    let size = comm.size();

    if size <= 0 {
        return Err(SortError::InvalidTopology { size });
    }

    let chunk = scatter(comm, data)?;
    log::debug!("rank {} holds a chunk of {} elements", rank, chunk.len());

    let run = local_sort(&chunk);
    log::debug!("rank {} finished its local sort", rank);

    gather_merge(comm, run)
}

#[cfg(test)]
mod test {
    use itertools::Itertools;
    use rstest::rstest;

    use super::{merge_sort, SortError};
    use crate::comm::{run_workers, Communicator, Rank, ThreadComm};
    use crate::tools::{generate_random_sequence, seeded_rng};

    /// Run the full three-phase sort on a pool of worker threads and return
    /// every rank's outcome.
    fn sort_on_pool(size: Rank, data: Vec<i64>) -> Vec<Option<Vec<i64>>> {
        run_workers(size, move |comm: ThreadComm<i64>| {
            let input = (comm.rank() == 0).then(|| data.clone());
            merge_sort(&comm, input).unwrap()
        })
        .unwrap()
    }

    #[test]
    fn test_four_workers_sort_eight_elements() {
        let results = sort_on_pool(4, vec![5, 3, 8, 1, 9, 2, 7, 4]);

        assert_eq!(results[0], Some(vec![1, 2, 3, 4, 5, 7, 8, 9]));
        assert!(results[1..].iter().all(|result| result.is_none()));
    }

    #[rstest]
    #[case(1)]
    #[case(2)]
    #[case(3)]
    #[case(4)]
    #[case(5)]
    #[case(6)]
    #[case(7)]
    #[case(8)]
    #[case(9)]
    fn test_matches_a_single_stable_sort(#[case] size: Rank) {
        // Keys repeat heavily so ties occur in every round.
        let mut rng = seeded_rng(size as usize);
        let data = generate_random_sequence(101, 0..50, &mut rng);

        let results = sort_on_pool(size, data.clone());

        let mut expected = data;
        expected.sort();
        assert_eq!(results[0], Some(expected));
        assert!(results[1..].iter().all(|result| result.is_none()));
    }

    #[rstest]
    #[case(1)]
    #[case(4)]
    #[case(7)]
    fn test_empty_sequence(#[case] size: Rank) {
        let results = sort_on_pool(size, Vec::new());
        assert_eq!(results[0], Some(Vec::new()));
    }

    #[test]
    fn test_fewer_elements_than_workers() {
        let results = sort_on_pool(8, vec![3, 1, 2]);
        assert_eq!(results[0], Some(vec![1, 2, 3]));
    }

    #[test]
    fn test_normal_distributed_keys() {
        use rand_distr::{Distribution, Normal};

        let mut rng = seeded_rng(99);
        let normal = Normal::new(0.0f64, 40.0).unwrap();
        let data = (0..500)
            .map(|_| normal.sample(&mut rng).round() as i64)
            .collect_vec();

        let results = sort_on_pool(6, data.clone());

        let mut expected = data;
        expected.sort();
        assert_eq!(results[0], Some(expected));
    }

    /// Key with a provenance marker that takes no part in the order.
    #[derive(Debug, Clone, Copy, Default)]
    struct Item {
        key: i64,
        origin: usize,
    }

    impl PartialEq for Item {
        fn eq(&self, other: &Self) -> bool {
            self.key == other.key
        }
    }

    impl Eq for Item {}

    impl PartialOrd for Item {
        fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
            Some(self.cmp(other))
        }
    }

    impl Ord for Item {
        fn cmp(&self, other: &Self) -> std::cmp::Ordering {
            self.key.cmp(&other.key)
        }
    }

    #[test]
    fn test_equal_elements_keep_their_original_order() {
        // Provenance of equal keys must come out exactly as a single stable
        // sort leaves it, no matter how the chunks were cut.
        let mut rng = seeded_rng(7);
        let keys: Vec<i64> = generate_random_sequence(96, 0..8, &mut rng);
        let data = keys
            .iter()
            .enumerate()
            .map(|(origin, &key)| Item { key, origin })
            .collect_vec();

        let mut expected = data.clone();
        expected.sort();

        let results = run_workers(5, move |comm: ThreadComm<Item>| {
            let input = (comm.rank() == 0).then(|| data.clone());
            merge_sort(&comm, input).unwrap()
        })
        .unwrap();

        let sorted = results[0].clone().unwrap();
        let sorted_origins = sorted.iter().map(|item| item.origin).collect_vec();
        let expected_origins = expected.iter().map(|item| item.origin).collect_vec();
        assert_eq!(sorted_origins, expected_origins);
    }

    #[test]
    fn test_missing_input_on_rank_zero_fails_fast() {
        let results = run_workers(2, |comm: ThreadComm<i64>| merge_sort(&comm, None)).unwrap();

        assert!(matches!(results[0], Err(SortError::InvalidInput(_))));
        assert!(results[1].is_err());
    }

    #[test]
    fn test_input_on_a_non_root_rank_is_rejected() {
        let results = run_workers(2, |comm: ThreadComm<i64>| {
            merge_sort(&comm, Some(vec![comm.rank() as i64]))
        })
        .unwrap();

        assert!(matches!(results[1], Err(SortError::InvalidInput(_))));
        assert!(results[0].is_err());
    }
}
