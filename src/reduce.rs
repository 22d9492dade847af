//! Tree reduction of sorted runs toward rank 0.
//!
//! Reduction proceeds in rounds with a doubling stride. With seven workers:
//!
//! ```text
//! stride 1 |  0 1   2 3   4 5   6
//!          |  |/    |/    |/    |
//! stride 2 |  01    23    45    6
//!          |  |    /      |    /
//! stride 4 |  0123        456
//!          |  |          /
//!          |  0123456
//! ```
//!
//! In every round the left worker of a pair receives its partner's run and
//! merges it into its own; the partner hands its run over and retires. A
//! barrier separates consecutive rounds, so no worker starts the next round
//! while a pair is still exchanging.

use crate::comm::{Communicator, Rank, Sortable};
use crate::merge::merge;
use crate::sort::SortError;

/// What a worker does in one reduction round.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// Receive the paired worker's run and merge it into the local one.
    Receive(Rank),
    /// Hand the local run to the paired worker and retire.
    Send(Rank),
    /// Sit the round out.
    Idle,
}

/// Derive the role of `rank` in the round with the given `stride`.
///
/// Receivers sit at multiples of `2 * stride` and pair with the rank one
/// stride above, provided that rank exists; those upper ranks are the
/// senders. The schedule is plain arithmetic on the round index, so every
/// worker derives the same pairing without coordination, and a worker that
/// has sent its run is never paired again in a later round.
pub fn round_role(rank: Rank, size: Rank, stride: Rank) -> Role {
    debug_assert!(0 <= rank && rank < size);
    debug_assert!(stride >= 1);

    if rank % (2 * stride) == 0 {
        if rank + stride < size {
            Role::Receive(rank + stride)
        } else {
            Role::Idle
        }
    } else if rank % (2 * stride) == stride {
        Role::Send(rank - stride)
    } else {
        Role::Idle
    }
}

/// Reduce the pool's sorted runs to the fully sorted sequence on rank 0.
///
/// Executes collectively after the local sort, consuming the local run.
/// Returns the complete sequence on rank 0 and `None` on every other rank,
/// whose run has been moved away.
pub fn gather_merge<T, C>(comm: &C, mut run: Vec<T>) -> Result<Option<Vec<T>>, SortError>
where
    T: Sortable,
    C: Communicator<T>,
{
    let rank = comm.rank();
    let size = comm.size();

    let mut stride: Rank = 1;

    while stride < size {
        match round_role(rank, size, stride) {
            Role::Receive(sender) => {
                let incoming = comm.receive(sender)?;
                log::debug!(
                    "rank {} merges {} incoming with {} local elements at stride {}",
                    rank,
                    incoming.len(),
                    run.len(),
                    stride
                );
                run = merge(&run, &incoming);
            }
            Role::Send(receiver) => {
                comm.send(std::mem::take(&mut run), receiver)?;
            }
            Role::Idle => {}
        }

        // Everybody joins the barrier, retired and idle workers included,
        // before the stride doubles.
        comm.barrier();
        stride *= 2;
    }

    Ok((rank == 0).then_some(run))
}

#[cfg(test)]
mod test {
    use super::{gather_merge, round_role, Role};
    use crate::comm::{run_workers, Communicator, Rank, ThreadComm};

    fn receiving_pairs(size: Rank, stride: Rank) -> Vec<(Rank, Rank)> {
        (0..size)
            .filter_map(|rank| match round_role(rank, size, stride) {
                Role::Receive(sender) => Some((rank, sender)),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_round_role_pairs_of_seven_workers() {
        assert_eq!(receiving_pairs(7, 1), vec![(0, 1), (2, 3), (4, 5)]);
        assert_eq!(receiving_pairs(7, 2), vec![(0, 2), (4, 6)]);
        assert_eq!(receiving_pairs(7, 4), vec![(0, 4)]);
    }

    #[test]
    fn test_round_role_pairs_are_mutual() {
        for size in 1..17 {
            let mut stride = 1;
            while stride < size {
                for rank in 0..size {
                    if let Role::Receive(sender) = round_role(rank, size, stride) {
                        assert_eq!(round_role(sender, size, stride), Role::Send(rank));
                    }
                }
                stride *= 2;
            }
        }
    }

    #[test]
    fn test_every_worker_hands_its_run_to_rank_zero_once() {
        for size in 1..33 {
            for rank in 0..size {
                let mut sends = 0;
                let mut stride = 1;
                while stride < size {
                    match round_role(rank, size, stride) {
                        Role::Send(_) => sends += 1,
                        Role::Receive(_) => {
                            // Retired workers are never paired again.
                            assert_eq!(sends, 0, "rank {} of {}", rank, size);
                        }
                        Role::Idle => {}
                    }
                    stride *= 2;
                }
                if rank == 0 {
                    assert_eq!(sends, 0);
                } else {
                    assert_eq!(sends, 1, "rank {} of {}", rank, size);
                }
            }
        }
    }

    #[test]
    fn test_gather_merge_reduces_runs_to_rank_zero() {
        let runs = vec![vec![3, 5], vec![1, 8], vec![2, 9], vec![4, 7]];
        let results = run_workers(4, move |comm: ThreadComm<i32>| {
            let run = runs[comm.rank() as usize].clone();
            gather_merge(&comm, run).unwrap()
        })
        .unwrap();

        assert_eq!(results[0], Some(vec![1, 2, 3, 4, 5, 7, 8, 9]));
        assert!(results[1..].iter().all(|result| result.is_none()));
    }

    #[test]
    fn test_gather_merge_with_an_odd_pool() {
        // The lone top worker keeps its run until stride 2 reaches it.
        let runs = vec![vec![2, 9], vec![4, 7], vec![1, 3]];
        let results = run_workers(3, move |comm: ThreadComm<i32>| {
            let run = runs[comm.rank() as usize].clone();
            gather_merge(&comm, run).unwrap()
        })
        .unwrap();

        assert_eq!(results[0], Some(vec![1, 2, 3, 4, 7, 9]));
    }

    #[test]
    fn test_gather_merge_of_empty_runs() {
        let results = run_workers(3, |comm: ThreadComm<i32>| {
            gather_merge(&comm, Vec::new()).unwrap()
        })
        .unwrap();

        assert_eq!(results[0], Some(Vec::new()));
    }

    #[test]
    fn test_gather_merge_on_a_single_worker_has_no_rounds() {
        let results = run_workers(1, |comm: ThreadComm<i32>| {
            gather_merge(&comm, vec![1, 2, 3]).unwrap()
        })
        .unwrap();

        assert_eq!(results[0], Some(vec![1, 2, 3]));
    }
}
