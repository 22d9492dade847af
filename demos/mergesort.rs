//! Testing the distributed sort on an in-process pool of worker threads.
use std::time::Instant;

use parmerge::comm::{run_workers, Communicator, ThreadComm};
use parmerge::sort::merge_sort;
use parmerge::tools::{generate_random_sequence, is_sorted_array, seeded_rng};

const NELEMENTS: usize = 1000000;
const NWORKERS: i32 = 4;

pub fn main() {
    // Only rank 0 prepares data. The pool deals it out itself.
    let mut rng = seeded_rng(0);
    let data = generate_random_sequence(NELEMENTS, 0..1000000_i64, &mut rng);
    let mut expected = data.clone();

    let start = Instant::now();
    let results = run_workers(NWORKERS, move |comm: ThreadComm<i64>| {
        let input = (comm.rank() == 0).then(|| data.clone());
        merge_sort(&comm, input).unwrap()
    })
    .unwrap();
    let elapsed = start.elapsed();

    let sorted = results.into_iter().next().unwrap().unwrap();

    assert!(is_sorted_array(&sorted));
    expected.sort();
    assert_eq!(sorted, expected);

    println!(
        "Sorted {} elements on {} workers in {} ms.",
        NELEMENTS,
        NWORKERS,
        elapsed.as_millis()
    );
}
