//! Testing the distributed sort across MPI processes.
//!
//! Run with `mpirun -n <workers> target/debug/examples/mpi_mergesort`.
use mpi::traits::Communicator;

use parmerge::mpi_comm::MpiComm;
use parmerge::sort::merge_sort;
use parmerge::tools::{generate_random_sequence, is_sorted_array, seeded_rng};

const NELEMENTS: usize = 1000000;

pub fn main() {
    // Initialise MPI
    let universe = mpi::initialize().unwrap();
    let world = universe.world();

    // Only rank 0 prepares data. The pool deals it out itself.
    let data = (world.rank() == 0).then(|| {
        let mut rng = seeded_rng(0);
        generate_random_sequence(NELEMENTS, 0..1000000_i64, &mut rng)
    });

    let comm = MpiComm(world);
    let sorted = merge_sort(&comm, data).unwrap();

    if let Some(sorted) = sorted {
        assert!(is_sorted_array(&sorted));
        assert_eq!(sorted.len(), NELEMENTS);
        println!("Array is sorted.");
    }
}
