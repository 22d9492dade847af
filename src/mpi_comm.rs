//! Communicator adapter over a real MPI communicator.
//!
//! With the `mpi` feature enabled the sort runs across processes launched by
//! `mpirun`. A transfer is the same two tagged messages as on the thread
//! transport: the element count as a 4-byte signed integer under
//! [`COUNT_TAG`], then the raw fixed-width payload under [`PAYLOAD_TAG`].
//! MPI guarantees delivery order between an ordered pair of ranks, which is
//! all the protocol relies on.

use mpi::traits::{CommunicatorCollectives, Destination, Equivalence, Source};

use crate::comm::{Communicator, Rank, Sortable, COUNT_TAG, PAYLOAD_TAG};
use crate::sort::SortError;

/// A worker endpoint on top of an MPI communicator, typically the world.
pub struct MpiComm<C>(pub C);

impl<T, C> Communicator<T> for MpiComm<C>
where
    T: Sortable + Equivalence,
    C: CommunicatorCollectives,
{
    fn rank(&self) -> Rank {
        self.0.rank()
    }

    fn size(&self) -> Rank {
        self.0.size()
    }

    fn send(&self, data: Vec<T>, dest: Rank) -> Result<(), SortError> {
        let count =
            i32::try_from(data.len()).map_err(|_| SortError::LengthOverflow(data.len()))?;
        let process = self.0.process_at_rank(dest);

        process.send_with_tag(&count, COUNT_TAG);
        process.send_with_tag(&data[..], PAYLOAD_TAG);

        Ok(())
    }

    fn receive(&self, source: Rank) -> Result<Vec<T>, SortError> {
        let process = self.0.process_at_rank(source);

        // The count announcement sizes the buffer before the payload lands.
        let (count, _status) = process.receive_with_tag::<i32>(COUNT_TAG);
        let mut data = vec![T::default(); count as usize];
        process.receive_into_with_tag(&mut data[..], PAYLOAD_TAG);

        Ok(data)
    }

    fn barrier(&self) {
        self.0.barrier();
    }
}
