//! Distribution of the initial sequence across the worker pool.

use std::ops::Range;

use crate::comm::{Communicator, Sortable};
use crate::sort::SortError;

/// Contiguous index ranges that assign one chunk of a `len` element sequence
/// to each of `size` workers, in rank order.
///
/// Every worker except the last gets exactly `len / size` elements; the last
/// worker absorbs the remainder. When `len < size` that quota is zero, so
/// every chunk but the last is empty and the last holds the whole sequence.
/// Empty chunks are fine, they sort to empty runs which merge as identities.
pub fn chunk_ranges(len: usize, size: usize) -> Vec<Range<usize>> {
    debug_assert!(size >= 1);

    let quota = len / size;

    let mut ranges = Vec::with_capacity(size);
    for rank in 0..size - 1 {
        ranges.push(rank * quota..(rank + 1) * quota);
    }
    ranges.push((size - 1) * quota..len);

    ranges
}

/// Deal the full sequence out to the pool, one contiguous chunk per worker.
///
/// Executes collectively. Rank 0 supplies the sequence and walks the other
/// ranks in order, sending each its chunk; every other rank supplies `None`
/// and blocks until its chunk arrives. Returns the local chunk.
///
/// Fails with [`SortError::InvalidInput`] if the sequence is missing on
/// rank 0 or supplied anywhere else.
pub fn scatter<T, C>(comm: &C, data: Option<Vec<T>>) -> Result<Vec<T>, SortError>
where
    T: Sortable,
    C: Communicator<T>,
{
    let size = comm.size();

    if comm.rank() != 0 {
        if data.is_some() {
            return Err(SortError::InvalidInput(
                "only rank 0 supplies the initial sequence",
            ));
        }
        return comm.receive(0);
    }

    let mut data = data.ok_or(SortError::InvalidInput(
        "the initial sequence must be present on rank 0",
    ))?;

    // A single worker keeps the whole sequence.
    if size == 1 {
        return Ok(data);
    }

    let ranges = chunk_ranges(data.len(), size as usize);
    log::debug!("scattering {} elements over {} workers", data.len(), size);

    for dest in 1..size {
        let chunk = data[ranges[dest as usize].clone()].to_vec();
        comm.send(chunk, dest)?;
    }

    data.truncate(ranges[0].end);
    Ok(data)
}
