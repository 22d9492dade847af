//! Worker identity and point-to-point communication.
//!
//! The sort protocol is written against the [`Communicator`] trait. A
//! communicator ties one worker to a fixed pool of `size` peers identified
//! by rank `0..size`. Every transfer moves a sequence: the sender gives its
//! elements up, the receiver becomes the sole owner. On the wire a transfer
//! is two tagged messages, the element count as an `i32` under [`COUNT_TAG`]
//! followed by the payload under [`PAYLOAD_TAG`], and messages between the
//! same ordered pair of ranks arrive in the order they were sent.
//!
//! [`ThreadComm`] is the in-process transport, one thread per worker over a
//! full mesh of rendezvous channels. The `mpi` feature adds an adapter over
//! a real MPI communicator with the identical wire format.

use std::sync::mpsc::{sync_channel, Receiver, SyncSender};
use std::sync::{Arc, Barrier};
use std::thread;

use itertools::{izip, Itertools};

use crate::sort::SortError;

/// Identifier of a worker within a fixed-size pool.
pub type Rank = i32;

/// Message tag announcing the element count of a transfer.
pub const COUNT_TAG: i32 = 1;

/// Message tag carrying the element payload of a transfer.
pub const PAYLOAD_TAG: i32 = 0;

/// Everything the distributed sort asks of an element type.
///
/// Blanket implemented; fixed-width `Copy` elements keep the wire format
/// trivial and let chunks move between workers without serialization.
pub trait Sortable: Copy + Default + Ord + Send + 'static {}

impl<T: Copy + Default + Ord + Send + 'static> Sortable for T {}

/// One worker's endpoint into the pool.
///
/// The protocol code is generic over this trait, so the same sort runs
/// unchanged on worker threads and on MPI processes.
pub trait Communicator<T: Sortable> {
    /// Rank of this worker.
    fn rank(&self) -> Rank;

    /// Number of workers in the pool.
    fn size(&self) -> Rank;

    /// Transfer a sequence to `dest`, consuming it.
    ///
    /// Blocks until the receiver has accepted the transfer.
    fn send(&self, data: Vec<T>, dest: Rank) -> Result<(), SortError>;

    /// Receive a sequence from `source`.
    ///
    /// Blocks until the matching transfer arrives.
    fn receive(&self, source: Rank) -> Result<Vec<T>, SortError>;

    /// Block until every worker in the pool has arrived.
    fn barrier(&self);
}

/// A tagged wire message.
enum Message<T> {
    Count(i32),
    Payload(Vec<T>),
}

impl<T> Message<T> {
    fn tag(&self) -> i32 {
        match self {
            Message::Count(_) => COUNT_TAG,
            Message::Payload(_) => PAYLOAD_TAG,
        }
    }
}

/// In-process communicator backed by one thread per worker.
///
/// Built as a pool by [`local_universe`]. Each ordered pair of ranks has a
/// channel of its own, which gives per-pair ordering by construction. The
/// channels are rendezvous channels: a send suspends the sending worker
/// until the receiver takes the message, matching the synchronous
/// message-passing model where sends and receives are the only suspension
/// points.
pub struct ThreadComm<T> {
    rank: Rank,
    size: Rank,
    // Send halves indexed by destination rank, receive halves by source.
    peers: Vec<SyncSender<Message<T>>>,
    inboxes: Vec<Receiver<Message<T>>>,
    barrier: Arc<Barrier>,
}

impl<T: Sortable> Communicator<T> for ThreadComm<T> {
    fn rank(&self) -> Rank {
        self.rank
    }

    fn size(&self) -> Rank {
        self.size
    }

    fn send(&self, data: Vec<T>, dest: Rank) -> Result<(), SortError> {
        let count =
            i32::try_from(data.len()).map_err(|_| SortError::LengthOverflow(data.len()))?;
        let peer = &self.peers[dest as usize];

        peer.send(Message::Count(count)).map_err(|_| SortError::Disconnected {
            source: self.rank,
            dest,
        })?;
        peer.send(Message::Payload(data)).map_err(|_| SortError::Disconnected {
            source: self.rank,
            dest,
        })?;

        Ok(())
    }

    fn receive(&self, source: Rank) -> Result<Vec<T>, SortError> {
        let inbox = &self.inboxes[source as usize];
        let disconnected = || SortError::Disconnected {
            source,
            dest: self.rank,
        };

        let count = match inbox.recv().map_err(|_| disconnected())? {
            Message::Count(count) => count,
            other => {
                return Err(SortError::Protocol {
                    expected: COUNT_TAG,
                    actual: other.tag(),
                })
            }
        };
        let data = match inbox.recv().map_err(|_| disconnected())? {
            Message::Payload(data) => data,
            other => {
                return Err(SortError::Protocol {
                    expected: PAYLOAD_TAG,
                    actual: other.tag(),
                })
            }
        };
        debug_assert_eq!(data.len(), count as usize);

        Ok(data)
    }

    fn barrier(&self) {
        self.barrier.wait();
    }
}

/// Create the communicators for an in-process pool of `size` workers.
///
/// Returns one communicator per rank, in rank order. Fails with
/// [`SortError::InvalidTopology`] if `size` is not positive.
pub fn local_universe<T: Sortable>(size: Rank) -> Result<Vec<ThreadComm<T>>, SortError> {
    if size <= 0 {
        return Err(SortError::InvalidTopology { size });
    }
    let n = size as usize;
    let barrier = Arc::new(Barrier::new(n));

    // One channel per ordered pair, the unused self loop included, so both
    // halves stay directly indexable by rank.
    let mut peers: Vec<Vec<SyncSender<Message<T>>>> =
        (0..n).map(|_| Vec::with_capacity(n)).collect();
    let mut inboxes: Vec<Vec<Receiver<Message<T>>>> =
        (0..n).map(|_| Vec::with_capacity(n)).collect();

    for source in 0..n {
        for dest in 0..n {
            let (sender, receiver) = sync_channel(0);
            peers[source].push(sender);
            inboxes[dest].push(receiver);
        }
    }

    Ok(izip!(0.., peers, inboxes)
        .map(|(rank, peers, inboxes)| ThreadComm {
            rank,
            size,
            peers,
            inboxes,
            barrier: Arc::clone(&barrier),
        })
        .collect_vec())
}

/// Run one closure per worker on its own thread and collect the results in
/// rank order.
///
/// The in-process equivalent of launching a binary under `mpirun -n size`.
/// Each closure call receives the communicator of its rank.
pub fn run_workers<T, R, F>(size: Rank, worker: F) -> Result<Vec<R>, SortError>
where
    T: Sortable,
    R: Send,
    F: Fn(ThreadComm<T>) -> R + Sync,
{
    let comms = local_universe(size)?;

    Ok(thread::scope(|scope| {
        let worker = &worker;
        let handles = comms
            .into_iter()
            .map(|comm| scope.spawn(move || worker(comm)))
            .collect_vec();
        handles
            .into_iter()
            .map(|handle| handle.join().expect("worker thread panicked"))
            .collect_vec()
    }))
}
