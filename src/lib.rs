//! A library for distributed merge sorting.
//!
//! A fixed pool of workers identified by rank `0..size` cooperatively sorts
//! a single sequence that starts and ends on rank 0. The sequence is
//! scattered into contiguous chunks, every worker merge sorts its chunk
//! locally, and a tree of pairwise merges reduces the sorted runs back to
//! rank 0. Workers exchange data only by moving it through a
//! [`comm::Communicator`], either the in-process thread pool from [`comm`]
//! or, with the `mpi` feature, real MPI processes.
#![cfg_attr(feature = "strict", deny(warnings), deny(unused_crate_dependencies))]
#![warn(missing_docs)]

pub mod comm;
pub mod merge;
#[cfg(feature = "mpi")]
pub mod mpi_comm;
pub mod reduce;
pub mod scatter;
pub mod sort;
pub mod tools;

// Only the benchmark binary uses these.
#[cfg(feature = "clap")]
use clap as _;
#[cfg(feature = "env_logger")]
use env_logger as _;
