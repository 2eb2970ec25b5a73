//! Lightweight scalable ring process groups.
//!
//! A process group here is a ring, not a roster: each member knows its own
//! transport address, its two ring neighbors, its rank, and the group size:
//! O(1) state no matter how large the group. On top of that
//! representation the crate provides the two collectives that make it
//! useful: [`split_by_bin`], which partitions a ring into sub-rings in
//! logarithmic rounds, and [`ring_alltoallv`], an irregular personalized
//! exchange that rotates addresses around the ring one hop per round.
//!
//! Communication goes through the [`Transport`] trait; [`LocalMesh`]
//! (in-process channels) and [`TcpTransport`] (framed TCP mesh) are
//! provided.

pub mod collective;
pub mod config;
pub mod error;
pub mod ring;
pub mod transport;
pub mod types;

pub use collective::{RESERVED_TAGS, ring_alltoallv, split_by_bin};
pub use config::RingletConfig;
pub use error::{Result, RingletError};
pub use ring::RingGroup;
pub use transport::{LocalMesh, LocalTransport, TcpTransport, Transport};
pub use types::{ADDR_NULL, Addr, DataType, RANK_NULL};
