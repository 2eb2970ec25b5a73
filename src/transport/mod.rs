//! Point-to-point transports.
//!
//! Collectives are written against the [`Transport`] trait and never see
//! sockets or channels. Two implementations ship with the crate: an
//! in-process channel mesh ([`LocalMesh`]) and a framed-TCP full mesh
//! ([`TcpTransport`]).

pub(crate) mod mailbox;

mod local;
mod tcp;

pub use local::{LocalMesh, LocalTransport};
pub use tcp::TcpTransport;

use crate::config::RingletConfig;
use crate::error::Result;
use crate::types::Addr;
use futures::future::BoxFuture;

/// Asynchronous point-to-point messaging within a fixed universe of
/// processes, addressed by flat [`Addr`].
///
/// Matching contract: messages between one ordered pair of processes on one
/// tag form a FIFO lane: `recv(src, tag)` yields them in the order `src`
/// sent them. Messages on different tags or from different peers are
/// independent. Collectives issue all of a round's transfers at once and
/// join them, so implementations must allow concurrent `send`s and `recv`s
/// on distinct lanes of the same peer.
///
/// Implementations must support self-addressed traffic (`dest == addr()`):
/// the last round of a ring rotation is a self-exchange.
///
/// Tags below [`crate::collective::RESERVED_TAGS`] are reserved for
/// collective lanes; applications should use higher tags for their own
/// traffic.
pub trait Transport: Send + Sync {
    /// This process's address in the transport's flat universe.
    fn addr(&self) -> Addr;

    /// Tuning parameters shared by collectives running over this transport.
    fn config(&self) -> &RingletConfig;

    /// Deliver `data` to `dest` on the given tag lane.
    fn send<'a>(&'a self, dest: Addr, tag: u64, data: &'a [u8]) -> BoxFuture<'a, Result<()>>;

    /// Receive the next message from `src` on the given tag lane.
    fn recv<'a>(&'a self, src: Addr, tag: u64) -> BoxFuture<'a, Result<Vec<u8>>>;
}
