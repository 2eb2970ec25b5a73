//! Collective operations over ring groups.
//!
//! Both operations are blocking collectives: every member of the group must
//! enter the call, and each member exchanges data only with its current
//! ring neighbors, so no process ever needs a membership list.

mod alltoallv;
mod helpers;
mod split;

pub use alltoallv::ring_alltoallv;
pub use split::split_by_bin;

/// Tags below this value are reserved for collective lanes.
///
/// Applications sharing a transport with collectives should tag their own
/// traffic at or above this value.
pub const RESERVED_TAGS: u64 = 8;
