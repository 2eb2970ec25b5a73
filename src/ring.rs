//! Ring group descriptors.
//!
//! A group is represented not as a member list but as a ring: each member
//! holds its own transport address, the addresses of its immediate left and
//! right neighbors, its 0-based position, and the total member count. Group
//! state is O(1) per process regardless of group size, and every collective
//! in this crate works from this local view alone.

use crate::error::{Result, RingletError};
use crate::types::{ADDR_NULL, Addr, RANK_NULL};

/// Local descriptor of one ring-shaped process group.
///
/// Descriptors are plain values: collectives read them and return fresh
/// descriptors, never mutating their inputs. A descriptor is either *null*
/// (this process is not a member, size 0) or describes a consistent ring
/// position. All constructors enforce the local invariants, so a
/// `RingGroup` obtained from this API never needs re-validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RingGroup {
    addr: Addr,
    left: Addr,
    right: Addr,
    group_rank: u32,
    group_size: u32,
}

impl RingGroup {
    /// A ring containing only this process.
    ///
    /// The single member is its own left and right neighbor.
    pub fn singleton(addr: Addr) -> Self {
        Self {
            addr,
            left: addr,
            right: addr,
            group_rank: 0,
            group_size: 1,
        }
    }

    /// The full contiguous universe `0..universe_size` as one ring.
    ///
    /// This is the usual starting point: transport addresses coincide with
    /// ring positions, and neighbors wrap at the ends. Rings with scattered
    /// addressing arise later, as outputs of [`crate::split_by_bin`].
    pub fn world(addr: Addr, universe_size: u32) -> Result<Self> {
        if universe_size == 0 {
            return Err(RingletError::MalformedGroup {
                reason: "universe size must be at least 1".into(),
            });
        }
        if addr >= universe_size {
            return Err(RingletError::MalformedGroup {
                reason: format!("address {addr} outside universe of {universe_size}"),
            });
        }
        if universe_size == 1 {
            return Ok(Self::singleton(addr));
        }
        Ok(Self {
            addr,
            left: (addr + universe_size - 1) % universe_size,
            right: (addr + 1) % universe_size,
            group_rank: addr,
            group_size: universe_size,
        })
    }

    /// The null group: this process belongs to no ring.
    pub fn null(addr: Addr) -> Self {
        Self {
            addr,
            left: ADDR_NULL,
            right: ADDR_NULL,
            group_rank: RANK_NULL,
            group_size: 0,
        }
    }

    /// Build a descriptor for a ring with arbitrary transport numbering.
    ///
    /// Validates the locally-checkable invariants: a size-1 ring must
    /// self-loop, larger rings must have non-null neighbors distinct from
    /// the member itself, and the rank must lie within the group. Global
    /// circular consistency (following `right` size times returns here) is
    /// the caller's responsibility; it cannot be checked from one process.
    pub fn from_parts(
        addr: Addr,
        left: Addr,
        right: Addr,
        group_rank: u32,
        group_size: u32,
    ) -> Result<Self> {
        if addr == ADDR_NULL {
            return Err(RingletError::MalformedGroup {
                reason: "member address is the null sentinel".into(),
            });
        }
        if group_size == 0 {
            return Err(RingletError::MalformedGroup {
                reason: "size-0 groups are built with RingGroup::null".into(),
            });
        }
        if group_rank >= group_size {
            return Err(RingletError::MalformedGroup {
                reason: format!("rank {group_rank} outside group of {group_size}"),
            });
        }
        if group_size == 1 {
            if left != addr || right != addr {
                return Err(RingletError::MalformedGroup {
                    reason: "a size-1 ring must be its own left and right neighbor".into(),
                });
            }
        } else {
            if left == ADDR_NULL || right == ADDR_NULL {
                return Err(RingletError::MalformedGroup {
                    reason: "ring neighbors must not be null".into(),
                });
            }
            if left == addr || right == addr {
                return Err(RingletError::MalformedGroup {
                    reason: format!("self-neighboring in a ring of {group_size}"),
                });
            }
        }
        Ok(Self {
            addr,
            left,
            right,
            group_rank,
            group_size,
        })
    }

    /// This process's transport address. Valid for null groups too.
    pub fn addr(&self) -> Addr {
        self.addr
    }

    /// Transport address of the left ring neighbor, `None` for a null group.
    pub fn left(&self) -> Option<Addr> {
        (self.group_size > 0).then_some(self.left)
    }

    /// Transport address of the right ring neighbor, `None` for a null group.
    pub fn right(&self) -> Option<Addr> {
        (self.group_size > 0).then_some(self.right)
    }

    /// 0-based position within the ring, `None` for a null group.
    pub fn rank(&self) -> Option<u32> {
        (self.group_size > 0).then_some(self.group_rank)
    }

    /// Number of members, 0 for a null group.
    pub fn size(&self) -> u32 {
        self.group_size
    }

    /// True if this process is not a member of the group.
    pub fn is_null(&self) -> bool {
        self.group_size == 0
    }

    // Raw sentinel-valued accessors for the collective engines, which do
    // their bookkeeping in wire representation.
    pub(crate) fn left_raw(&self) -> Addr {
        self.left
    }

    pub(crate) fn right_raw(&self) -> Addr {
        self.right
    }

    pub(crate) fn rank_raw(&self) -> u32 {
        self.group_rank
    }
}

impl std::fmt::Display for RingGroup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_null() {
            write!(f, "ring(addr={}, null)", self.addr)
        } else {
            write!(
                f,
                "ring(addr={}, rank={}/{}, left={}, right={})",
                self.addr, self.group_rank, self.group_size, self.left, self.right
            )
        }
    }
}
