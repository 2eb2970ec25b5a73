//! Partition a ring into sub-rings by bin label.

use crate::collective::helpers::{
    LANE_LEFTWARD, LANE_RIGHTWARD, ceil_log2, collective_recv, collective_send, decode_words,
    encode_words,
};
use crate::error::{Result, RingletError};
use crate::ring::RingGroup;
use crate::transport::Transport;
use crate::types::ADDR_NULL;

// Layout of one bin's slot in a scan payload.
const COUNT: usize = 0;
const CLOSEST: usize = 1;

/// Split `group` into up to `bin_count` disjoint sub-rings.
///
/// A process is grouped with every other member that supplied the same
/// `my_bin` value; members keep their relative left-to-right order from the
/// input ring. Passing `None` opts out: the caller gets the null group but
/// still relays scan traffic, so the remaining members always converge.
///
/// This is a collective call; every member of `group` must enter it.
///
/// Two scans run at once, one accumulating leftward and one rightward. For
/// each bin a process tracks how many same-bin members lie strictly to each
/// side and the address of the nearest one, doubling the scan distance each
/// round by forwarding neighbor addresses alongside the payload. After
/// `ceil(log2(size))` rounds the leftward count is the new rank, the two
/// counts plus one are the new size, and the nearest same-bin addresses are
/// the new neighbors. Each round moves O(`bin_count`) words to each
/// neighbor, so the whole split is O(`bin_count` * log `size`) traffic per
/// process with O(1) group state. No membership list ever exists.
pub async fn split_by_bin<T: Transport + ?Sized>(
    transport: &T,
    bin_count: u32,
    my_bin: Option<u32>,
    group: &RingGroup,
) -> Result<RingGroup> {
    // Contract checks are local: no round trip is needed to fail.
    if let Some(bin) = my_bin {
        if bin >= bin_count {
            return Err(RingletError::BinOutOfRange { bin, bin_count });
        }
    }
    if group.is_null() {
        return Err(RingletError::NullGroup);
    }
    if group.addr() != transport.addr() {
        return Err(RingletError::MalformedGroup {
            reason: format!(
                "descriptor belongs to address {} but the transport is {}",
                group.addr(),
                transport.addr()
            ),
        });
    }

    let bins = bin_count as usize;
    // Per direction: [count, closest] per bin, plus one slot that carries
    // the neighbor address the pointer doubling needs.
    let words = 2 * bins + 1;
    let addr_slot = 2 * bins;

    let mut send_left = scratch_words(words)?;
    let mut send_right = scratch_words(words)?;
    for i in (0..2 * bins).step_by(2) {
        send_left[i + CLOSEST] = ADDR_NULL;
        send_right[i + CLOSEST] = ADDR_NULL;
    }

    // Local contribution: one member of my own bin, nearest known is me.
    if let Some(bin) = my_bin {
        let slot = 2 * bin as usize;
        send_left[slot + COUNT] = 1;
        send_right[slot + COUNT] = 1;
        send_left[slot + CLOSEST] = group.addr();
        send_right[slot + CLOSEST] = group.addr();
    }

    let rank = group.rank_raw();
    let size = group.size();
    let mut left = group.left_raw();
    let mut right = group.right_raw();
    let mut my_left = ADDR_NULL;
    let mut my_right = ADDR_NULL;

    let num_rounds = ceil_log2(size);
    for round in 0..num_rounds {
        let dist = 1u64 << round;
        tracing::trace!(round, dist, left, right, "scan round");

        // Rightward payload tells the right side who is beyond us on the
        // left, and vice versa; that address becomes the neighbor at twice
        // the distance next round.
        send_right[addr_slot] = left;
        send_left[addr_slot] = right;

        let to_right = encode_words(&send_right);
        let to_left = encode_words(&send_left);

        let (from_left, from_right, (), ()) = tokio::try_join!(
            collective_recv(transport, left, LANE_RIGHTWARD, "split"),
            collective_recv(transport, right, LANE_LEFTWARD, "split"),
            collective_send(transport, right, LANE_RIGHTWARD, &to_right, "split"),
            collective_send(transport, left, LANE_LEFTWARD, &to_left, "split"),
        )?;
        let recv_left = decode_words(&from_left, words)?;
        let recv_right = decode_words(&from_right, words)?;

        // Nearest same-bin member on each side: distances grow
        // monotonically, so the first non-null sighting is the neighbor.
        if let Some(bin) = my_bin {
            let slot = 2 * bin as usize;
            if my_left == ADDR_NULL {
                my_left = recv_left[slot + CLOSEST];
            }
            if my_right == ADDR_NULL {
                my_right = recv_right[slot + CLOSEST];
            }
        }

        // Merge data from the left into the right-going accumulation.
        for i in (0..2 * bins).step_by(2) {
            // Counts stop accumulating once the incoming range would wrap
            // past the ring boundary; the prefix must stay one-sided.
            if rank as u64 >= dist {
                send_right[i + COUNT] += recv_left[i + COUNT];
            }
            if send_right[i + CLOSEST] == ADDR_NULL {
                send_right[i + CLOSEST] = recv_left[i + CLOSEST];
            }
        }

        // Merge data from the right into the left-going accumulation.
        for i in (0..2 * bins).step_by(2) {
            if rank as u64 + dist < size as u64 {
                send_left[i + COUNT] += recv_right[i + COUNT];
            }
            if send_left[i + CLOSEST] == ADDR_NULL {
                send_left[i + CLOSEST] = recv_right[i + CLOSEST];
            }
        }

        left = recv_left[addr_slot];
        right = recv_right[addr_slot];
    }

    let out = match my_bin {
        Some(bin) => {
            let slot = 2 * bin as usize;
            // The accumulated counts include this process itself.
            let count_left = send_right[slot + COUNT] - 1;
            let count_right = send_left[slot + COUNT] - 1;
            let out_size = count_left + count_right + 1;
            if out_size == 1 {
                // Sole member of the bin: self-neighboring on both sides.
                RingGroup::singleton(group.addr())
            } else {
                RingGroup::from_parts(group.addr(), my_left, my_right, count_left, out_size)?
            }
        }
        None => RingGroup::null(group.addr()),
    };
    Ok(out)
}

fn scratch_words(len: usize) -> Result<Vec<u32>> {
    let mut v: Vec<u32> = Vec::new();
    v.try_reserve_exact(len)?;
    v.resize(len, 0);
    Ok(v)
}
