//! Irregular all-to-all exchange by ring rotation.

use crate::collective::helpers::{
    LANE_DATA, LANE_LEFTWARD, LANE_RIGHTWARD, collective_recv, collective_send, decode_addr,
};
use crate::error::{Result, RingletError};
use crate::ring::RingGroup;
use crate::transport::Transport;
use crate::types::DataType;

/// Personalized all-to-all over a ring, with independent per-pair sizes.
///
/// `send_counts`/`send_displs` and `recv_counts`/`recv_displs` are in
/// *elements* of `dtype`, indexed by group-relative member index
/// `0..group.size()`; member `m`'s slice starts `displs[m]` elements into
/// the buffer. Counts may be zero; an empty message is still exchanged to
/// keep the rounds in step. On return, the receive slice for member `j`
/// holds exactly what `j`'s send slice for this process contained.
///
/// This is a collective call; every member of `group` must enter it.
///
/// The exchange runs in exactly `group.size()` rounds. Two addresses
/// rotate around the ring, starting at the left and right neighbor; each
/// round this process receives the payload of whichever member currently
/// sits at the source position and ships the payload addressed to the
/// member at the destination position. Alongside the data, every process
/// tells its current destination who its fixed left neighbor is and its
/// current source who its fixed right neighbor is. Each received address
/// is the next stop, so the rotation advances one hop per round with no
/// process ever holding more than two remote addresses. The final round
/// has both positions at this process itself and moves the self-addressed
/// slice through transport loopback.
///
/// Member addresses need not be contiguous; the rotation only ever relies
/// on neighbor knowledge, which is what makes this exchange usable on the
/// scattered rings produced by [`crate::split_by_bin`].
#[allow(clippy::too_many_arguments)]
pub async fn ring_alltoallv<T: Transport + ?Sized>(
    transport: &T,
    sendbuf: &[u8],
    send_counts: &[u32],
    send_displs: &[u32],
    recvbuf: &mut [u8],
    recv_counts: &[u32],
    recv_displs: &[u32],
    dtype: DataType,
    group: &RingGroup,
) -> Result<()> {
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

    let size = group.size() as usize;
    for (array, len) in [
        ("send_counts", send_counts.len()),
        ("send_displs", send_displs.len()),
        ("recv_counts", recv_counts.len()),
        ("recv_displs", recv_displs.len()),
    ] {
        if len != size {
            return Err(RingletError::CountsMismatch {
                array,
                len,
                group_size: group.size(),
            });
        }
    }
    check_layout("sendbuf", sendbuf.len(), send_counts, send_displs, dtype)?;
    check_layout("recvbuf", recvbuf.len(), recv_counts, recv_displs, dtype)?;

    let rank = group.rank_raw() as usize;
    let ring_left = group.left_raw();
    let ring_right = group.right_raw();
    let left_bytes = ring_left.to_le_bytes();
    let right_bytes = ring_right.to_le_bytes();
    let elem = dtype.size_in_bytes();

    let mut src = ring_left;
    let mut dst = ring_right;
    for round in 0..size {
        // The rotating position, not the loop index, names the member
        // whose data is in flight.
        let src_member = (rank + size - 1 - round) % size;
        let dst_member = (rank + 1 + round) % size;
        tracing::trace!(round, src, dst, src_member, dst_member, "rotation round");

        let send_off = dtype.byte_offset(send_displs[dst_member]);
        let send_len = send_counts[dst_member] as usize * elem;
        let send_slice = &sendbuf[send_off..send_off + send_len];

        let (data, src_next, dst_next, (), (), ()) = tokio::try_join!(
            collective_recv(transport, src, LANE_DATA, "alltoallv"),
            collective_recv(transport, src, LANE_RIGHTWARD, "alltoallv"),
            collective_recv(transport, dst, LANE_LEFTWARD, "alltoallv"),
            collective_send(transport, dst, LANE_DATA, send_slice, "alltoallv"),
            collective_send(transport, dst, LANE_RIGHTWARD, &left_bytes, "alltoallv"),
            collective_send(transport, src, LANE_LEFTWARD, &right_bytes, "alltoallv"),
        )?;

        let recv_off = dtype.byte_offset(recv_displs[src_member]);
        let recv_len = recv_counts[src_member] as usize * elem;
        if data.len() != recv_len {
            return Err(RingletError::SizeMismatch {
                expected: recv_len,
                actual: data.len(),
            });
        }
        recvbuf[recv_off..recv_off + recv_len].copy_from_slice(&data);

        src = decode_addr(&src_next)?;
        dst = decode_addr(&dst_next)?;
    }

    Ok(())
}

/// Check that every member's slice fits inside its buffer.
fn check_layout(
    buffer: &'static str,
    buf_len: usize,
    counts: &[u32],
    displs: &[u32],
    dtype: DataType,
) -> Result<()> {
    let elem = dtype.size_in_bytes() as u64;
    for (member, (&count, &displ)) in counts.iter().zip(displs).enumerate() {
        let end = (displ as u64 + count as u64) * elem;
        if end > buf_len as u64 {
            return Err(RingletError::BufferTooSmall {
                buffer,
                member: member as u32,
                needed: end as usize,
                len: buf_len,
            });
        }
    }
    Ok(())
}
