use crate::error::{Result, RingletError};
use crate::transport::Transport;
use crate::types::Addr;

/// Reserved tag lanes. Payloads moving leftward and rightward around the
/// ring use distinct lanes: at some scan distances both neighbors are the
/// same process, and only the lane keeps the two streams apart. The data
/// lane carries exchange payloads, which always flow rightward.
pub(crate) const LANE_RIGHTWARD: u64 = 1;
pub(crate) const LANE_LEFTWARD: u64 = 2;
pub(crate) const LANE_DATA: u64 = 3;

/// Integer ceiling of log2(n). Returns 0 for n <= 1.
pub(crate) fn ceil_log2(n: u32) -> u32 {
    if n <= 1 {
        return 0;
    }
    // For n > 1: ceil(log2(n)) = 32 - (n-1).leading_zeros()
    u32::BITS - (n - 1).leading_zeros()
}

/// Send bytes to a peer with timeout, wrapping errors as `CollectiveFailed`.
pub(crate) async fn collective_send<T: Transport + ?Sized>(
    transport: &T,
    dest: Addr,
    lane: u64,
    data: &[u8],
    operation: &'static str,
) -> Result<()> {
    let timeout = transport.config().collective_timeout;
    match tokio::time::timeout(timeout, transport.send(dest, lane, data)).await {
        Ok(Ok(())) => Ok(()),
        Ok(Err(e)) => Err(RingletError::CollectiveFailed {
            operation,
            addr: dest,
            reason: e.to_string(),
        }),
        Err(_) => Err(RingletError::CollectiveFailed {
            operation,
            addr: dest,
            reason: format!("send timed out after {}s", timeout.as_secs()),
        }),
    }
}

/// Receive bytes from a peer with timeout, wrapping errors as `CollectiveFailed`.
pub(crate) async fn collective_recv<T: Transport + ?Sized>(
    transport: &T,
    src: Addr,
    lane: u64,
    operation: &'static str,
) -> Result<Vec<u8>> {
    let timeout = transport.config().collective_timeout;
    match tokio::time::timeout(timeout, transport.recv(src, lane)).await {
        Ok(Ok(buf)) => Ok(buf),
        Ok(Err(e)) => Err(RingletError::CollectiveFailed {
            operation,
            addr: src,
            reason: e.to_string(),
        }),
        Err(_) => Err(RingletError::CollectiveFailed {
            operation,
            addr: src,
            reason: format!("recv timed out after {}s", timeout.as_secs()),
        }),
    }
}

/// Encode a word vector as little-endian bytes.
pub(crate) fn encode_words(words: &[u32]) -> Vec<u8> {
    let mut out = Vec::with_capacity(words.len() * 4);
    for w in words {
        out.extend_from_slice(&w.to_le_bytes());
    }
    out
}

/// Decode little-endian bytes into exactly `expected` words.
pub(crate) fn decode_words(bytes: &[u8], expected: usize) -> Result<Vec<u32>> {
    if bytes.len() != expected * 4 {
        return Err(RingletError::SizeMismatch {
            expected: expected * 4,
            actual: bytes.len(),
        });
    }
    Ok(bytes
        .chunks_exact(4)
        .map(|c| u32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect())
}

/// Decode a single little-endian address.
pub(crate) fn decode_addr(bytes: &[u8]) -> Result<Addr> {
    let words = decode_words(bytes, 1)?;
    Ok(words[0])
}
