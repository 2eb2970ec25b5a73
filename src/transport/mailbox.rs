//! Per-peer tag demultiplexing shared by the transport implementations.

use crate::error::{Result, RingletError};
use crate::types::Addr;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, mpsc};

type TaggedReceiverMap = HashMap<u64, Arc<Mutex<mpsc::Receiver<Vec<u8>>>>>;

/// Shared state between frame delivery and the receivers.
///
/// When a frame arrives before `recv` has been called for its tag, the data
/// is buffered in `pending`. When a receiver registers, any pending frames
/// are flushed into the new channel first, preserving arrival order.
struct DemuxState {
    senders: HashMap<u64, mpsc::Sender<Vec<u8>>>,
    pending: HashMap<u64, Vec<Vec<u8>>>,
}

/// FIFO mailbox for one peer's inbound traffic, demultiplexed by tag.
///
/// Frames for one tag form an ordered lane; lanes are independent, so a
/// collective can wait on several lanes of the same peer concurrently.
pub(crate) struct TagMailbox {
    peer: Addr,
    depth: usize,
    state: Arc<Mutex<DemuxState>>,
    /// Per-tag receivers, each independently lockable so concurrent tags
    /// don't block each other.
    tagged_rx: Mutex<TaggedReceiverMap>,
}

impl TagMailbox {
    pub(crate) fn new(peer: Addr, depth: usize) -> Self {
        Self {
            peer,
            depth,
            state: Arc::new(Mutex::new(DemuxState {
                senders: HashMap::new(),
                pending: HashMap::new(),
            })),
            tagged_rx: Mutex::new(HashMap::new()),
        }
    }

    /// Route one inbound frame to its tag lane.
    ///
    /// Registration and pending-buffering happen under one lock so a frame
    /// can never slip between a receiver's pending flush and its sender
    /// registration.
    pub(crate) async fn deliver(&self, tag: u64, payload: Vec<u8>) {
        let tx = {
            let mut st = self.state.lock().await;
            match st.senders.get(&tag) {
                Some(tx) => tx.clone(),
                None => {
                    st.pending.entry(tag).or_default().push(payload);
                    return;
                }
            }
        };
        // Channel send outside the lock. A failed send means the mailbox is
        // being torn down; the frame is dropped with the connection.
        let _ = tx.send(payload).await;
    }

    /// Receive the next frame on `tag`, waiting if none has arrived.
    pub(crate) async fn recv(&self, tag: u64) -> Result<Vec<u8>> {
        let rx = self.tag_receiver(tag).await;
        let frame = rx.lock().await.recv().await;
        frame.ok_or(RingletError::PeerDisconnected { addr: self.peer })
    }

    /// Get or create the receiver for a tag lane.
    async fn tag_receiver(&self, tag: u64) -> Arc<Mutex<mpsc::Receiver<Vec<u8>>>> {
        // Fast path: already registered.
        {
            let map = self.tagged_rx.lock().await;
            if let Some(rx) = map.get(&tag) {
                return Arc::clone(rx);
            }
        }
        // Slow path: create the channel, register the sender, then flush any
        // pending frames outside the state lock.
        let (tx, rx) = mpsc::channel(self.depth);
        let flush_tx = tx.clone();
        let pending = {
            let mut st = self.state.lock().await;
            let pending = st.pending.remove(&tag);
            st.senders.insert(tag, tx);
            pending
        };
        if let Some(frames) = pending {
            for frame in frames {
                let _ = flush_tx.send(frame).await;
            }
        }
        let rx = Arc::new(Mutex::new(rx));
        self.tagged_rx.lock().await.insert(tag, Arc::clone(&rx));
        rx
    }
}
