//! In-process transport: a full mesh of channel-backed mailboxes.
//!
//! Every "process" is a tokio task holding one [`LocalTransport`]. This is
//! the backend for tests, demos, and single-host runs; it implements the
//! same matching contract as the TCP mesh without touching the network.

use crate::config::RingletConfig;
use crate::error::{Result, RingletError};
use crate::transport::Transport;
use crate::transport::mailbox::TagMailbox;
use crate::types::Addr;
use futures::future::BoxFuture;
use std::collections::HashMap;
use std::sync::Arc;

/// Builder for an in-process mesh of [`LocalTransport`]s.
pub struct LocalMesh;

impl LocalMesh {
    /// Build a mesh of `world_size` endpoints addressed `0..world_size`.
    ///
    /// Hand each returned transport to its own task, the way a launcher
    /// would hand each process its endpoint.
    pub fn build(world_size: u32) -> Vec<LocalTransport> {
        Self::build_with_config(world_size, RingletConfig::default())
    }

    /// Build a mesh with explicit tuning parameters.
    pub fn build_with_config(world_size: u32, config: RingletConfig) -> Vec<LocalTransport> {
        // inboxes[dst][src] carries traffic src -> dst. The self entry makes
        // loopback sends ordinary deliveries.
        let inboxes: Vec<HashMap<Addr, Arc<TagMailbox>>> = (0..world_size)
            .map(|_| {
                (0..world_size)
                    .map(|src| (src, Arc::new(TagMailbox::new(src, config.channel_depth))))
                    .collect()
            })
            .collect();

        (0..world_size)
            .map(|addr| {
                let outbox = inboxes
                    .iter()
                    .enumerate()
                    .map(|(dst, inbox)| (dst as Addr, Arc::clone(&inbox[&addr])))
                    .collect();
                LocalTransport {
                    addr,
                    config: config.clone(),
                    inbox: inboxes[addr as usize].clone(),
                    outbox,
                }
            })
            .collect()
    }
}

/// One endpoint of a [`LocalMesh`].
pub struct LocalTransport {
    addr: Addr,
    config: RingletConfig,
    /// Mailboxes for inbound traffic, keyed by source address.
    inbox: HashMap<Addr, Arc<TagMailbox>>,
    /// Peers' mailboxes for this endpoint's outbound traffic, keyed by
    /// destination address.
    outbox: HashMap<Addr, Arc<TagMailbox>>,
}

impl Transport for LocalTransport {
    fn addr(&self) -> Addr {
        self.addr
    }

    fn config(&self) -> &RingletConfig {
        &self.config
    }

    fn send<'a>(&'a self, dest: Addr, tag: u64, data: &'a [u8]) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            let mbox = self
                .outbox
                .get(&dest)
                .ok_or(RingletError::UnknownPeer { addr: dest })?;
            mbox.deliver(tag, data.to_vec()).await;
            Ok(())
        })
    }

    fn recv<'a>(&'a self, src: Addr, tag: u64) -> BoxFuture<'a, Result<Vec<u8>>> {
        Box::pin(async move {
            let mbox = self
                .inbox
                .get(&src)
                .ok_or(RingletError::UnknownPeer { addr: src })?;
            mbox.recv(tag).await
        })
    }
}
