//! Transport over a full mesh of raw TCP connections.
//!
//! Each peer pair shares one stream carrying `[tag: u64 LE][len: u64 LE]
//! [payload]` frames; a background task per peer reads frames and routes
//! them into the tag mailbox. Traffic is unencrypted: this transport is
//! meant for cluster-internal links.

use crate::config::RingletConfig;
use crate::error::{Result, RingletError};
use crate::transport::Transport;
use crate::transport::mailbox::TagMailbox;
use crate::types::Addr;
use futures::future::BoxFuture;
use std::collections::{HashMap, HashSet};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Mutex;

/// Attempts to reach a peer's listener during mesh formation.
const CONNECT_ATTEMPTS: u32 = 20;
const CONNECT_BACKOFF: Duration = Duration::from_millis(50);

enum PeerLink {
    Socket {
        writer: Mutex<tokio::io::WriteHalf<TcpStream>>,
        _recv_task: tokio::task::JoinHandle<()>,
    },
    /// Self-addressed traffic short-circuits into the own mailbox.
    Loopback,
}

struct TcpPeer {
    link: PeerLink,
    mailbox: Arc<TagMailbox>,
}

impl TcpPeer {
    fn from_stream(stream: TcpStream, peer: Addr, config: &RingletConfig) -> Self {
        let (reader, writer) = tokio::io::split(stream);
        let mailbox = Arc::new(TagMailbox::new(peer, config.channel_depth));
        let recv_mailbox = Arc::clone(&mailbox);
        let max_frame = config.max_frame_bytes;
        let recv_task = tokio::spawn(async move {
            recv_loop(reader, recv_mailbox, max_frame).await;
        });
        Self {
            link: PeerLink::Socket {
                writer: Mutex::new(writer),
                _recv_task: recv_task,
            },
            mailbox,
        }
    }

    fn loopback(addr: Addr, config: &RingletConfig) -> Self {
        Self {
            link: PeerLink::Loopback,
            mailbox: Arc::new(TagMailbox::new(addr, config.channel_depth)),
        }
    }
}

/// Mesh transport over framed TCP streams.
pub struct TcpTransport {
    addr: Addr,
    config: RingletConfig,
    peers: HashMap<Addr, TcpPeer>,
}

impl TcpTransport {
    /// Join a mesh: bind `listen`, accept connections from peers with
    /// higher addresses, connect to peers with lower ones.
    ///
    /// `peers` lists every *other* member as `(address, socket)`. All
    /// members must call `join` concurrently; formation completes when the
    /// full mesh is up. Connections open with a 4-byte hello carrying the
    /// connector's address so the accepting side can identify it.
    pub async fn join(
        addr: Addr,
        listen: SocketAddr,
        peers: &[(Addr, SocketAddr)],
        config: RingletConfig,
    ) -> Result<TcpTransport> {
        let listener = TcpListener::bind(listen).await?;
        let mut map = HashMap::new();

        for &(peer_addr, sock) in peers.iter().filter(|&&(a, _)| a < addr) {
            let mut stream = connect_with_retry(sock).await?;
            stream.write_all(&addr.to_le_bytes()).await?;
            stream.flush().await?;
            tracing::debug!(peer = peer_addr, "connected to peer");
            map.insert(peer_addr, TcpPeer::from_stream(stream, peer_addr, &config));
        }

        let mut expected: HashSet<Addr> = peers
            .iter()
            .filter(|&&(a, _)| a > addr)
            .map(|&(a, _)| a)
            .collect();
        while !expected.is_empty() {
            let (mut stream, remote) = listener.accept().await?;
            stream.set_nodelay(true)?;
            let mut hello = [0u8; 4];
            stream.read_exact(&mut hello).await?;
            let peer_addr = Addr::from_le_bytes(hello);
            if !expected.remove(&peer_addr) {
                tracing::warn!(peer = peer_addr, %remote, "unexpected connection, dropping");
                continue;
            }
            tracing::debug!(peer = peer_addr, "accepted peer");
            map.insert(peer_addr, TcpPeer::from_stream(stream, peer_addr, &config));
        }

        map.insert(addr, TcpPeer::loopback(addr, &config));
        tracing::info!(addr, peers = map.len() - 1, "tcp mesh formed");
        Ok(TcpTransport {
            addr,
            config,
            peers: map,
        })
    }

    /// Build a complete mesh on loopback interfaces within one process,
    /// one endpoint per future "process" task. For demos and tests.
    pub async fn mesh_local(world_size: u32) -> Result<Vec<TcpTransport>> {
        Self::mesh_local_with_config(world_size, RingletConfig::default()).await
    }

    /// `mesh_local` with explicit tuning parameters.
    pub async fn mesh_local_with_config(
        world_size: u32,
        config: RingletConfig,
    ) -> Result<Vec<TcpTransport>> {
        let mut peer_maps: Vec<HashMap<Addr, TcpPeer>> =
            (0..world_size).map(|_| HashMap::new()).collect();

        // For each pair (i, j) with i < j: i listens, j connects.
        for i in 0..world_size {
            for j in (i + 1)..world_size {
                let listener = TcpListener::bind("127.0.0.1:0").await?;
                let target = listener.local_addr()?;
                let (accepted, connected) = tokio::try_join!(
                    async {
                        let (stream, _) = listener.accept().await?;
                        stream.set_nodelay(true)?;
                        Ok::<_, std::io::Error>(stream)
                    },
                    async {
                        let stream = TcpStream::connect(target).await?;
                        stream.set_nodelay(true)?;
                        Ok::<_, std::io::Error>(stream)
                    },
                )?;
                peer_maps[i as usize].insert(j, TcpPeer::from_stream(accepted, j, &config));
                peer_maps[j as usize].insert(i, TcpPeer::from_stream(connected, i, &config));
            }
        }

        Ok(peer_maps
            .into_iter()
            .enumerate()
            .map(|(addr, mut peers)| {
                let addr = addr as Addr;
                peers.insert(addr, TcpPeer::loopback(addr, &config));
                TcpTransport {
                    addr,
                    config: config.clone(),
                    peers,
                }
            })
            .collect())
    }

    /// Write one `[tag][len][payload]` frame to a peer's stream.
    async fn write_frame(
        &self,
        writer: &Mutex<tokio::io::WriteHalf<TcpStream>>,
        tag: u64,
        data: &[u8],
    ) -> Result<()> {
        let mut writer = writer.lock().await;
        writer
            .write_all(&tag.to_le_bytes())
            .await
            .map_err(|e| RingletError::transport(format!("tcp write tag: {e}")))?;
        writer
            .write_all(&(data.len() as u64).to_le_bytes())
            .await
            .map_err(|e| RingletError::transport(format!("tcp write len: {e}")))?;
        writer
            .write_all(data)
            .await
            .map_err(|e| RingletError::transport(format!("tcp write payload: {e}")))?;
        writer
            .flush()
            .await
            .map_err(|e| RingletError::transport(format!("tcp flush: {e}")))?;
        Ok(())
    }
}

impl Transport for TcpTransport {
    fn addr(&self) -> Addr {
        self.addr
    }

    fn config(&self) -> &RingletConfig {
        &self.config
    }

    fn send<'a>(&'a self, dest: Addr, tag: u64, data: &'a [u8]) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            let peer = self
                .peers
                .get(&dest)
                .ok_or(RingletError::UnknownPeer { addr: dest })?;
            match &peer.link {
                PeerLink::Socket { writer, .. } => self.write_frame(writer, tag, data).await,
                PeerLink::Loopback => {
                    peer.mailbox.deliver(tag, data.to_vec()).await;
                    Ok(())
                }
            }
        })
    }

    fn recv<'a>(&'a self, src: Addr, tag: u64) -> BoxFuture<'a, Result<Vec<u8>>> {
        Box::pin(async move {
            let peer = self
                .peers
                .get(&src)
                .ok_or(RingletError::UnknownPeer { addr: src })?;
            peer.mailbox.recv(tag).await
        })
    }
}

async fn connect_with_retry(target: SocketAddr) -> Result<TcpStream> {
    let mut attempt = 0;
    loop {
        match TcpStream::connect(target).await {
            Ok(stream) => {
                stream.set_nodelay(true)?;
                return Ok(stream);
            }
            Err(e) if attempt + 1 < CONNECT_ATTEMPTS => {
                attempt += 1;
                tracing::debug!(%target, attempt, "connect failed ({e}), retrying");
                tokio::time::sleep(CONNECT_BACKOFF).await;
            }
            Err(e) => {
                return Err(RingletError::transport_with_source(
                    format!("connect to {target} failed after {CONNECT_ATTEMPTS} attempts"),
                    e,
                ));
            }
        }
    }
}

/// Background loop: read frames off one peer stream into its mailbox.
async fn recv_loop(
    mut reader: tokio::io::ReadHalf<TcpStream>,
    mailbox: Arc<TagMailbox>,
    max_frame: usize,
) {
    let mut tag_buf = [0u8; 8];
    let mut len_buf = [0u8; 8];
    loop {
        if let Err(e) = reader.read_exact(&mut tag_buf).await {
            tracing::debug!("tcp recv loop ended: {e}");
            return;
        }
        if let Err(e) = reader.read_exact(&mut len_buf).await {
            tracing::debug!("tcp recv loop ended reading len: {e}");
            return;
        }
        let tag = u64::from_le_bytes(tag_buf);
        let len = u64::from_le_bytes(len_buf) as usize;

        if len > max_frame {
            tracing::warn!(len, "tcp frame too large, closing connection");
            return;
        }

        let mut payload = vec![0u8; len];
        if let Err(e) = reader.read_exact(&mut payload).await {
            tracing::debug!("tcp recv loop ended reading payload: {e}");
            return;
        }

        mailbox.deliver(tag, payload).await;
    }
}
