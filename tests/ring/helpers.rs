use futures::future::BoxFuture;
use ringlet::{Addr, LocalMesh, LocalTransport, Result, RingGroup, RingletConfig, Transport};
use std::sync::atomic::{AtomicUsize, Ordering};

/// Run one task per mesh endpoint, like a launcher handing each process its
/// transport. Results come back in address order.
pub async fn run_mesh<F, Fut, R>(world_size: u32, f: F) -> Vec<R>
where
    F: Fn(LocalTransport) -> Fut,
    Fut: std::future::Future<Output = R> + Send + 'static,
    R: Send + 'static,
{
    let mut handles = Vec::new();
    for transport in LocalMesh::build(world_size) {
        handles.push(tokio::spawn(f(transport)));
    }
    let mut results = Vec::new();
    for h in handles {
        results.push(h.await.unwrap());
    }
    results
}

/// Like `run_mesh`, with every endpoint already holding the full-universe
/// ring descriptor.
pub async fn run_ring<F, Fut, R>(world_size: u32, f: F) -> Vec<R>
where
    F: Fn(LocalTransport, RingGroup) -> Fut,
    Fut: std::future::Future<Output = R> + Send + 'static,
    R: Send + 'static,
{
    run_mesh(world_size, move |t| {
        let group = RingGroup::world(t.addr(), world_size).unwrap();
        f(t, group)
    })
    .await
}

/// Number of scan rounds a split takes on a ring of `size`.
pub fn scan_rounds(size: u32) -> u32 {
    if size <= 1 {
        return 0;
    }
    u32::BITS - (size - 1).leading_zeros()
}

/// Transport decorator that counts outbound messages, for verifying round
/// bounds without touching the collectives themselves.
pub struct CountingTransport {
    inner: LocalTransport,
    sends: AtomicUsize,
}

impl CountingTransport {
    pub fn new(inner: LocalTransport) -> Self {
        Self {
            inner,
            sends: AtomicUsize::new(0),
        }
    }

    pub fn sends(&self) -> usize {
        self.sends.load(Ordering::Relaxed)
    }
}

impl Transport for CountingTransport {
    fn addr(&self) -> Addr {
        self.inner.addr()
    }

    fn config(&self) -> &RingletConfig {
        self.inner.config()
    }

    fn send<'a>(&'a self, dest: Addr, tag: u64, data: &'a [u8]) -> BoxFuture<'a, Result<()>> {
        self.sends.fetch_add(1, Ordering::Relaxed);
        self.inner.send(dest, tag, data)
    }

    fn recv<'a>(&'a self, src: Addr, tag: u64) -> BoxFuture<'a, Result<Vec<u8>>> {
        self.inner.recv(src, tag)
    }
}

/// Element displacements for back-to-back slices of the given counts.
pub fn packed_displs(counts: &[u32]) -> Vec<u32> {
    let mut displs = Vec::with_capacity(counts.len());
    let mut off = 0;
    for &c in counts {
        displs.push(off);
        off += c;
    }
    displs
}
