//! Irregular all-to-all inside a split sub-ring, over real TCP sockets.
//!
//! Forms a loopback TCP mesh of four members, splits it by parity, then
//! runs a variable-length exchange within each sub-ring: member i sends
//! i + j + 1 bytes to member j. The sub-rings' transport addresses are not
//! contiguous, which is exactly the case the rotating exchange exists for.
//!
//! ```bash
//! cargo run --example irregular_exchange
//! ```

use ringlet::{DataType, RingGroup, TcpTransport, Transport, ring_alltoallv, split_by_bin};

#[tokio::main]
async fn main() -> ringlet::Result<()> {
    let world = 4u32;
    let mesh = TcpTransport::mesh_local(world).await?;

    let mut handles = Vec::new();
    for transport in mesh {
        handles.push(tokio::spawn(async move {
            let group = RingGroup::world(transport.addr(), world)?;
            let sub = split_by_bin(&transport, 2, Some(transport.addr() % 2), &group).await?;

            let size = sub.size();
            let me = sub.rank().expect("split participant is a member");

            let counts: Vec<u32> = (0..size).map(|j| me + j + 1).collect();
            let mut displs = Vec::new();
            let mut off = 0;
            for &c in &counts {
                displs.push(off);
                off += c;
            }
            let sendbuf: Vec<u8> = (0..size)
                .flat_map(|j| std::iter::repeat_n((16 * me + j) as u8, (me + j + 1) as usize))
                .collect();
            let mut recvbuf = vec![0u8; off as usize];

            ring_alltoallv(
                &transport,
                &sendbuf,
                &counts,
                &displs,
                &mut recvbuf,
                &counts,
                &displs,
                DataType::U8,
                &sub,
            )
            .await?;

            Ok::<_, ringlet::RingletError>((transport.addr(), me, recvbuf))
        }));
    }

    let mut results = Vec::new();
    for h in handles {
        results.push(h.await.expect("member task panicked")?);
    }
    results.sort_by_key(|&(addr, _, _)| addr);

    for (addr, me, recvbuf) in results {
        println!("member {addr} (group rank {me}) received {recvbuf:?}");
    }

    Ok(())
}
