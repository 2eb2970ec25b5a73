//! Split one ring of six members into three sub-rings by bin label.
//!
//! Each member runs as a tokio task over an in-process mesh and prints the
//! descriptor it ends up with. No process ever sees a membership list,
//! only its own position and its two neighbors.
//!
//! ```bash
//! cargo run --example bin_split
//! ```

use ringlet::{LocalMesh, RingGroup, Transport, split_by_bin};

#[tokio::main]
async fn main() -> ringlet::Result<()> {
    let world = 6u32;
    let bins = [0u32, 1, 0, 1, 0, 2];

    let mut handles = Vec::new();
    for transport in LocalMesh::build(world) {
        let my_bin = bins[transport.addr() as usize];
        handles.push(tokio::spawn(async move {
            let group = RingGroup::world(transport.addr(), world)?;
            let sub = split_by_bin(&transport, 3, Some(my_bin), &group).await?;
            Ok::<_, ringlet::RingletError>((transport.addr(), my_bin, sub))
        }));
    }

    let mut results = Vec::new();
    for h in handles {
        results.push(h.await.expect("member task panicked")?);
    }
    results.sort_by_key(|&(addr, _, _)| addr);

    for (addr, bin, sub) in results {
        println!("member {addr} (bin {bin}) -> {sub}");
    }
    // Output:
    // member 0 (bin 0) -> ring(addr=0, rank=0/3, left=4, right=2)
    // member 1 (bin 1) -> ring(addr=1, rank=0/2, left=3, right=3)
    // ...

    Ok(())
}
