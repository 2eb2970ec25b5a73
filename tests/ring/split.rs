use super::helpers::{CountingTransport, run_mesh, run_ring, scan_rounds};
use ringlet::{LocalMesh, RingGroup, RingletError, Transport, split_by_bin};

/// Check a full split result against a reference partition computed from
/// the bin labels: membership, relative order, rank/size arithmetic, and
/// neighbor wiring, plus null groups for the opted-out members.
fn verify_partition(bins: &[Option<u32>], groups: &[RingGroup]) {
    assert_eq!(bins.len(), groups.len());
    let distinct: std::collections::BTreeSet<u32> = bins.iter().flatten().copied().collect();

    for bin in distinct {
        let members: Vec<usize> = (0..bins.len())
            .filter(|&i| bins[i] == Some(bin))
            .collect();
        for (pos, &m) in members.iter().enumerate() {
            let g = &groups[m];
            assert_eq!(g.addr(), m as u32);
            assert_eq!(
                g.size() as usize,
                members.len(),
                "bin {bin} size wrong at member {m}"
            );
            assert_eq!(
                g.rank(),
                Some(pos as u32),
                "bin {bin} rank wrong at member {m}"
            );
            let left = members[(pos + members.len() - 1) % members.len()];
            let right = members[(pos + 1) % members.len()];
            assert_eq!(g.left(), Some(left as u32), "bin {bin} left at member {m}");
            assert_eq!(
                g.right(),
                Some(right as u32),
                "bin {bin} right at member {m}"
            );
        }
    }

    for (i, g) in groups.iter().enumerate() {
        if bins[i].is_none() {
            assert!(g.is_null(), "member {i} opted out but got {g}");
        }
    }
}

async fn split_world(bins: &'static [Option<u32>], bin_count: u32) -> Vec<RingGroup> {
    run_ring(bins.len() as u32, move |t, g| async move {
        let my_bin = bins[t.addr() as usize];
        split_by_bin(&t, bin_count, my_bin, &g).await.unwrap()
    })
    .await
}

#[tokio::test]
async fn test_six_members_three_bins() {
    static BINS: [Option<u32>; 6] = [Some(0), Some(1), Some(0), Some(1), Some(0), Some(2)];
    let groups = split_world(&BINS, 3).await;

    // Bin 0 -> {0, 2, 4}, bin 1 -> {1, 3}, bin 2 -> {5}.
    verify_partition(&BINS, &groups);
    assert_eq!(groups[0].size(), 3);
    assert_eq!(groups[1].size(), 2);
    assert_eq!(groups[5].size(), 1);

    // Spot-check the wrap wiring of bin 0.
    assert_eq!(groups[0].left(), Some(4));
    assert_eq!(groups[0].right(), Some(2));
    assert_eq!(groups[4].right(), Some(0));

    // The singleton self-loops.
    assert_eq!(groups[5].left(), Some(5));
    assert_eq!(groups[5].right(), Some(5));
}

#[tokio::test]
async fn test_eight_members_scattered_bins() {
    static BINS: [Option<u32>; 8] = [
        Some(2),
        Some(0),
        Some(1),
        Some(2),
        Some(2),
        Some(0),
        Some(1),
        Some(2),
    ];
    let groups = split_world(&BINS, 3).await;
    verify_partition(&BINS, &groups);
}

#[tokio::test]
async fn test_all_same_bin_preserves_ring() {
    static BINS: [Option<u32>; 5] = [Some(0); 5];
    let groups = split_world(&BINS, 1).await;
    verify_partition(&BINS, &groups);
    for (i, g) in groups.iter().enumerate() {
        assert_eq!(g.rank(), Some(i as u32));
        assert_eq!(g.size(), 5);
    }
}

#[tokio::test]
async fn test_singleton_ring_stays_singleton() {
    let groups = run_ring(1, |t, g| async move {
        split_by_bin(&t, 4, Some(2), &g).await.unwrap()
    })
    .await;
    assert_eq!(groups[0], RingGroup::singleton(0));
}

#[tokio::test]
async fn test_opted_out_members_get_null_groups() {
    static BINS: [Option<u32>; 6] = [Some(0), None, Some(0), None, None, Some(1)];
    let groups = split_world(&BINS, 2).await;
    verify_partition(&BINS, &groups);
    assert!(groups[1].is_null());
    assert!(groups[3].is_null());
    assert!(groups[4].is_null());
    // Opt-outs keep their transport identity.
    assert_eq!(groups[3].addr(), 3);
}

#[tokio::test]
async fn test_everyone_opted_out() {
    static BINS: [Option<u32>; 4] = [None; 4];
    let groups = split_world(&BINS, 3).await;
    for g in &groups {
        assert!(g.is_null());
    }
}

#[tokio::test]
async fn test_ring_closure_in_both_directions() {
    static BINS: [Option<u32>; 9] = [
        Some(0),
        Some(1),
        Some(0),
        Some(0),
        Some(1),
        Some(0),
        Some(1),
        Some(0),
        Some(0),
    ];
    let groups = split_world(&BINS, 2).await;

    for start in groups.iter().filter(|g| !g.is_null()) {
        let size = start.size();
        let mut at = *start;
        for _ in 0..size {
            at = groups[at.right().unwrap() as usize];
        }
        assert_eq!(at.addr(), start.addr(), "rightward traversal did not close");

        let mut at = *start;
        for _ in 0..size {
            at = groups[at.left().unwrap() as usize];
        }
        assert_eq!(at.addr(), start.addr(), "leftward traversal did not close");
    }
}

#[tokio::test]
async fn test_repeated_split() {
    // Split by parity, then split each sub-ring by halves of the universe.
    let results = run_ring(8, |t, g| async move {
        let addr = t.addr();
        let parity = split_by_bin(&t, 2, Some(addr % 2), &g).await.unwrap();
        let half = split_by_bin(&t, 2, Some(addr / 4), &parity).await.unwrap();
        (parity, half)
    })
    .await;

    for (addr, (parity, half)) in results.iter().enumerate() {
        let addr = addr as u32;
        assert_eq!(parity.size(), 4);
        assert_eq!(parity.rank(), Some(addr / 2));
        // {0,2}, {4,6}, {1,3}, {5,7}: pairs within one parity and one half.
        assert_eq!(half.size(), 2);
        assert_eq!(half.rank(), Some((addr % 4) / 2));
        let partner = if (addr % 4) / 2 == 0 { addr + 2 } else { addr - 2 };
        assert_eq!(half.left(), Some(partner));
        assert_eq!(half.right(), Some(partner));
    }
}

#[tokio::test]
async fn test_scan_round_bound() {
    for size in [1u32, 2, 5, 8, 9] {
        let counts = run_mesh(size, move |t| async move {
            let counting = CountingTransport::new(t);
            let group = RingGroup::world(counting.addr(), size).unwrap();
            let bin = counting.addr() % 2;
            split_by_bin(&counting, 2, Some(bin), &group)
                .await
                .unwrap();
            counting.sends()
        })
        .await;

        // Two outbound messages per scan round.
        let expected = 2 * scan_rounds(size) as usize;
        for (addr, &sends) in counts.iter().enumerate() {
            assert_eq!(
                sends, expected,
                "member {addr} of {size} took {sends} sends"
            );
        }
    }
}

#[tokio::test]
async fn test_bin_out_of_range_fails_locally() {
    // Only one member calls; the error must surface without any traffic,
    // otherwise this would deadlock waiting for the absent peer.
    let mesh = LocalMesh::build(2);
    let group = RingGroup::world(0, 2).unwrap();
    let err = split_by_bin(&mesh[0], 3, Some(3), &group).await.unwrap_err();
    assert!(matches!(
        err,
        RingletError::BinOutOfRange { bin: 3, bin_count: 3 }
    ));
    assert!(err.is_contract_violation());
}

#[tokio::test]
async fn test_split_rejects_null_group() {
    let mesh = LocalMesh::build(1);
    let err = split_by_bin(&mesh[0], 1, Some(0), &RingGroup::null(0))
        .await
        .unwrap_err();
    assert!(matches!(err, RingletError::NullGroup));
}

#[tokio::test]
async fn test_split_rejects_foreign_descriptor() {
    let mesh = LocalMesh::build(2);
    let group = RingGroup::world(1, 2).unwrap();
    let err = split_by_bin(&mesh[0], 1, Some(0), &group).await.unwrap_err();
    assert!(matches!(err, RingletError::MalformedGroup { .. }));
}

#[tokio::test]
async fn test_split_does_not_mutate_input() {
    let results = run_ring(4, |t, g| async move {
        let before = g;
        let sub = split_by_bin(&t, 2, Some(t.addr() % 2), &g).await.unwrap();
        (before, g, sub)
    })
    .await;
    for (before, after, sub) in results {
        assert_eq!(before, after);
        assert_ne!(before, sub);
    }
}
