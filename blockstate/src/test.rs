//! Scenario tests for the block state.

use crate::degs::DegreeMask;
use crate::error::BlockStateError;
use crate::graph::{BlockGraph, Multigraph};
use crate::options::{BlockStateOptions, DegreeCacheKind, DegreeDlKind, EntropyArgs, IndexBackend};
use crate::state::BlockState;
use crate::util::lbinom;
use approx::assert_abs_diff_eq;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

/// Random multigraph with parallel edges and self-loops.
///
/// If `weighted` is true, edge weights are drawn from {0, 1, 2, 3} and
/// vertex weights from {1, 2}; otherwise both stay unity.
fn random_multigraph(
    n: usize,
    num_edges: usize,
    directed: bool,
    weighted: bool,
    seed: u64,
) -> Multigraph {
    let mut rng = SmallRng::seed_from_u64(seed);
    let mut g = Multigraph::new(n, directed);
    let mut eweights = Vec::with_capacity(num_edges);
    for _ in 0..num_edges {
        let s = rng.random_range(0..n);
        let t = rng.random_range(0..n);
        g.push_edge(s, t);
        eweights.push(rng.random_range(0..4));
    }
    if weighted {
        let vweights = (0..n).map(|_| rng.random_range(1..3)).collect();
        g.with_edge_weights(eweights).with_vertex_weights(vweights)
    } else {
        g
    }
}

fn random_partition(n: usize, num_blocks: usize, seed: u64) -> Vec<usize> {
    let mut rng = SmallRng::seed_from_u64(seed);
    (0..n).map(|_| rng.random_range(0..num_blocks)).collect()
}

fn options(deg_corr: bool, index_backend: IndexBackend) -> BlockStateOptions {
    BlockStateOptions {
        deg_corr,
        index_backend,
        ..BlockStateOptions::default()
    }
}

/// Commit random moves and compare each predicted delta with the change of
/// the full objective.
fn check_virtual_moves(g: &Multigraph, deg_corr: bool, args: &EntropyArgs, seed: u64) {
    let n = g.num_vertices();
    let num_blocks = 5;
    let b = random_partition(n, num_blocks, seed);
    let opts = options(deg_corr, IndexBackend::Hash);
    let mut state = BlockState::new(g, b, num_blocks, &opts).unwrap();
    let mut rng = SmallRng::seed_from_u64(seed + 1);

    for _ in 0..60 {
        let v = rng.random_range(0..n);
        let nr = rng.random_range(0..num_blocks);
        let before = state.entropy(args).unwrap();
        let ds = state.virtual_move(v, nr, args).unwrap();
        state.move_vertex(v, nr).unwrap();
        let after = state.entropy(args).unwrap();
        assert_abs_diff_eq!(after - before, ds, epsilon = 1e-7);
        assert!(state.validate_aggregates());
    }
}

#[test]
fn four_cycle_move() {
    // 0 - 1 - 2 - 3 - 0, blocks A = {0, 1}, B = {2, 3}
    let g = Multigraph::from_edges(4, false, &[(0, 1), (1, 2), (2, 3), (3, 0)]);
    let mut state =
        BlockState::new(&g, vec![0, 0, 1, 1], 2, &BlockStateOptions::default()).unwrap();

    assert_eq!(state.mrs(0, 0), 1);
    assert_eq!(state.mrs(0, 1), 2);
    assert_eq!(state.mrs(1, 0), 2);
    assert_eq!(state.mrs(1, 1), 1);
    assert_eq!(state.mrp(0), 4);
    assert_eq!(state.wr(0), 2);

    let args = EntropyArgs::default();
    let before = state.entropy(&args).unwrap();
    let ds = state.virtual_move(1, 1, &args).unwrap();
    state.move_vertex(1, 1).unwrap();

    // 0-1 turns A-B, 1-2 turns B-B
    assert_eq!(state.mrs(0, 0), 0);
    assert_eq!(state.mrs(0, 1), 2);
    assert_eq!(state.mrs(1, 1), 2);
    assert_eq!(state.mrp(0), 2);
    assert_eq!(state.mrp(1), 6);
    assert_eq!((state.wr(0), state.wr(1)), (1, 3));
    assert_eq!(state.aggregates().get_me(0, 0), None);

    let after = state.entropy(&args).unwrap();
    assert_abs_diff_eq!(after - before, ds, epsilon = 1e-10);
}

#[test]
fn virtual_move_matches_sparse_entropy() {
    for &directed in &[false, true] {
        for &weighted in &[false, true] {
            let g = random_multigraph(30, 80, directed, weighted, 11);
            for &deg_corr in &[false, true] {
                check_virtual_moves(&g, deg_corr, &EntropyArgs::default(), 3);
                let args = EntropyArgs {
                    multigraph: false,
                    deg_entropy: false,
                    ..EntropyArgs::default()
                };
                check_virtual_moves(&g, deg_corr, &args, 5);
            }
        }
    }
}

#[test]
fn virtual_move_matches_description_length() {
    for &directed in &[false, true] {
        let g = random_multigraph(25, 70, directed, true, 17);
        for &kind in &[
            DegreeDlKind::Distributed,
            DegreeDlKind::Uniform,
            DegreeDlKind::Entropy,
        ] {
            let args = EntropyArgs {
                degree_dl_kind: kind,
                ..EntropyArgs::full_dl()
            };
            check_virtual_moves(&g, true, &args, 23);
        }
        check_virtual_moves(&g, false, &EntropyArgs::full_dl(), 29);
    }
}

#[test]
fn virtual_move_matches_dense_entropy() {
    for &directed in &[false, true] {
        let g = random_multigraph(20, 60, directed, true, 31);
        for &multigraph in &[true, false] {
            let args = EntropyArgs {
                dense: true,
                multigraph,
                ..EntropyArgs::default()
            };
            check_virtual_moves(&g, false, &args, 37);
        }
    }
}

#[test]
fn noop_move() -> anyhow::Result<()> {
    let g = random_multigraph(15, 40, false, true, 41);
    let b = random_partition(15, 3, 43);
    let mut state = BlockState::new(&g, b, 3, &BlockStateOptions::default())?;
    let snap = state.snapshot();

    for v in 0..15 {
        let r = state.block_of(v);
        assert_eq!(state.virtual_move(v, r, &EntropyArgs::full_dl())?, 0.0);
        assert_eq!(state.virtual_move_sparse(v, r)?, 0.0);
        state.move_vertex(v, r)?;
    }
    assert_eq!(state.snapshot(), snap);
    Ok(())
}

#[test]
fn cross_label_move_is_rejected() {
    let g = Multigraph::from_edges(3, false, &[(0, 1), (1, 2)]);
    let mut state = BlockState::new(&g, vec![0, 0, 1], 3, &BlockStateOptions::default())
        .unwrap()
        .with_constraints(vec![0, 1, 0], vec![0, 0, 0])
        .unwrap();

    let ds = state.virtual_move(0, 1, &EntropyArgs::default()).unwrap();
    assert!(ds.is_infinite() && ds > 0.0);

    let snap = state.snapshot();
    let err = state.move_vertex(0, 1).unwrap_err();
    assert_eq!(
        err,
        BlockStateError::CrossLabelMove {
            vertex: 0,
            from: 0,
            to: 1
        }
    );
    assert!(err.is_invalid_operation());
    assert_eq!(state.snapshot(), snap);

    // same label is fine
    state.move_vertex(0, 2).unwrap();
    assert_eq!(state.block_of(0), 2);
}

#[test]
fn invalid_block_is_rejected() {
    let g = Multigraph::from_edges(2, false, &[(0, 1)]);
    assert!(matches!(
        BlockState::new(&g, vec![0, 4], 2, &BlockStateOptions::default()),
        Err(BlockStateError::InvalidBlock { block: 4, .. })
    ));
    assert!(matches!(
        BlockState::new(&g, vec![0], 2, &BlockStateOptions::default()),
        Err(BlockStateError::SizeMismatch { .. })
    ));

    let mut state = BlockState::new(&g, vec![0, 1], 2, &BlockStateOptions::default()).unwrap();
    assert!(state.move_vertex(0, 2).is_err());
    assert!(state.virtual_move(0, 2, &EntropyArgs::default()).is_err());
}

#[test]
fn entry_points_reject_unknown_blocks() {
    let g = Multigraph::from_edges(3, false, &[(0, 1), (1, 2)]);
    let mut state =
        BlockState::new(&g, vec![0, 0, 1], 2, &options(false, IndexBackend::Dense)).unwrap();
    let snap = state.snapshot();
    let unknown = |r: Result<f64, BlockStateError>| {
        matches!(r, Err(BlockStateError::InvalidBlock { num_blocks: 2, .. }))
    };

    assert!(unknown(state.get_move_prob(0, 0, 2, 1.0, false)));
    assert!(unknown(state.get_move_prob(0, 7, 1, 1.0, true)));
    assert!(unknown(state.virtual_move_sparse(0, 5)));
    assert!(unknown(state.virtual_move_dense(0, 5, true)));
    assert!(unknown(state.get_delta_dl(0, 5)));
    assert_eq!(state.snapshot(), snap);
    assert!(state.validate_aggregates());
}

#[test]
fn double_add_and_remove_are_rejected() -> anyhow::Result<()> {
    let g = random_multigraph(10, 30, false, true, 59);
    let b = random_partition(10, 3, 61);
    let mut state = BlockState::new(&g, b, 3, &BlockStateOptions::default())?;
    state.enable_partition_stats();
    let snap = state.snapshot();
    let dl = state.get_partition_dl();

    assert_eq!(
        state.add_vertex(4, 2),
        Err(BlockStateError::VertexAttached { vertex: 4 })
    );
    assert!(matches!(
        state.add_vertices(&[1, 4], &[0, 0]),
        Err(BlockStateError::VertexAttached { .. })
    ));
    assert_eq!(state.snapshot(), snap);
    assert!(state.validate_aggregates());

    let r = state.block_of(4);
    state.remove_vertex(4)?;
    assert!(!state.is_attached(4));
    assert_eq!(
        state.remove_vertex(4),
        Err(BlockStateError::VertexDetached { vertex: 4 })
    );
    assert!(state.remove_vertices(&[3, 4]).is_err());
    assert!(state.is_attached(3));
    assert!(state.move_vertex(4, 0).is_err());
    assert!(state.virtual_move(4, 0, &EntropyArgs::default()).is_err());
    assert!(state.validate_aggregates());

    state.add_vertex(4, r)?;
    assert!(state.is_attached(4));
    assert_eq!(state.snapshot(), snap);
    assert_abs_diff_eq!(state.get_partition_dl(), dl, epsilon = 1e-10);
    assert!(state.validate_aggregates());
    Ok(())
}

#[test]
fn detached_neighbours_rejoin_in_any_order() -> anyhow::Result<()> {
    for &directed in &[false, true] {
        let g = random_multigraph(12, 50, directed, true, 89);
        let b = random_partition(12, 3, 97);
        let mut state = BlockState::new(&g, b.clone(), 3, &BlockStateOptions::default())?;
        state.init_mcmc(1.0, true);
        let snap = state.snapshot();

        for v in [2, 5, 7, 11] {
            state.remove_vertex(v)?;
            assert!(state.validate_aggregates());
        }
        for v in [7, 11, 2, 5] {
            state.add_vertex(v, b[v])?;
            assert!(state.validate_aggregates());
        }
        assert_eq!(state.snapshot(), snap);
    }
    Ok(())
}

#[test]
fn edges_dl_counts_blocks_across_labels() -> anyhow::Result<()> {
    // one edge, one block shared by two constraint labels
    let g = Multigraph::from_edges(2, false, &[(0, 1)]);
    let mut state = BlockState::new(&g, vec![0, 0], 1, &BlockStateOptions::default())?
        .with_constraints(vec![0], vec![0, 1])?;
    assert_eq!(state.num_nonempty_blocks(), 1);
    assert_eq!(state.get_edges_dl(), 0.0);

    // a second block: x(2) = 3 slots for one edge
    state.add_block(0);
    let args = EntropyArgs {
        edges_dl: true,
        ..EntropyArgs::default()
    };
    let before = state.entropy(&args)?;
    let ds = state.virtual_move(1, 1, &args)?;
    state.move_vertex(1, 1)?;
    assert_abs_diff_eq!(state.get_edges_dl(), lbinom(3.0, 1.0), epsilon = 1e-12);
    assert_abs_diff_eq!(state.entropy(&args)? - before, ds, epsilon = 1e-10);
    Ok(())
}

#[test]
fn dense_needs_non_degree_corrected_model() {
    let g = Multigraph::from_edges(3, true, &[(0, 1), (1, 2)]);
    let mut state = BlockState::new(&g, vec![0, 0, 1], 2, &BlockStateOptions::default()).unwrap();
    let args = EntropyArgs {
        dense: true,
        ..EntropyArgs::default()
    };
    let err = state.virtual_move(0, 1, &args).unwrap_err();
    assert_eq!(err, BlockStateError::DenseDegreeCorrected);
    assert!(err.is_unsupported_configuration());
    assert!(state.entropy(&args).is_err());
    assert!(state.dense_entropy(true).is_err());
}

#[test]
fn batch_size_mismatch() {
    let g = Multigraph::from_edges(3, false, &[(0, 1), (1, 2)]);
    let mut state = BlockState::new(&g, vec![0, 0, 1], 2, &BlockStateOptions::default()).unwrap();
    let snap = state.snapshot();
    assert!(matches!(
        state.move_vertices(&[0, 1], &[1]),
        Err(BlockStateError::SizeMismatch {
            vertices: 2,
            blocks: 1
        })
    ));
    assert!(state.set_partition(&[0, 1]).is_err());
    assert_eq!(state.snapshot(), snap);
}

#[test]
fn round_trip_restores_aggregates() -> anyhow::Result<()> {
    for &directed in &[false, true] {
        let g = random_multigraph(40, 120, directed, true, 47);
        let b = random_partition(40, 6, 53);
        let mut state = BlockState::new(&g, b.clone(), 6, &BlockStateOptions::default())?;
        let snap = state.snapshot();
        let mut rng = SmallRng::seed_from_u64(59);

        let mut history = Vec::new();
        for _ in 0..200 {
            let v = rng.random_range(0..40);
            history.push((v, state.block_of(v)));
            state.move_vertex(v, rng.random_range(0..6))?;
        }
        for (v, r) in history.into_iter().rev() {
            state.move_vertex(v, r)?;
        }
        assert_eq!(state.partition(), &b[..]);
        assert_eq!(state.snapshot(), snap);
    }
    Ok(())
}

#[test]
fn batch_matches_sequential() -> anyhow::Result<()> {
    for &directed in &[false, true] {
        let g = random_multigraph(30, 90, directed, true, 61);
        let b = random_partition(30, 4, 67);
        let opts = BlockStateOptions::default();
        let mut batch = BlockState::new(&g, b.clone(), 4, &opts)?;
        let mut seq = BlockState::new(&g, b, 4, &opts)?;
        let snap = batch.snapshot();

        let vs = vec![1, 4, 5, 9, 12, 4, 20, 21, 22];
        let rs = vec![3, 0, 0, 2, 1, 0, 3, 3, 2];

        // remove and re-add in place
        batch.remove_vertices(&vs)?;
        let old: Vec<usize> = vs.iter().map(|&v| batch.block_of(v)).collect();
        batch.add_vertices(&vs, &old)?;
        assert_eq!(batch.snapshot(), snap);

        // re-add into new blocks
        batch.remove_vertices(&vs)?;
        batch.add_vertices(&vs, &rs)?;
        for (&v, &r) in vs.iter().zip(&rs) {
            seq.move_vertex(v, r)?;
        }
        assert_eq!(batch.partition(), seq.partition());
        assert_eq!(batch.snapshot(), seq.snapshot());
        assert!(batch.validate_aggregates());
    }
    Ok(())
}

#[test]
fn single_remove_add() -> anyhow::Result<()> {
    let g = random_multigraph(12, 30, false, true, 71);
    let b = random_partition(12, 3, 73);
    let mut state = BlockState::new(&g, b, 3, &BlockStateOptions::default())?;
    let snap = state.snapshot();
    for v in 0..12 {
        let r = state.block_of(v);
        state.remove_vertex(v)?;
        assert_eq!(state.block_of(v), r);
        state.add_vertex(v, r)?;
        assert_eq!(state.snapshot(), snap);
    }
    Ok(())
}

#[test]
fn backends_agree() -> anyhow::Result<()> {
    for &directed in &[false, true] {
        let g = random_multigraph(30, 100, directed, true, 79);
        let b = random_partition(30, 5, 83);
        let mut hash = BlockState::new(&g, b.clone(), 5, &options(true, IndexBackend::Hash))?;
        let mut dense = BlockState::new(&g, b, 5, &options(true, IndexBackend::Dense))?;
        let mut rng = SmallRng::seed_from_u64(89);
        let args = EntropyArgs::full_dl();

        for step in 0..100 {
            if step == 50 {
                assert_eq!(hash.add_block(0), dense.add_block(0));
            }
            let v = rng.random_range(0..30);
            let nr = rng.random_range(0..hash.num_blocks());
            assert_eq!(hash.virtual_move(v, nr, &args)?, dense.virtual_move(v, nr, &args)?);
            hash.move_vertex(v, nr)?;
            dense.move_vertex(v, nr)?;
            assert_eq!(hash.snapshot(), dense.snapshot());
        }
    }
    Ok(())
}

#[test]
fn add_block_starts_empty() -> anyhow::Result<()> {
    let g = Multigraph::from_edges(4, false, &[(0, 1), (1, 2), (2, 3)]);
    let mut state = BlockState::new(&g, vec![0, 0, 1, 1], 2, &options(true, IndexBackend::Dense))?;
    state.enable_partition_stats();
    let r = state.add_block(0);
    assert_eq!(r, 2);
    assert_eq!(state.num_blocks(), 3);
    assert_eq!((state.wr(r), state.mrp(r), state.mrm(r)), (0, 0, 0));
    assert_eq!(state.num_nonempty_blocks(), 2);

    state.move_vertex(3, r)?;
    assert_eq!(state.mrs(1, 2), 1);
    assert_eq!(state.num_nonempty_blocks(), 3);
    assert!(state.validate_aggregates());
    Ok(())
}

#[test]
fn size_queries() -> anyhow::Result<()> {
    let g = Multigraph::from_edges(3, false, &[(0, 1)]).with_vertex_weights(vec![2, 3, 1]);
    let state = BlockState::new(&g, vec![0, 0, 1], 2, &BlockStateOptions::default())?;
    assert_eq!(state.node_weight(1), 3);
    assert_eq!(state.virtual_remove_size(0), 3);
    assert!(!state.is_last(0));
    assert!(state.is_last(2));
    Ok(())
}

#[test]
fn merge_folds_edges() -> anyhow::Result<()> {
    // 0 - 1, 0 - 2, 1 - 2, 0 - 0
    let mut g = Multigraph::from_edges(4, false, &[(0, 1), (0, 2), (1, 2), (0, 0), (2, 3)])
        .with_edge_weights(vec![1, 2, 3, 2, 1])
        .with_vertex_weights(vec![1, 2, 1, 1]);
    let deg = |g: &Multigraph, v| g.out_edges(v).map(|e| g.edge_weight(e.id)).sum::<i64>();
    let (k0, k1) = (deg(&g, 0), deg(&g, 1));

    let mut state = BlockState::new(&mut g, vec![0, 0, 1, 1], 2, &BlockStateOptions::default())?;
    state.enable_partition_stats();
    let snap = state.snapshot();

    state.merge_vertices(0, 1)?;
    assert_eq!(state.snapshot(), snap);
    assert!(state.validate_aggregates());
    assert_eq!(state.merge_map()[0], 1);
    assert_eq!(state.node_weight(1), 3);
    assert_eq!(state.node_weight(0), 0);
    drop(state);

    assert_eq!(g.out_edges(0).count(), 0);
    assert_eq!(deg(&g, 1), k0 + k1);
    // 1 - 2 absorbed 0 - 2
    let e12 = g
        .out_edges(1)
        .find(|e| e.target == 2)
        .map(|e| e.id)
        .unwrap();
    assert_eq!(g.edge_weight(e12), 5);
    Ok(())
}

#[test]
fn merge_across_blocks_and_directed() -> anyhow::Result<()> {
    let mut g = random_multigraph(20, 60, true, true, 97);
    let b = random_partition(20, 4, 101);
    let mut state = BlockState::new(&mut g, b, 4, &options(true, IndexBackend::Dense))?;
    let args = EntropyArgs::full_dl();

    for (u, v) in [(0, 1), (2, 3), (1, 3), (7, 12)] {
        state.merge_vertices(u, v)?;
        assert_eq!(state.block_of(u), state.block_of(v));
        assert!(state.validate_aggregates());
        assert_eq!(state.graph().incident_edges(u).count(), 0);
    }
    // the merged state keeps working
    let before = state.entropy(&args)?;
    let ds = state.virtual_move(3, 0, &args)?;
    state.move_vertex(3, 0)?;
    assert_abs_diff_eq!(state.entropy(&args)? - before, ds, epsilon = 1e-7);
    Ok(())
}

#[test]
fn merge_keeps_degree_sequence() -> anyhow::Result<()> {
    let mut g = Multigraph::from_edges(4, false, &[(0, 2), (1, 3), (1, 2)])
        .with_edge_weights(vec![1, 1, 1])
        .with_vertex_weights(vec![1, 1, 1, 1]);
    let opts = BlockStateOptions {
        degree_cache: DegreeCacheKind::Explicit,
        ..BlockStateOptions::default()
    };
    let mut state = BlockState::new(&mut g, vec![0, 0, 1, 1], 2, &opts)?;
    let before = state.sparse_entropy(false, true);
    state.merge_vertices(0, 1)?;
    // degree entropy still sees the two original degrees 1 and 2
    assert_abs_diff_eq!(state.sparse_entropy(false, true), before, epsilon = 1e-10);
    Ok(())
}

#[test]
fn merge_needs_weights() {
    let mut g = Multigraph::from_edges(3, false, &[(0, 1), (1, 2)]);
    let mut state =
        BlockState::new(&mut g, vec![0, 0, 1], 2, &BlockStateOptions::default()).unwrap();
    assert_eq!(state.merge_vertices(0, 1), Err(BlockStateError::UnweightedMerge));
}

#[test]
fn reverse_move_probability() {
    for &directed in &[false, true] {
        let g = random_multigraph(30, 100, directed, true, 103);
        let mut state = BlockState::new(
            &g,
            random_partition(30, 5, 107),
            5,
            &BlockStateOptions::default(),
        )
        .unwrap();
        let mut rng = SmallRng::seed_from_u64(109);

        for &c in &[0.1, 1.0, 10.0] {
            for _ in 0..40 {
                let v = rng.random_range(0..30);
                let r = state.block_of(v);
                let s = rng.random_range(0..5);
                let backward = state.get_move_prob(v, s, r, c, true).unwrap();
                state.move_vertex(v, s).unwrap();
                let forward = state.get_move_prob(v, s, r, c, false).unwrap();
                assert_abs_diff_eq!(backward, forward, epsilon = 1e-12);
                assert!(forward > 0.0 && forward <= 1.0);
            }
        }
    }
}

#[test]
fn move_probabilities_sum_to_one() {
    let g = random_multigraph(20, 60, false, true, 113);
    let b = random_partition(20, 4, 127);
    let mut state = BlockState::new(&g, b, 4, &BlockStateOptions::default()).unwrap();
    for v in 0..20 {
        let r = state.block_of(v);
        let total: f64 = (0..4)
            .map(|s| state.get_move_prob(v, r, s, 0.5, false).unwrap())
            .sum();
        assert_abs_diff_eq!(total, 1.0, epsilon = 1e-10);
    }
}

#[test]
fn sample_block_follows_structure() {
    // two triangles in two blocks, plus an isolated vertex
    let g = Multigraph::from_edges(7, false, &[(0, 1), (1, 2), (2, 0), (3, 4), (4, 5), (5, 3)]);
    let b = vec![0, 0, 0, 1, 1, 1, 2];
    let mut state = BlockState::new(&g, b, 3, &BlockStateOptions::default()).unwrap();
    let mut rng = SmallRng::seed_from_u64(131);
    state.init_mcmc(0.0, false);

    for _ in 0..50 {
        assert_eq!(state.sample_block(0, 0.0, &[0, 1, 2], &mut rng), 0);
        assert_eq!(state.sample_block(4, 0.0, &[0, 1, 2], &mut rng), 1);
        let s = state.sample_block(1, f64::INFINITY, &[1, 2], &mut rng);
        assert!(s == 1 || s == 2);
        // no neighbours: uniform over the list
        assert_eq!(state.sample_block(6, 0.0, &[2], &mut rng), 2);
    }
    assert_eq!(state.sample_block(6, 1.0, &[], &mut rng), 2);

    // edge groups follow moves
    state.move_vertex(2, 1).unwrap();
    let seen: Vec<usize> = (0..200)
        .map(|_| state.sample_block(0, 0.0, &[0], &mut rng))
        .collect();
    assert!(seen.contains(&1));
    assert!(seen.iter().all(|&s| s < 2));
}

#[test]
fn random_neighbour_of_isolated_vertex() {
    let g = Multigraph::from_edges(3, false, &[(0, 1)]);
    let state = BlockState::new(&g, vec![0, 0, 1], 2, &BlockStateOptions::default()).unwrap();
    let mut rng = SmallRng::seed_from_u64(137);
    assert_eq!(state.random_neighbour(2, &mut rng), 2);
    assert_eq!(state.random_neighbour(0, &mut rng), 1);
}

#[test]
fn init_mcmc_toggles_partition_stats() {
    let g = random_multigraph(10, 20, false, false, 139);
    let b = random_partition(10, 3, 149);
    let mut state = BlockState::new(&g, b, 3, &BlockStateOptions::default()).unwrap();
    assert!(!state.is_partition_stats_enabled());
    state.init_mcmc(1.0, true);
    assert!(state.is_partition_stats_enabled());
    assert_eq!(state.partition_stats().map(|ps| ps.num_edges()), Some(20));
    state.init_mcmc(f64::INFINITY, false);
    assert!(!state.is_partition_stats_enabled());
}

#[test]
fn incremental_stats_match_rebuilt() -> anyhow::Result<()> {
    let g = random_multigraph(30, 90, true, true, 151);
    let pclabel: Vec<usize> = (0..30).map(|v| v % 2).collect();
    let b = random_partition(30, 4, 157);
    let mut state = BlockState::new(&g, b, 4, &BlockStateOptions::default())?
        .with_constraints(vec![0; 4], pclabel.clone())?;
    state.enable_partition_stats();
    let mut rng = SmallRng::seed_from_u64(163);
    for _ in 0..100 {
        state.move_vertex(rng.random_range(0..30), rng.random_range(0..4))?;
    }

    let b = state.partition().to_vec();
    let mut fresh = BlockState::new(&g, b, 4, &BlockStateOptions::default())?
        .with_constraints(vec![0; 4], pclabel)?;
    assert_abs_diff_eq!(state.get_partition_dl(), fresh.get_partition_dl(), epsilon = 1e-8);
    for kind in [DegreeDlKind::Distributed, DegreeDlKind::Uniform, DegreeDlKind::Entropy] {
        assert_abs_diff_eq!(state.get_deg_dl(kind), fresh.get_deg_dl(kind), epsilon = 1e-8);
    }
    assert_abs_diff_eq!(state.get_edges_dl(), fresh.get_edges_dl(), epsilon = 1e-8);

    // one count of non-empty blocks even though both labels share blocks
    let b = state.num_nonempty_blocks() as f64;
    let e = g.edges().map(|e| g.edge_weight(e.id)).sum::<i64>() as f64;
    assert_abs_diff_eq!(state.get_edges_dl(), lbinom(b * b + e - 1.0, e), epsilon = 1e-8);
    Ok(())
}

#[test]
fn masked_degrees_drop_out_of_entropy() -> anyhow::Result<()> {
    let g = Multigraph::from_edges(3, true, &[(0, 1), (1, 2), (2, 0), (0, 2)]);
    let b = vec![0, 0, 1];
    let counted = BlockState::new(&g, b.clone(), 2, &BlockStateOptions::default())?;
    let ignored = BlockState::new(&g, b.clone(), 2, &BlockStateOptions::default())?
        .with_degree_mask(vec![DegreeMask::Ignored, DegreeMask::Counted, DegreeMask::Counted])?;
    // vertex 0 has in-degree 1 and out-degree 2: -lgamma(2) - lgamma(3)
    let diff = counted.sparse_entropy(false, true) - ignored.sparse_entropy(false, true);
    assert_abs_diff_eq!(diff, -(2.0_f64).ln(), epsilon = 1e-12);

    let mut masked = BlockState::new(&g, b, 2, &BlockStateOptions::default())?
        .with_degree_mask(vec![DegreeMask::InOnly; 3])?;
    let args = EntropyArgs::full_dl();
    let before = masked.entropy(&args)?;
    let ds = masked.virtual_move(1, 1, &args)?;
    masked.move_vertex(1, 1)?;
    assert_abs_diff_eq!(masked.entropy(&args)? - before, ds, epsilon = 1e-10);
    Ok(())
}

#[test]
fn parallel_entropy_counts_multiplicity() {
    // three parallel edges and a doubled self-loop
    let g = Multigraph::from_edges(2, false, &[(0, 1), (1, 0), (0, 1), (1, 1), (1, 1)]);
    let state = BlockState::new(&g, vec![0, 1], 2, &BlockStateOptions::default()).unwrap();
    let expected = (6.0_f64).ln() + (2.0_f64).ln();
    assert_abs_diff_eq!(state.get_parallel_entropy(), expected, epsilon = 1e-12);
}

#[test]
fn clones_are_independent() {
    let g = random_multigraph(15, 40, false, true, 167);
    let b = random_partition(15, 3, 173);
    let mut state = BlockState::new(&g, b, 3, &BlockStateOptions::default()).unwrap();
    state.init_mcmc(1.0, true);
    let snap = state.snapshot();
    let mut other = state.clone();
    other.move_vertex(0, (other.block_of(0) + 1) % 3).unwrap();
    assert_eq!(state.snapshot(), snap);
    assert_ne!(other.snapshot(), snap);
}
