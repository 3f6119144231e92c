use crate::{
    Algorithm, DistanceTable, Error, Result, TourResult,
    algo::matching,
    graph::WeightedGraph,
    stage::{StageFrame, StageRecorder, path_edges},
    tour::Tour,
};

/// Christofides' 3/2-approximation, recorded in five stages:
///
/// 0. minimum spanning tree
/// 1. odd-degree vertices of the tree
/// 2. minimum-weight perfect matching on those vertices
/// 3. tree and matching merged into one multigraph
/// 4. Eulerian circuit shortcut into the final tour
///
/// The tour starts and ends at the first point of `table`.
pub(crate) fn solve(table: &DistanceTable) -> Result<TourResult> {
    let n = table.len();
    let mut recorder = StageRecorder::new(table.names());

    let mst = WeightedGraph::minimum_spanning_tree(table);
    let mst_edges = mst.edge_pairs();
    log::debug!(
        "christofides.mst: n={n} edges={} weight={:.3}",
        mst_edges.len(),
        mst.total_weight()
    );
    recorder.record(StageFrame::default().with_secondary(mst_edges.clone()));

    let odd = mst.odd_degree_vertices();
    if !odd.len().is_multiple_of(2) {
        return Err(Error::invariant(format!(
            "spanning tree has {} odd-degree vertices",
            odd.len()
        )));
    }
    log::debug!("christofides.odd: count={}", odd.len());
    recorder.record(
        StageFrame::default()
            .with_secondary(mst_edges.clone())
            .with_nodes(odd.clone()),
    );

    let matching: Vec<(usize, usize)> =
        matching::min_weight_perfect_matching(odd.len(), |i, j| table.distance(odd[i], odd[j]))?
            .into_iter()
            .map(|(i, j)| (odd[i], odd[j]))
            .collect();
    log::debug!("christofides.matching: pairs={}", matching.len());
    recorder.record(StageFrame::new(matching.clone(), mst_edges, Vec::new()));

    let mut merged = mst;
    for &(a, b) in &matching {
        merged.add_edge(a, b, table.distance(a, b));
    }
    log::debug!("christofides.merge: edges={}", merged.edges().len());
    recorder.record(StageFrame::default().with_primary(merged.edge_pairs()));

    let circuit = merged.eulerian_circuit(0)?;
    let path = shortcut(&circuit, n);
    recorder.record(
        StageFrame::default()
            .with_secondary(path_edges(&path))
            .with_nodes(path[..n].to_vec()),
    );

    let complexity = complexity(n, odd.len(), matching.len(), merged.edges().len());
    let distance = table.path_length(&path);
    log::debug!(
        "christofides.solve: n={n} circuit={} distance={distance:.3} complexity={complexity}",
        circuit.len()
    );

    Ok(TourResult::new(
        Algorithm::Christofides,
        distance,
        complexity,
        Tour::from_indices(table, &path),
        recorder.finish(),
    ))
}

/// Keeps the first visit of every point and closes back to the start.
fn shortcut(circuit: &[usize], n: usize) -> Vec<usize> {
    let mut seen = vec![false; n];
    let mut path = Vec::with_capacity(n + 1);
    for &v in circuit {
        if !seen[v] {
            seen[v] = true;
            path.push(v);
        }
    }
    if let Some(&start) = path.first() {
        path.push(start);
    }
    path
}

/// Cost estimate summed over the five phases: `⌊E ln E⌋` for the spanning
/// tree over all `E` pairs, `n` per odd vertex, the odd subgraph's pairs,
/// `k³` for the matching, one per matched pair, and `m²` for the circuit
/// over `m` merged edges.
fn complexity(n: usize, odd: usize, matched: usize, merged: usize) -> u64 {
    let (n, k, matched, m) = (n as u64, odd as u64, matched as u64, merged as u64);
    let pairs = n * n.saturating_sub(1) / 2;
    let mst = if pairs > 1 {
        (pairs as f64 * (pairs as f64).ln()).floor() as u64
    } else {
        0
    };

    mst.saturating_add(n.saturating_mul(k))
        .saturating_add(k * k.saturating_sub(1) / 2)
        .saturating_add(k.saturating_pow(3))
        .saturating_add(matched)
        .saturating_add(m.saturating_mul(m))
}
