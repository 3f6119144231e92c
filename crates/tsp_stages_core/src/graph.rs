use crate::{DistanceTable, Error, Result};

#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct GraphEdge {
    pub(crate) a: usize,
    pub(crate) b: usize,
    pub(crate) weight: f64,
}

/// Undirected weighted multigraph over point indices of a [`DistanceTable`].
/// Parallel edges are kept as separate entries.
#[derive(Clone, Debug, Default)]
pub(crate) struct WeightedGraph {
    edges: Vec<GraphEdge>,
    /// Per node: `(neighbor, edge id)` in insertion order.
    adjacency: Vec<Vec<(usize, usize)>>,
}

impl WeightedGraph {
    pub(crate) fn with_nodes(n: usize) -> Self {
        Self {
            edges: Vec::new(),
            adjacency: vec![Vec::new(); n],
        }
    }

    pub(crate) fn node_count(&self) -> usize {
        self.adjacency.len()
    }

    pub(crate) fn add_edge(&mut self, a: usize, b: usize, weight: f64) -> usize {
        let id = self.edges.len();
        self.edges.push(GraphEdge { a, b, weight });
        self.adjacency[a].push((b, id));
        self.adjacency[b].push((a, id));
        id
    }

    pub(crate) fn edges(&self) -> &[GraphEdge] {
        &self.edges
    }

    pub(crate) fn edge_pairs(&self) -> Vec<(usize, usize)> {
        self.edges.iter().map(|e| (e.a, e.b)).collect()
    }

    pub(crate) fn degree(&self, v: usize) -> usize {
        self.adjacency[v].len()
    }

    pub(crate) fn total_weight(&self) -> f64 {
        self.edges.iter().map(|e| e.weight).sum()
    }

    pub(crate) fn odd_degree_vertices(&self) -> Vec<usize> {
        (0..self.node_count())
            .filter(|&v| !self.degree(v).is_multiple_of(2))
            .collect()
    }

    /// Prim's algorithm over the complete graph of `table`, grown from node 0.
    ///
    /// Equal weights are resolved by point name, both when picking the next
    /// node and when choosing which tree node it attaches to. Edges are stored
    /// in the order they join the tree.
    pub(crate) fn minimum_spanning_tree(table: &DistanceTable) -> Self {
        let n = table.len();
        let mut tree = Self::with_nodes(n);
        if n < 2 {
            return tree;
        }

        let mut in_tree = vec![false; n];
        let mut best: Vec<f64> = (0..n).map(|v| table.distance(0, v)).collect();
        let mut parent = vec![0usize; n];
        in_tree[0] = true;

        for _ in 1..n {
            let mut next: Option<usize> = None;
            for v in (0..n).filter(|&v| !in_tree[v]) {
                next = match next {
                    Some(u) if best[u] < best[v] || (best[u] == best[v] && table.name_lt(u, v)) => {
                        Some(u)
                    }
                    _ => Some(v),
                };
            }
            let Some(v) = next else {
                break;
            };

            in_tree[v] = true;
            tree.add_edge(parent[v], v, best[v]);

            for u in (0..n).filter(|&u| !in_tree[u]) {
                let d = table.distance(v, u);
                if d < best[u] || (d == best[u] && table.name_lt(v, parent[u])) {
                    best[u] = d;
                    parent[u] = v;
                }
            }
        }

        tree
    }

    /// Hierholzer's algorithm. Every node must have even degree and all
    /// edges must be reachable from `start`.
    ///
    /// Returns the closed walk `[start, .., start]` with `edges + 1` entries.
    pub(crate) fn eulerian_circuit(&self, start: usize) -> Result<Vec<usize>> {
        if let Some(v) = (0..self.node_count()).find(|&v| !self.degree(v).is_multiple_of(2)) {
            return Err(Error::invariant(format!(
                "eulerian circuit requires even degrees, node {v} has degree {}",
                self.degree(v)
            )));
        }
        if self.edges.is_empty() {
            return Ok(vec![start]);
        }

        let mut used = vec![false; self.edges.len()];
        let mut cursor = vec![0usize; self.node_count()];
        let mut stack = vec![start];
        let mut circuit = Vec::with_capacity(self.edges.len() + 1);

        while let Some(&current) = stack.last() {
            let adjacent = &self.adjacency[current];
            while cursor[current] < adjacent.len() && used[adjacent[cursor[current]].1] {
                cursor[current] += 1;
            }

            if let Some(&(next, edge_id)) = adjacent.get(cursor[current]) {
                used[edge_id] = true;
                stack.push(next);
            } else {
                circuit.push(current);
                stack.pop();
            }
        }
        circuit.reverse();

        if circuit.len() != self.edges.len() + 1 {
            return Err(Error::invariant(format!(
                "eulerian circuit covered {} of {} edges; graph is disconnected",
                circuit.len().saturating_sub(1),
                self.edges.len()
            )));
        }

        Ok(circuit)
    }
}
