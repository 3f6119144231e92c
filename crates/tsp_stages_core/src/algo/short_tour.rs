use std::cmp::Ordering;

use crate::{
    Algorithm, DistanceTable, Result, TourResult,
    stage::{StageFrame, StageRecorder, path_edges},
    tour::Tour,
};

const TWO_OPT_IMPROVEMENT_EPSILON: f64 = 1e-9;

/// Greedy edge insertion followed by up to `passes` rounds of 2-opt.
///
/// Pairs are taken shortest first (equal lengths ordered by name) while both
/// ends still have a free slot and the edge links two separate fragments.
/// The resulting Hamiltonian path is closed into a tour that starts and ends
/// at the first point of `table`. Reports a single stage and zero complexity.
pub(crate) fn solve(table: &DistanceTable, passes: usize) -> Result<TourResult> {
    let n = table.len();
    let mut path = greedy_tour(table);
    let greedy_distance = table.path_length(&path);

    let (passes_run, swaps) = two_opt(table, &mut path, passes);
    let distance = table.path_length(&path);
    log::debug!(
        "short_tour.solve: n={n} greedy={greedy_distance:.3} distance={distance:.3} passes={passes_run} swaps={swaps}"
    );

    let mut recorder = StageRecorder::new(table.names());
    recorder.record(
        StageFrame::default()
            .with_primary(path_edges(&path))
            .with_nodes(path[..n].to_vec()),
    );

    Ok(TourResult::new(
        Algorithm::ShortTour,
        distance,
        0,
        Tour::from_indices(table, &path),
        recorder.finish(),
    ))
}

fn greedy_tour(table: &DistanceTable) -> Vec<usize> {
    let n = table.len();
    if n == 2 {
        return vec![0, 1, 0];
    }

    let mut pairs: Vec<(usize, usize, f64)> = table.pairs().collect();
    pairs.sort_by(|x, y| {
        x.2.total_cmp(&y.2)
            .then_with(|| pair_key(table, x.0, x.1).cmp(&pair_key(table, y.0, y.1)))
    });

    let mut fragments = Fragments::new(n);
    let mut degree = vec![0u8; n];
    let mut adjacency: Vec<Vec<usize>> = vec![Vec::with_capacity(2); n];
    let mut accepted = 0usize;

    for (a, b, _) in pairs {
        if accepted == n - 1 {
            break;
        }
        if degree[a] >= 2 || degree[b] >= 2 || !fragments.union(a, b) {
            continue;
        }
        degree[a] += 1;
        degree[b] += 1;
        adjacency[a].push(b);
        adjacency[b].push(a);
        accepted += 1;
    }

    // Close the Hamiltonian path between its two ends.
    let ends: Vec<usize> = (0..n).filter(|&v| degree[v] < 2).collect();
    if let [x, y] = ends[..] {
        adjacency[x].push(y);
        adjacency[y].push(x);
    }
    log::trace!("short_tour.greedy: n={n} accepted={accepted}");

    let first = match adjacency[0][..] {
        [a, b] if table.name_lt(b, a) => b,
        [a, ..] => a,
        [] => return vec![0, 0],
    };

    let mut tour = Vec::with_capacity(n + 1);
    tour.push(0);
    let (mut prev, mut current) = (0, first);
    while current != 0 {
        tour.push(current);
        let next = adjacency[current]
            .iter()
            .copied()
            .find(|&v| v != prev)
            .unwrap_or(0);
        prev = current;
        current = next;
    }
    tour.push(0);
    tour
}

fn pair_key(table: &DistanceTable, a: usize, b: usize) -> (&str, &str) {
    let (x, y) = (table.name(a), table.name(b));
    match x.cmp(y) {
        Ordering::Greater => (y, x),
        _ => (x, y),
    }
}

/// First-improvement 2-opt over a closed tour with both ends pinned.
/// Returns `(passes_run, swaps)`.
fn two_opt(table: &DistanceTable, tour: &mut [usize], passes: usize) -> (usize, usize) {
    let len = tour.len();
    if len < 5 {
        return (0, 0);
    }

    let mut passes_run = 0usize;
    let mut total_swaps = 0usize;
    for _ in 0..passes {
        passes_run += 1;
        let mut pass_swaps = 0usize;

        for i in 0..(len - 3) {
            for k in (i + 2)..(len - 1) {
                let (a, b) = (tour[i], tour[i + 1]);
                let (c, d) = (tour[k], tour[k + 1]);

                let cur_dist = table.distance(a, b) + table.distance(c, d);
                let new_dist = table.distance(a, c) + table.distance(b, d);

                if new_dist < cur_dist - TWO_OPT_IMPROVEMENT_EPSILON {
                    tour[(i + 1)..=k].reverse();
                    pass_swaps += 1;
                }
            }
        }

        total_swaps += pass_swaps;
        log::trace!("short_tour.two_opt: pass={passes_run} swaps={pass_swaps}");
        if pass_swaps == 0 {
            break;
        }
    }

    (passes_run, total_swaps)
}

/// Union-find over path fragments.
struct Fragments {
    parent: Vec<usize>,
}

impl Fragments {
    fn new(n: usize) -> Self {
        Self {
            parent: (0..n).collect(),
        }
    }

    fn find(&mut self, mut x: usize) -> usize {
        while self.parent[x] != x {
            self.parent[x] = self.parent[self.parent[x]];
            x = self.parent[x];
        }
        x
    }

    /// Joins the fragments of `a` and `b`; false when already joined.
    fn union(&mut self, a: usize, b: usize) -> bool {
        let (ra, rb) = (self.find(a), self.find(b));
        if ra == rb {
            return false;
        }
        self.parent[ra] = rb;
        true
    }
}

#[cfg(test)]
mod tests {
    use rand::{Rng, SeedableRng, rngs::StdRng};

    use super::{greedy_tour, solve, two_opt};
    use crate::{Algorithm, DistanceTable, Metric, Point};

    fn table(coords: &[(&str, f64, f64)]) -> DistanceTable {
        let points: Vec<Point> = coords
            .iter()
            .map(|&(name, lat, lng)| Point::new(name, lat, lng))
            .collect();
        DistanceTable::build(&points, Metric::Euclidean).expect("table")
    }

    fn assert_valid_tour(path: &[usize], n: usize) {
        assert_eq!(path.len(), n + 1);
        assert_eq!(path.first(), Some(&0));
        assert_eq!(path.last(), Some(&0));
        let mut inner = path[..n].to_vec();
        inner.sort_unstable();
        assert_eq!(inner, (0..n).collect::<Vec<_>>());
    }

    #[test]
    fn unit_square_is_traversed_in_order() {
        let table = table(&[
            ("A", 0.0, 0.0),
            ("B", 0.0, 1.0),
            ("C", 1.0, 1.0),
            ("D", 1.0, 0.0),
        ]);
        let result = solve(&table, 10).expect("solve");

        assert_eq!(result.algorithm(), Algorithm::ShortTour);
        assert_eq!(result.tour().stops(), ["A", "B", "C", "D", "A"]);
        assert!((result.distance() - 4.0).abs() < 1e-12);
        assert_eq!(result.complexity(), 0);
        assert_eq!(result.stages().len(), 1);
        assert_eq!(result.stages()[0].primary.len(), 4);
        assert_eq!(result.stages()[0].nodes, ["A", "B", "C", "D"]);
    }

    #[test]
    fn two_points_go_there_and_back() {
        let table = table(&[("P", 0.0, 0.0), ("Q", 3.0, 4.0)]);
        let result = solve(&table, 10).expect("solve");
        assert_eq!(result.tour().stops(), ["P", "Q", "P"]);
        assert!((result.distance() - 10.0).abs() < 1e-12);
    }

    #[test]
    fn greedy_starts_at_first_point_even_when_it_is_interior() {
        // Points on a line; A sits in the middle of the greedy path.
        let table = table(&[
            ("A", 0.0, 0.0),
            ("B", 0.0, 1.0),
            ("C", 0.0, -1.0),
            ("D", 0.0, 3.0),
        ]);
        let path = greedy_tour(&table);
        assert_valid_tour(&path, 4);
        assert_eq!(path, vec![0, 1, 3, 2, 0]);
    }

    #[test]
    fn two_opt_removes_a_crossing() {
        let table = table(&[
            ("A", 0.0, 0.0),
            ("B", 0.0, 1.0),
            ("C", 1.0, 1.0),
            ("D", 1.0, 0.0),
        ]);
        // A C B D A crosses itself.
        let mut path = vec![0, 2, 1, 3, 0];
        let before = table.path_length(&path);
        let (_, swaps) = two_opt(&table, &mut path, 10);

        assert!(swaps > 0);
        assert_valid_tour(&path, 4);
        assert!(table.path_length(&path) < before);
        assert!((table.path_length(&path) - 4.0).abs() < 1e-12);
    }

    #[test]
    fn zero_passes_keeps_the_greedy_tour() {
        let mut rng = StdRng::seed_from_u64(5);
        let coords: Vec<(String, f64, f64)> = (0..30)
            .map(|i| {
                (
                    format!("p{i:02}"),
                    rng.random_range(0.0..100.0),
                    rng.random_range(0.0..100.0),
                )
            })
            .collect();
        let refs: Vec<(&str, f64, f64)> = coords
            .iter()
            .map(|(name, lat, lng)| (name.as_str(), *lat, *lng))
            .collect();
        let table = table(&refs);

        let greedy = greedy_tour(&table);
        assert_valid_tour(&greedy, 30);

        let unrefined = solve(&table, 0).expect("solve");
        let refined = solve(&table, 10).expect("solve");
        assert!((unrefined.distance() - table.path_length(&greedy)).abs() < 1e-9);
        assert!(refined.distance() <= unrefined.distance() + 1e-9);
        assert!(refined.tour().is_closed());
        assert_eq!(refined.tour().start(), Some("p00"));
    }
}
