use crate::{
    Algorithm, DistanceTable, Point, TourResult,
    stage::{StageFrame, StageRecorder, path_edges},
    tour::Tour,
};

/// Greedy tour from `start`: always step to the closest unvisited point,
/// then return home. Equal distances go to the smaller name.
///
/// One stage per step, showing the path so far. Complexity counts every
/// candidate looked at.
pub(crate) fn solve(table: &DistanceTable, start: usize) -> TourResult {
    let n = table.len();
    let mut visited = vec![false; n];
    let mut path = Vec::with_capacity(n + 1);
    let mut complexity = 0u64;
    let mut recorder = StageRecorder::new(table.names());

    visited[start] = true;
    path.push(start);

    for _ in 1..n {
        let Some(&current) = path.last() else {
            break;
        };

        let mut best: Option<usize> = None;
        for v in (0..n).filter(|&v| !visited[v]) {
            complexity += 1;
            best = match best {
                Some(b) if !closer(table, current, v, b) => Some(b),
                _ => Some(v),
            };
        }
        let Some(next) = best else {
            break;
        };

        visited[next] = true;
        path.push(next);
        record_prefix(&mut recorder, &path, n);
    }

    path.push(start);
    record_prefix(&mut recorder, &path, n);

    let distance = table.path_length(&path);
    log::debug!(
        "nearest_neighbor.solve: n={n} start={} distance={distance:.3} complexity={complexity}",
        table.name(start)
    );

    TourResult::new(
        Algorithm::NearestNeighbor,
        distance,
        complexity,
        Tour::from_indices(table, &path),
        recorder.finish(),
    )
}

/// Tour of a lone point: `[p, p]`, zero distance, one stage with no edges.
pub(crate) fn solve_single(point: &Point) -> TourResult {
    let names = vec![point.name.clone()];
    let mut recorder = StageRecorder::new(&names);
    recorder.record(StageFrame::default().with_nodes(vec![0]));

    log::debug!("nearest_neighbor.solve: n=1 start={}", point.name);

    TourResult::new(
        Algorithm::NearestNeighbor,
        0.0,
        0,
        Tour::from_names(vec![point.name.clone(), point.name.clone()]),
        recorder.finish(),
    )
}

/// Whether `v` beats the current best `b` as the next stop after `from`.
fn closer(table: &DistanceTable, from: usize, v: usize, b: usize) -> bool {
    let (dv, db) = (table.distance(from, v), table.distance(from, b));
    dv < db || (dv == db && table.name_lt(v, b))
}

fn record_prefix(recorder: &mut StageRecorder<'_>, path: &[usize], n: usize) {
    let visited = &path[..path.len().min(n)];
    recorder.record(
        StageFrame::default()
            .with_primary(path_edges(path))
            .with_nodes(visited.to_vec()),
    );
}

#[cfg(test)]
mod tests {
    use super::{solve, solve_single};
    use crate::{Algorithm, DistanceTable, Metric, Point, stage::Edge};

    fn square() -> DistanceTable {
        let points = vec![
            Point::new("A", 0.0, 0.0),
            Point::new("B", 0.0, 1.0),
            Point::new("C", 1.0, 1.0),
            Point::new("D", 1.0, 0.0),
        ];
        DistanceTable::build(&points, Metric::Euclidean).expect("table")
    }

    #[test]
    fn unit_square_goes_around_the_edge() {
        let result = solve(&square(), 0);

        assert_eq!(result.algorithm(), Algorithm::NearestNeighbor);
        assert_eq!(result.tour().stops(), ["A", "B", "C", "D", "A"]);
        assert!((result.distance() - 4.0).abs() < 1e-12);
        assert_eq!(result.complexity(), 6);
    }

    #[test]
    fn stages_show_growing_prefix() {
        let result = solve(&square(), 0);
        let stages = result.stages();

        assert_eq!(stages.len(), 4);
        assert_eq!(stages[0].primary, vec![Edge::new("A", "B")]);
        assert_eq!(stages[0].nodes, ["A", "B"]);
        assert_eq!(stages[3].primary.len(), 4);
        assert_eq!(stages[3].primary[3], Edge::new("D", "A"));
        assert_eq!(stages[3].nodes, ["A", "B", "C", "D"]);
        assert!(stages.iter().all(|s| s.secondary.is_empty()));
        for (idx, stage) in stages.iter().enumerate() {
            assert_eq!(stage.index, idx);
        }
    }

    #[test]
    fn ties_go_to_the_smaller_name() {
        // Z and B are both at distance 1 from A.
        let points = vec![
            Point::new("A", 0.0, 0.0),
            Point::new("Z", 0.0, 1.0),
            Point::new("B", 0.0, -1.0),
        ];
        let table = DistanceTable::build(&points, Metric::Euclidean).expect("table");
        let result = solve(&table, 0);
        assert_eq!(result.tour().stops(), ["A", "B", "Z", "A"]);
    }

    #[test]
    fn start_point_is_respected() {
        let result = solve(&square(), 2);
        assert_eq!(result.tour().start(), Some("C"));
        assert!(result.tour().is_closed());
        assert_eq!(result.tour().len(), 5);
    }

    #[test]
    fn two_points_go_there_and_back() {
        let points = vec![Point::new("P", 0.0, 0.0), Point::new("Q", 3.0, 4.0)];
        let table = DistanceTable::build(&points, Metric::Euclidean).expect("table");
        let result = solve(&table, 0);

        assert_eq!(result.tour().stops(), ["P", "Q", "P"]);
        assert!((result.distance() - 10.0).abs() < 1e-12);
        assert_eq!(result.complexity(), 1);
    }

    #[test]
    fn single_point_is_a_degenerate_tour() {
        let result = solve_single(&Point::new("P", 1.0, 2.0));

        assert_eq!(result.tour().stops(), ["P", "P"]);
        assert_eq!(result.distance(), 0.0);
        assert_eq!(result.stages().len(), 1);
        assert!(result.stages()[0].primary.is_empty());
        assert_eq!(result.stages()[0].nodes, ["P"]);
    }
}
