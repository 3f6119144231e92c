use std::collections::HashSet;

use crate::{Error, Metric, Point, Result};

const MIN_TABLE_POINTS: usize = 2;

/// Dense symmetric distance matrix over a set of named points.
///
/// Rows follow the order the points were supplied in. The table is built once
/// per solver run and never mutated.
#[derive(Clone, Debug)]
pub struct DistanceTable {
    names: Vec<String>,
    metric: Metric,
    dist: Vec<f64>,
}

impl DistanceTable {
    pub fn build(points: &[Point], metric: Metric) -> Result<Self> {
        if points.len() < MIN_TABLE_POINTS {
            return Err(Error::invalid_input(format!(
                "distance table needs at least {MIN_TABLE_POINTS} points, got {}",
                points.len()
            )));
        }

        let mut seen = HashSet::with_capacity(points.len());
        for point in points {
            if !seen.insert(point.name.as_str()) {
                return Err(Error::invalid_input(format!(
                    "duplicate point name: {}",
                    point.name
                )));
            }
            if !metric.accepts(point) {
                return Err(Error::invalid_input(format!(
                    "point {} has invalid coordinates for metric {metric}: lat={} lng={}",
                    point.name, point.lat, point.lng
                )));
            }
        }

        let n = points.len();
        let mut dist = vec![0.0; n * n];
        for i in 0..n {
            for j in (i + 1)..n {
                let d = metric.distance(&points[i], &points[j]);
                dist[i * n + j] = d;
                dist[j * n + i] = d;
            }
        }

        log::debug!(
            "distance_table: built n={} pairs={} metric={metric}",
            n,
            n * (n - 1) / 2
        );

        Ok(Self {
            names: points.iter().map(|p| p.name.clone()).collect(),
            metric,
            dist,
        })
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn metric(&self) -> Metric {
        self.metric
    }

    pub fn name(&self, idx: usize) -> &str {
        &self.names[idx]
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| n == name)
    }

    #[inline]
    pub fn distance(&self, a: usize, b: usize) -> f64 {
        self.dist[a * self.len() + b]
    }

    pub fn distance_by_name(&self, a: &str, b: &str) -> Option<f64> {
        Some(self.distance(self.index_of(a)?, self.index_of(b)?))
    }

    /// All unordered pairs `(i, j, d)` with `i < j`.
    pub fn pairs(&self) -> impl Iterator<Item = (usize, usize, f64)> + '_ {
        let n = self.len();
        (0..n).flat_map(move |i| ((i + 1)..n).map(move |j| (i, j, self.distance(i, j))))
    }

    /// Sum of consecutive-pair distances along `path`.
    pub fn path_length(&self, path: &[usize]) -> f64 {
        path.windows(2).map(|w| self.distance(w[0], w[1])).sum()
    }

    /// Orders `a` before `b` by name; used to break distance ties.
    pub(crate) fn name_lt(&self, a: usize, b: usize) -> bool {
        self.names[a] < self.names[b]
    }
}

#[cfg(test)]
mod tests {
    use super::DistanceTable;
    use crate::{Error, Metric, Point};

    fn square() -> Vec<Point> {
        vec![
            Point::new("A", 0.0, 0.0),
            Point::new("B", 0.0, 1.0),
            Point::new("C", 1.0, 1.0),
            Point::new("D", 1.0, 0.0),
        ]
    }

    #[test]
    fn build_rejects_fewer_than_two_points() {
        let err = DistanceTable::build(&[Point::new("A", 0.0, 0.0)], Metric::Haversine)
            .expect_err("single point should fail");
        assert!(matches!(err, Error::InvalidInput(_)));
        assert!(matches!(
            DistanceTable::build(&[], Metric::Haversine),
            Err(Error::InvalidInput(_))
        ));
    }

    #[test]
    fn build_rejects_non_finite_coordinates() {
        let points = vec![Point::new("A", 0.0, 0.0), Point::new("B", f64::NAN, 1.0)];
        let err = DistanceTable::build(&points, Metric::Euclidean).expect_err("nan should fail");
        assert!(err.to_string().contains("point B has invalid coordinates"));
    }

    #[test]
    fn build_rejects_out_of_range_geographic_coordinates() {
        let points = vec![Point::new("A", 0.0, 0.0), Point::new("B", 95.0, 1.0)];
        assert!(DistanceTable::build(&points, Metric::Haversine).is_err());
        assert!(DistanceTable::build(&points, Metric::Euclidean).is_ok());
    }

    #[test]
    fn build_rejects_duplicate_names() {
        let points = vec![Point::new("A", 0.0, 0.0), Point::new("A", 1.0, 1.0)];
        let err = DistanceTable::build(&points, Metric::Euclidean).expect_err("duplicate");
        assert!(err.to_string().contains("duplicate point name: A"));
    }

    #[test]
    fn distances_are_symmetric_with_zero_diagonal() {
        let table = DistanceTable::build(&square(), Metric::Haversine).expect("table");
        for i in 0..table.len() {
            assert_eq!(table.distance(i, i), 0.0);
            for j in 0..table.len() {
                assert_eq!(table.distance(i, j), table.distance(j, i));
                if i != j {
                    assert!(table.distance(i, j) > 0.0);
                }
            }
        }
    }

    #[test]
    fn pairs_cover_each_unordered_pair_once() {
        let table = DistanceTable::build(&square(), Metric::Euclidean).expect("table");
        let pairs: Vec<(usize, usize, f64)> = table.pairs().collect();
        assert_eq!(pairs.len(), 6);
        assert!(pairs.iter().all(|(i, j, _)| i < j));
        let diagonal = pairs
            .iter()
            .find(|(i, j, _)| (*i, *j) == (0, 2))
            .expect("A-C pair");
        assert!((diagonal.2 - 2f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn lookups_by_name_match_index_lookups() {
        let table = DistanceTable::build(&square(), Metric::Euclidean).expect("table");
        assert_eq!(table.index_of("C"), Some(2));
        assert_eq!(table.distance_by_name("A", "B"), Some(1.0));
        assert_eq!(table.distance_by_name("A", "Z"), None);
        assert!((table.path_length(&[0, 1, 2, 3, 0]) - 4.0).abs() < 1e-12);
    }

    #[test]
    fn triangle_inequality_holds_for_geographic_points() {
        let points = vec![
            Point::new("Paris", 48.8566, 2.3522),
            Point::new("Berlin", 52.52, 13.405),
            Point::new("Madrid", 40.4168, -3.7038),
            Point::new("Rome", 41.9028, 12.4964),
        ];
        let table = DistanceTable::build(&points, Metric::Haversine).expect("table");
        let n = table.len();
        for a in 0..n {
            for b in 0..n {
                for c in 0..n {
                    assert!(
                        table.distance(a, c) <= table.distance(a, b) + table.distance(b, c) + 1e-9
                    );
                }
            }
        }
    }
}
