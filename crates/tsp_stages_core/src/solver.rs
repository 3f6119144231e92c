use serde::Serialize;
use tsp_stages_derive::{CliValue, New};

use crate::{
    DistanceTable, Error, Metric, Point, Result, TourResult,
    algo::{christofides, nearest_neighbor, short_tour},
};

pub const DEFAULT_SHORT_TOUR_PASSES: usize = 10;

/// Tour construction strategy. Parses from its kebab-case name or the short
/// tags `nn`, `ca` and `cc`.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, CliValue)]
#[serde(rename_all = "kebab-case")]
#[cli_value(option = "algorithm", error = "unsupported_algorithm")]
pub enum Algorithm {
    #[default]
    #[cli(alias = "nn", alias = "nearest")]
    NearestNeighbor,
    #[cli(alias = "ca")]
    Christofides,
    #[cli(alias = "cc", alias = "concorde", alias = "greedy")]
    ShortTour,
}

impl Algorithm {
    pub const ALL: [Self; 3] = [Self::NearestNeighbor, Self::Christofides, Self::ShortTour];

    /// Two-letter tag shown next to playback controls.
    pub fn short_tag(self) -> &'static str {
        match self {
            Self::NearestNeighbor => "NN",
            Self::Christofides => "CA",
            Self::ShortTour => "CC",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Self::NearestNeighbor => "Nearest Neighbor",
            Self::Christofides => "Christofides",
            Self::ShortTour => "Short Tour",
        }
    }

    pub fn summary(self) -> &'static str {
        match self {
            Self::NearestNeighbor => {
                "Starts at one point and keeps moving to the closest point not yet visited, \
                 returning to the start once every point has been seen."
            }
            Self::Christofides => {
                "Builds a minimum spanning tree, pairs its odd-degree points with a \
                 minimum-weight perfect matching, walks the merged graph as an Eulerian \
                 circuit and skips repeated points. Never worse than 1.5x the optimum."
            }
            Self::ShortTour => {
                "Links the shortest available pairs into one path, closes it into a tour \
                 and polishes the result with 2-opt moves."
            }
        }
    }
}

/// One solver invocation.
#[derive(Clone, Debug, New)]
pub struct TourRequest {
    pub algorithm: Algorithm,
    pub metric: Metric,
    /// Starting point for nearest neighbor. `None` means the first point.
    pub start: Option<String>,
    /// 2-opt passes for the short tour.
    pub short_tour_passes: usize,
}

impl Default for TourRequest {
    fn default() -> Self {
        Self::new(Algorithm::default(), Metric::default(), DEFAULT_SHORT_TOUR_PASSES)
    }
}

/// Runs `request.algorithm` over `points`. The distance table is built once
/// here and handed to the chosen solver.
pub fn solve(points: &[Point], request: &TourRequest) -> Result<TourResult> {
    log::info!(
        "solver.start: algorithm={} metric={} points={}",
        request.algorithm,
        request.metric,
        points.len()
    );

    let result = match request.algorithm {
        Algorithm::NearestNeighbor => solve_nearest_neighbor(points, request)?,
        Algorithm::Christofides => {
            christofides::solve(&DistanceTable::build(points, request.metric)?)?
        }
        Algorithm::ShortTour => short_tour::solve(
            &DistanceTable::build(points, request.metric)?,
            request.short_tour_passes,
        )?,
    };

    log::info!(
        "solver.done: algorithm={} distance={:.3} complexity={} stages={}",
        result.algorithm(),
        result.distance(),
        result.complexity(),
        result.stage_count()
    );
    Ok(result)
}

/// Like [`solve`], with the algorithm given by tag. Unknown tags fail with
/// [`Error::UnsupportedAlgorithm`].
pub fn solve_by_tag(tag: &str, points: &[Point], request: &TourRequest) -> Result<TourResult> {
    let algorithm = Algorithm::parse(tag)?;
    solve(points, &request.clone().with_algorithm(algorithm))
}

fn solve_nearest_neighbor(points: &[Point], request: &TourRequest) -> Result<TourResult> {
    let start_name = request.start.as_deref().map(str::trim);

    match points {
        [] => Err(Error::empty_input("nearest neighbor needs at least one point")),
        [single] => {
            if let Some(name) = start_name
                && name != single.name
            {
                return Err(unknown_start(name));
            }
            if !request.metric.accepts(single) {
                return Err(Error::invalid_input(format!(
                    "point {} has invalid coordinates for metric {}",
                    single.name, request.metric
                )));
            }
            Ok(nearest_neighbor::solve_single(single))
        }
        _ => {
            let table = DistanceTable::build(points, request.metric)?;
            let start = match start_name {
                Some(name) => table.index_of(name).ok_or_else(|| unknown_start(name))?,
                None => 0,
            };
            Ok(nearest_neighbor::solve(&table, start))
        }
    }
}

fn unknown_start(name: &str) -> Error {
    Error::invalid_input(format!("unknown start point: {name}"))
}
