//! Stepwise travelling-salesman tours over named points.
//!
//! Each solver returns a [`TourResult`] holding the final tour together with
//! the ordered [`Stage`]s that led to it, so a viewer can replay the
//! construction one step at a time.

mod algo;
mod error;
mod geo;
mod graph;
mod io;
pub mod logging;
mod point;
mod solver;
mod stage;
mod tour;

pub use error::{Error, Result};
pub use geo::{metric::Metric, table::DistanceTable};
pub use io::{
    input::PointTable,
    options::{LogFormat, LogLevel, OutputFormat, RunOptions},
    output::{render, write_result},
};
pub use point::Point;
pub use solver::{Algorithm, DEFAULT_SHORT_TOUR_PASSES, TourRequest, solve, solve_by_tag};
pub use stage::{Edge, Stage, StageCursor};
pub use tour::{Tour, TourResult};
