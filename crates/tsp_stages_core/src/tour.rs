use serde::Serialize;

use crate::{
    Algorithm, DistanceTable,
    stage::{Stage, StageCursor},
};

/// Closed visiting order: first stop equals the last, every other point
/// appears exactly once.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Tour {
    stops: Vec<String>,
}

impl Tour {
    pub(crate) fn from_indices(table: &DistanceTable, path: &[usize]) -> Self {
        Self {
            stops: path.iter().map(|&v| table.name(v).to_string()).collect(),
        }
    }

    pub(crate) fn from_names(stops: Vec<String>) -> Self {
        Self { stops }
    }

    pub fn stops(&self) -> &[String] {
        &self.stops
    }

    pub fn len(&self) -> usize {
        self.stops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stops.is_empty()
    }

    pub fn is_closed(&self) -> bool {
        self.stops.len() >= 2 && self.stops.first() == self.stops.last()
    }

    pub fn start(&self) -> Option<&str> {
        self.stops.first().map(String::as_str)
    }
}

/// Everything one solver run produced. Built once, read-only afterwards.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TourResult {
    algorithm: Algorithm,
    distance: f64,
    complexity: u64,
    tour: Tour,
    stages: Vec<Stage>,
}

impl TourResult {
    pub(crate) fn new(
        algorithm: Algorithm,
        distance: f64,
        complexity: u64,
        tour: Tour,
        stages: Vec<Stage>,
    ) -> Self {
        Self {
            algorithm,
            distance,
            complexity,
            tour,
            stages,
        }
    }

    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    /// Sum of consecutive-pair distances along [`TourResult::tour`].
    pub fn distance(&self) -> f64 {
        self.distance
    }

    pub fn complexity(&self) -> u64 {
        self.complexity
    }

    pub fn tour(&self) -> &Tour {
        &self.tour
    }

    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    pub fn stage_count(&self) -> usize {
        self.stages.len()
    }

    pub fn stage(&self, index: usize) -> Option<&Stage> {
        self.stages.get(index)
    }

    pub fn cursor(&self) -> StageCursor<'_> {
        StageCursor::new(&self.stages)
    }

    pub fn to_json(&self) -> crate::Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn to_json_pretty(&self) -> crate::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::{Tour, TourResult};
    use crate::{
        Algorithm,
        stage::{Edge, Stage},
    };

    fn sample() -> TourResult {
        let stops = ["A", "B", "A"].iter().map(|s| s.to_string()).collect();
        let stage = Stage {
            index: 0,
            primary: vec![Edge::new("A", "B"), Edge::new("B", "A")],
            secondary: Vec::new(),
            nodes: vec!["A".to_string(), "B".to_string()],
        };
        TourResult::new(
            Algorithm::ShortTour,
            2.5,
            0,
            Tour::from_names(stops),
            vec![stage],
        )
    }

    #[test]
    fn tour_reports_closure_and_start() {
        let result = sample();
        assert!(result.tour().is_closed());
        assert_eq!(result.tour().start(), Some("A"));
        assert_eq!(result.tour().len(), 3);
        assert!(!Tour::default().is_closed());
    }

    #[test]
    fn stage_accessor_is_bounds_checked() {
        let result = sample();
        assert_eq!(result.stage_count(), 1);
        assert!(result.stage(0).is_some());
        assert!(result.stage(1).is_none());
        assert_eq!(result.cursor().count(), 1);
    }

    #[test]
    fn json_payload_has_expected_shape() {
        let json = sample().to_json().expect("json");
        let value: serde_json::Value = serde_json::from_str(&json).expect("parse back");

        assert_eq!(value["algorithm"], "short-tour");
        assert_eq!(value["distance"], 2.5);
        assert_eq!(value["complexity"], 0);
        assert_eq!(value["tour"], serde_json::json!(["A", "B", "A"]));
        assert_eq!(value["stages"][0]["index"], 0);
        assert_eq!(
            value["stages"][0]["primary"],
            serde_json::json!([["A", "B"], ["B", "A"]])
        );
        assert_eq!(value["stages"][0]["secondary"], serde_json::json!([]));
        assert_eq!(value["stages"][0]["nodes"], serde_json::json!(["A", "B"]));
    }
}
