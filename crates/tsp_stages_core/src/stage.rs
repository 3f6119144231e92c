use serde::{Serialize, Serializer};
use tsp_stages_derive::New;

/// Undirected edge between two named points. Serialized as `[from, to]`.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Edge {
    pub from: String,
    pub to: String,
}

impl Edge {
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
        }
    }
}

impl Serialize for Edge {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        (&self.from, &self.to).serialize(serializer)
    }
}

/// One snapshot of solver progress.
///
/// `primary` edges are the ones being built or emphasized at this step,
/// `secondary` edges give context (e.g. the spanning tree behind a matching),
/// `nodes` are the points highlighted at this step.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Stage {
    pub index: usize,
    pub primary: Vec<Edge>,
    pub secondary: Vec<Edge>,
    pub nodes: Vec<String>,
}

/// Index-based draft of a stage, resolved to names by [`StageRecorder`].
#[derive(Clone, Debug, Default, New)]
pub(crate) struct StageFrame {
    primary: Vec<(usize, usize)>,
    secondary: Vec<(usize, usize)>,
    nodes: Vec<usize>,
}

/// Collects stages in causal order with dense 0-based indices.
pub(crate) struct StageRecorder<'a> {
    names: &'a [String],
    stages: Vec<Stage>,
}

impl<'a> StageRecorder<'a> {
    pub(crate) fn new(names: &'a [String]) -> Self {
        Self {
            names,
            stages: Vec::new(),
        }
    }

    pub(crate) fn record(&mut self, frame: StageFrame) {
        let edges = |pairs: Vec<(usize, usize)>| -> Vec<Edge> {
            pairs
                .into_iter()
                .map(|(a, b)| Edge::new(self.names[a].as_str(), self.names[b].as_str()))
                .collect()
        };

        let stage = Stage {
            index: self.stages.len(),
            primary: edges(frame.primary),
            secondary: edges(frame.secondary),
            nodes: frame
                .nodes
                .into_iter()
                .map(|v| self.names[v].clone())
                .collect(),
        };

        log::trace!(
            "stage.record: index={} primary={} secondary={} nodes={}",
            stage.index,
            stage.primary.len(),
            stage.secondary.len(),
            stage.nodes.len()
        );
        self.stages.push(stage);
    }

    pub(crate) fn finish(self) -> Vec<Stage> {
        self.stages
    }
}

/// Consecutive `(a, b)` pairs along a path of point indices.
pub(crate) fn path_edges(path: &[usize]) -> Vec<(usize, usize)> {
    path.windows(2).map(|w| (w[0], w[1])).collect()
}

/// Walks a stage list front to back for stepwise playback.
///
/// The cursor only moves forward; [`StageCursor::reset`] rewinds to the first
/// stage.
#[derive(Clone, Debug)]
pub struct StageCursor<'a> {
    stages: &'a [Stage],
    position: usize,
}

impl<'a> StageCursor<'a> {
    pub fn new(stages: &'a [Stage]) -> Self {
        Self {
            stages,
            position: 0,
        }
    }

    /// Index of the stage the next call to `next` yields.
    pub fn position(&self) -> usize {
        self.position
    }

    pub fn remaining(&self) -> usize {
        self.stages.len() - self.position
    }

    pub fn is_finished(&self) -> bool {
        self.position >= self.stages.len()
    }

    pub fn peek(&self) -> Option<&'a Stage> {
        self.stages.get(self.position)
    }

    pub fn reset(&mut self) {
        self.position = 0;
    }
}

impl<'a> Iterator for StageCursor<'a> {
    type Item = &'a Stage;

    fn next(&mut self) -> Option<Self::Item> {
        let stage = self.stages.get(self.position)?;
        self.position += 1;
        Some(stage)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining(), Some(self.remaining()))
    }
}
