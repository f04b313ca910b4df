//! Optional pipeline graph recording.
//!
//! Each analysis can be recorded as a tiny graph: an `incident_input` node,
//! a `self_healing_output` node, and one edge between them, both nodes
//! carrying the text length. Recording is bookkeeping only and never
//! influences the analysis result.

use serde::Serialize;
use std::sync::Mutex;

/// Name of the node recorded for the incoming incident.
pub const INPUT_NODE: &str = "incident_input";

/// Name of the node recorded for the rendered report.
pub const OUTPUT_NODE: &str = "self_healing_output";

/// Sink for pipeline graph events.
pub trait PipelineRecorder: Send + Sync {
    /// Records a node for the run identified by `request_id`.
    fn record_node(&self, request_id: &str, node: &str, length: usize);

    /// Records a directed edge for the run identified by `request_id`.
    fn record_edge(&self, request_id: &str, from: &str, to: &str);
}

/// Recorder that drops everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopRecorder;

impl PipelineRecorder for NoopRecorder {
    fn record_node(&self, _request_id: &str, _node: &str, _length: usize) {}

    fn record_edge(&self, _request_id: &str, _from: &str, _to: &str) {}
}

/// A recorded node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GraphNode {
    /// Node name.
    pub name: String,
    /// Length in characters of the text the node stands for.
    pub length: usize,
}

/// A recorded edge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GraphEdge {
    /// Source node name.
    pub from: String,
    /// Target node name.
    pub to: String,
}

/// The graph recorded for one analysis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunGraph {
    /// Correlation id of the analysis.
    pub request_id: String,
    /// Nodes in recording order.
    pub nodes: Vec<GraphNode>,
    /// Edges in recording order.
    pub edges: Vec<GraphEdge>,
}

/// In-memory recorder keeping one [`RunGraph`] per request.
#[derive(Debug, Default)]
pub struct PipelineGraph {
    runs: Mutex<Vec<RunGraph>>,
}

impl PipelineGraph {
    /// Creates an empty graph recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a snapshot of every recorded run.
    #[must_use]
    pub fn runs(&self) -> Vec<RunGraph> {
        self.runs.lock().map(|runs| runs.clone()).unwrap_or_default()
    }

    /// Returns the graph recorded for `request_id`, if any.
    #[must_use]
    pub fn run(&self, request_id: &str) -> Option<RunGraph> {
        self.runs
            .lock()
            .ok()?
            .iter()
            .find(|run| run.request_id == request_id)
            .cloned()
    }

    /// Removes and returns the graph recorded for `request_id`.
    ///
    /// Long-running shells call this once a run has been reported so the
    /// recorder only holds in-flight analyses.
    pub fn take_run(&self, request_id: &str) -> Option<RunGraph> {
        let mut runs = self.runs.lock().ok()?;
        let index = runs.iter().position(|run| run.request_id == request_id)?;
        Some(runs.swap_remove(index))
    }

    fn with_run<F>(&self, request_id: &str, update: F)
    where
        F: FnOnce(&mut RunGraph),
    {
        let Ok(mut runs) = self.runs.lock() else {
            tracing::warn!("pipeline graph lock poisoned, dropping event");
            return;
        };
        if let Some(run) = runs.iter_mut().find(|run| run.request_id == request_id) {
            update(run);
        } else {
            let mut run = RunGraph {
                request_id: request_id.to_string(),
                nodes: Vec::new(),
                edges: Vec::new(),
            };
            update(&mut run);
            runs.push(run);
        }
    }
}

impl PipelineRecorder for PipelineGraph {
    fn record_node(&self, request_id: &str, node: &str, length: usize) {
        tracing::debug!(request_id, node, length, "pipeline graph node");
        self.with_run(request_id, |run| {
            run.nodes.push(GraphNode {
                name: node.to_string(),
                length,
            });
        });
    }

    fn record_edge(&self, request_id: &str, from: &str, to: &str) {
        tracing::debug!(request_id, from, to, "pipeline graph edge");
        self.with_run(request_id, |run| {
            run.edges.push(GraphEdge {
                from: from.to_string(),
                to: to.to_string(),
            });
        });
    }
}
