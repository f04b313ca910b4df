//! Feature flags for optional functionality.

/// Feature flags for controlling optional selfheal behavior.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FeatureFlags {
    /// Record each analysis as a two-node pipeline graph.
    pub pipeline_graph: bool,
    /// Include the assembled prompt in analysis output.
    pub show_prompt: bool,
}
