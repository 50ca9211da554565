use anyhow::Result;
use serde_json::Value;

use super::Graph;

/// JSON dump of a graph for diagnostics and fixtures.
pub struct GraphSerialize;

impl GraphSerialize {
    pub fn json(graph: &Graph) -> Result<Value> {
        Ok(serde_json::to_value(graph)?)
    }

    pub fn pretty(graph: &Graph) -> Result<String> {
        Ok(serde_json::to_string_pretty(graph)?)
    }
}

pub struct GraphDeserialize;

impl GraphDeserialize {
    /// Rebuild a graph and check that all of its references resolve.
    pub fn from_json(value: Value) -> Result<Graph> {
        let graph: Graph = serde_json::from_value(value)?;
        graph.validate()?;
        Ok(graph)
    }
}
