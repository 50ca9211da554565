use std::collections::HashMap;

use anyhow::Result;

use crate::error::CoreError;

use super::{Graph, Node, NodeArg, NodeIndex};

/// Mutable view of a graph handed to rewrite rules.
///
/// Rules read through `graph()` and mutate only through the editor so every
/// structural change goes through the same checks.
pub struct GraphEditor<'g> {
    graph: &'g mut Graph,
}

impl<'g> GraphEditor<'g> {
    pub fn new(graph: &'g mut Graph) -> Self {
        Self { graph }
    }

    pub fn graph(&self) -> &Graph {
        self.graph
    }

    pub fn node(&self, index: NodeIndex) -> Option<&Node> {
        self.graph.node(index)
    }

    pub fn node_mut(&mut self, index: NodeIndex) -> Option<&mut Node> {
        self.graph.node_mut(index)
    }

    /// Apply a def substitution map to one node's inputs.
    pub fn replace_defs(
        &mut self,
        index: NodeIndex,
        replacements: &HashMap<String, NodeArg>,
    ) -> Result<bool> {
        let node = self
            .graph
            .node_mut(index)
            .ok_or_else(|| CoreError::invalid_graph(format!("no node at {}", index)))?;
        Ok(node.replace_defs(replacements))
    }

    /// Remove a node nothing reads from any more.
    pub fn remove_node(&mut self, index: NodeIndex) -> Result<Node> {
        let consumers = self.graph.output_nodes(index);
        if !consumers.is_empty() {
            return Err(CoreError::invalid_graph(format!(
                "node {} still has {} consumer(s)",
                index,
                consumers.len()
            ))
            .into());
        }
        self.graph.remove_node(index)
    }
}
