use std::collections::HashMap;

use anyhow::Result;

use crate::error::CoreError;
use crate::graph::{GraphEditor, Node, NodeIndex};

use super::RewriteRule;

/// Removes `Identity` nodes, pointing their consumers at the identity's input.
#[derive(Debug, Default, Clone, Copy)]
pub struct EliminateIdentity;

impl EliminateIdentity {
    fn failure(&self, node: &str, reason: impl Into<String>) -> anyhow::Error {
        CoreError::Rewrite {
            rule: self.name().to_string(),
            node: node.to_string(),
            reason: reason.into(),
        }
        .into()
    }
}

impl RewriteRule for EliminateIdentity {
    fn name(&self) -> &str {
        "EliminateIdentity"
    }

    fn op_types(&self) -> &[&str] {
        &["Identity"]
    }

    fn satisfy_condition(&self, node: &Node) -> bool {
        node.op_type == "Identity" && node.inputs.len() == 1 && node.outputs.len() == 1
    }

    fn apply(&self, editor: &mut GraphEditor<'_>, index: NodeIndex) -> Result<bool> {
        let graph = editor.graph();
        let node = graph
            .node(index)
            .ok_or_else(|| self.failure(&index.to_string(), "node does not exist"))?;
        if !self.satisfy_condition(node) {
            return Err(self.failure(&node.name, "not a single-input Identity"));
        }
        let input = node.inputs[0].clone();
        let output = node.outputs[0].name.clone();
        if graph.is_graph_output(&output) {
            return Err(self.failure(
                &node.name,
                format!("output {} is a graph output", output),
            ));
        }
        let consumers = graph.consumers_of(&output);

        // Nothing above touched the graph; from here on every step succeeds.
        let mut replacements = HashMap::new();
        replacements.insert(output, input);
        for consumer in consumers {
            editor.replace_defs(consumer, &replacements)?;
        }
        editor.remove_node(index)?;
        Ok(true)
    }
}
