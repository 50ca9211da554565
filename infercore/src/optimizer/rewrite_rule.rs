use anyhow::Result;

use crate::graph::{GraphEditor, Node, NodeIndex};

/// A local graph simplification.
///
/// `satisfy_condition` is a side-effect free gate; `apply` runs only when it
/// holds. `apply` returns whether the graph changed. On `Err` the graph must
/// be exactly as it was before the call.
pub trait RewriteRule: Send + Sync {
    fn name(&self) -> &str;

    /// Operator types the rule looks at. Empty means every node.
    fn op_types(&self) -> &[&str] {
        &[]
    }

    fn satisfy_condition(&self, node: &Node) -> bool;

    fn apply(&self, editor: &mut GraphEditor<'_>, node: NodeIndex) -> Result<bool>;

    /// Gate `apply` on `satisfy_condition`.
    fn check_and_apply(&self, editor: &mut GraphEditor<'_>, node: NodeIndex) -> Result<bool> {
        match editor.node(node) {
            Some(current) if self.satisfy_condition(current) => self.apply(editor, node),
            _ => Ok(false),
        }
    }
}
