use std::collections::{HashMap, HashSet, VecDeque};

use anyhow::Result;

use crate::config::OptimizerConfig;
use crate::error::CoreError;
use crate::graph::{Graph, GraphEditor, NodeIndex};

use super::{EliminateIdentity, RewriteRule};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RewriteStats {
    /// Worklist entries examined.
    pub visited: usize,
    pub applied: usize,
    pub failed: usize,
}

/// Applies rewrite rules to a graph until nothing changes or the step budget
/// runs out.
///
/// The worklist starts with every node. After a successful rewrite the
/// rewritten node (if it survived) and its producers and consumers are queued
/// again, since the change may enable further rules there.
pub struct RuleBasedOptimizer {
    rules: Vec<Box<dyn RewriteRule>>,
    by_op: HashMap<String, Vec<usize>>,
    any_op: Vec<usize>,
    config: OptimizerConfig,
}

impl RuleBasedOptimizer {
    pub fn new(config: OptimizerConfig) -> Self {
        Self {
            rules: Vec::new(),
            by_op: HashMap::new(),
            any_op: Vec::new(),
            config,
        }
    }

    /// Optimizer with the built-in rules.
    pub fn with_default_rules(config: OptimizerConfig) -> Result<Self> {
        let mut optimizer = Self::new(config);
        optimizer.register(Box::new(EliminateIdentity))?;
        Ok(optimizer)
    }

    pub fn config(&self) -> &OptimizerConfig {
        &self.config
    }

    pub fn register(&mut self, rule: Box<dyn RewriteRule>) -> Result<()> {
        if self.rules.iter().any(|existing| existing.name() == rule.name()) {
            return Err(CoreError::invalid_argument(
                "RuleBasedOptimizer",
                format!("rule {} is already registered", rule.name()),
            )
            .into());
        }
        let id = self.rules.len();
        if rule.op_types().is_empty() {
            self.any_op.push(id);
        } else {
            for op in rule.op_types() {
                self.by_op.entry(op.to_string()).or_default().push(id);
            }
        }
        self.rules.push(rule);
        Ok(())
    }

    pub fn rule_names(&self) -> Vec<&str> {
        self.rules.iter().map(|rule| rule.name()).collect()
    }

    fn rules_for(&self, op_type: &str) -> Vec<usize> {
        let mut ids: Vec<usize> = self
            .by_op
            .get(op_type)
            .into_iter()
            .flatten()
            .chain(self.any_op.iter())
            .copied()
            .collect();
        ids.sort_unstable();
        ids
    }

    pub fn optimize(&self, graph: &mut Graph) -> RewriteStats {
        let mut stats = RewriteStats::default();
        if !self.config.enabled || self.rules.is_empty() {
            return stats;
        }

        let mut worklist: VecDeque<NodeIndex> = graph.node_indices().into();
        let mut queued: HashSet<NodeIndex> = worklist.iter().copied().collect();

        while let Some(index) = worklist.pop_front() {
            queued.remove(&index);
            if stats.applied >= self.config.max_steps {
                crate::warning!(
                    "rewrite budget of {} steps exhausted on graph {}",
                    self.config.max_steps,
                    graph.name
                );
                break;
            }
            let Some(node) = graph.node(index) else {
                continue;
            };
            stats.visited += 1;

            let candidates: Vec<usize> = self
                .rules_for(&node.op_type)
                .into_iter()
                .filter(|&id| self.rules[id].satisfy_condition(node))
                .collect();
            if candidates.is_empty() {
                continue;
            }
            let node_name = node.name.clone();
            let mut neighbors = graph.input_nodes(index);
            neighbors.extend(graph.output_nodes(index));

            for id in candidates {
                let rule = &self.rules[id];
                let mut editor = GraphEditor::new(graph);
                match rule.check_and_apply(&mut editor, index) {
                    Ok(true) => {
                        stats.applied += 1;
                        crate::trace!("{} rewrote {}", rule.name(), node_name);
                        for neighbor in neighbors.iter().copied().chain(std::iter::once(index)) {
                            if graph.node(neighbor).is_some() && queued.insert(neighbor) {
                                worklist.push_back(neighbor);
                            }
                        }
                        break;
                    }
                    Ok(false) => {}
                    Err(err) => {
                        stats.failed += 1;
                        crate::error!("{} failed on {}: {}", rule.name(), node_name, err);
                    }
                }
            }
        }

        crate::trace!(
            "optimized graph {}: visited {}, applied {}, failed {}",
            graph.name,
            stats.visited,
            stats.applied,
            stats.failed
        );
        stats
    }
}
