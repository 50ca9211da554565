use std::collections::{HashMap, VecDeque};
use std::sync::mpsc;

use anyhow::{anyhow, Result};

use crate::error::CoreError;
use crate::graph::{describe_node, Graph, NodeIndex};
use crate::registry::KernelRegistry;

use super::{AllocatorInfo, ExecutionFrame, OpKernel, OpKernelContext};

/// Run one kernel synchronously against a frame.
pub fn run_kernel(kernel: &dyn OpKernel, frame: &mut ExecutionFrame) -> Result<()> {
    let mut ctx = OpKernelContext::new(frame, kernel)?;
    kernel.compute(&mut ctx)
}

/// Run one kernel through `compute_async` and wait for its completion
/// callback.
pub fn run_kernel_async(kernel: &dyn OpKernel, frame: &mut ExecutionFrame) -> Result<()> {
    let (tx, rx) = mpsc::channel();
    let mut ctx = OpKernelContext::new(frame, kernel)?;
    kernel.compute_async(
        &mut ctx,
        Box::new(move || {
            let _ = tx.send(());
        }),
    )?;
    rx.recv()
        .map_err(|_| anyhow!("{}: completion callback dropped without firing", kernel.node().name))
}

/// Kernels bound to a graph, in dependency order.
pub struct Executor {
    graph: Graph,
    kernels: Vec<Box<dyn OpKernel>>,
}

impl Executor {
    /// Create one kernel per node from `registry`, each on its assigned
    /// provider.
    pub fn new(graph: &Graph, registry: &KernelRegistry, allocator: &AllocatorInfo) -> Result<Self> {
        graph.validate()?;
        let order = topological_order(graph)?;
        let mut kernels = Vec::with_capacity(order.len());
        for index in order {
            let node = graph
                .node(index)
                .ok_or_else(|| CoreError::invalid_graph(format!("no node at {}", index)))?;
            let kernel = registry
                .create_kernel_for_node(node, allocator)
                .map_err(|err| err.context(format!("binding {}", describe_node(node))))?;
            kernels.push(kernel);
        }
        Ok(Self {
            graph: graph.clone(),
            kernels,
        })
    }

    /// Fresh frame for one run.
    pub fn make_frame(&self) -> Result<ExecutionFrame> {
        ExecutionFrame::new(&self.graph)
    }

    pub fn kernels(&self) -> &[Box<dyn OpKernel>] {
        &self.kernels
    }

    /// Execute every kernel once. The frame must hold every graph input.
    pub fn run(&self, frame: &mut ExecutionFrame) -> Result<()> {
        for kernel in &self.kernels {
            crate::trace!("run {}", describe_node(kernel.node()));
            if let Err(err) = run_kernel(kernel.as_ref(), frame) {
                crate::error!("{} failed: {}", kernel.node().name, err);
                return Err(err);
            }
        }
        Ok(())
    }
}

fn topological_order(graph: &Graph) -> Result<Vec<NodeIndex>> {
    let mut pending: HashMap<NodeIndex, usize> = HashMap::new();
    let mut ready = VecDeque::new();
    for node in graph.nodes() {
        let deps = graph.input_nodes(node.index).len();
        if deps == 0 {
            ready.push_back(node.index);
        } else {
            pending.insert(node.index, deps);
        }
    }
    let mut order = Vec::with_capacity(graph.node_count());
    while let Some(index) = ready.pop_front() {
        order.push(index);
        for consumer in graph.output_nodes(index) {
            if let Some(count) = pending.get_mut(&consumer) {
                *count -= 1;
                if *count == 0 {
                    pending.remove(&consumer);
                    ready.push_back(consumer);
                }
            }
        }
    }
    if !pending.is_empty() {
        return Err(CoreError::invalid_graph("graph contains a cycle").into());
    }
    Ok(order)
}
