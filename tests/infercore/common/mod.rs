#![allow(dead_code)]

use anyhow::{anyhow, Result};
use infercore::{
    AllocatorInfo, CoreError, DType, ExecutionFrame, Graph, KernelRegistry, Node, NodeArg,
    NodeIndex, OpKernel, OpKernelBase, OpKernelContext, OpKernelInfo, Tensor, TensorOptions,
    TensorValue, CPU_EXECUTION_PROVIDER,
};

pub fn tensor<T>(data: Vec<T>, shape: &[usize]) -> Result<Tensor<T>> {
    Tensor::from_vec_with_opts(data, TensorOptions::with_shape(shape))
}

pub fn f32_value(data: Vec<f32>, shape: &[usize]) -> Result<TensorValue> {
    Ok(tensor(data, shape)?.into())
}

/// Build a node whose arguments all carry `dtype`.
pub fn op_node(
    graph: &Graph,
    op: &str,
    version: u32,
    inputs: &[&str],
    outputs: &[&str],
    dtype: DType,
) -> Node {
    let inputs = inputs.iter().map(|name| NodeArg::new(*name, dtype)).collect();
    let outputs = outputs.iter().map(|name| NodeArg::new(*name, dtype)).collect();
    graph.make_node(op, inputs, outputs).with_version(version)
}

pub fn add_op(
    graph: &mut Graph,
    op: &str,
    version: u32,
    inputs: &[&str],
    outputs: &[&str],
    dtype: DType,
) -> NodeIndex {
    let node = op_node(graph, op, version, inputs, outputs, dtype);
    graph.add_node(node)
}

/// `x -> op -> y` with `x` and `y` as graph input and output.
pub fn single_op_graph(op: &str, version: u32, dtype: DType) -> (Graph, NodeIndex) {
    let mut graph = Graph::new(format!("single_{}", op.to_lowercase()));
    graph.add_input(NodeArg::new("x", dtype));
    graph.add_output(NodeArg::new("y", dtype));
    let index = add_op(&mut graph, op, version, &["x"], &["y"], dtype);
    (graph, index)
}

/// Create the CPU kernel for `index` and run it once against `frame`.
pub fn run_node(graph: &Graph, index: NodeIndex, frame: &mut ExecutionFrame) -> Result<()> {
    let node = graph
        .node(index)
        .ok_or_else(|| anyhow!("missing node {}", index))?;
    let kernel =
        KernelRegistry::global().create_kernel(CPU_EXECUTION_PROVIDER, node, &AllocatorInfo::cpu())?;
    infercore::run_kernel(kernel.as_ref(), frame)
}

pub fn core_error(err: &anyhow::Error) -> Result<&CoreError> {
    err.downcast_ref::<CoreError>()
        .ok_or_else(|| anyhow!("expected a CoreError, got: {:#}", err))
}

pub fn assert_close(actual: &[f32], expected: &[f32]) -> Result<()> {
    if actual.len() != expected.len() {
        return Err(anyhow!(
            "length mismatch: actual {} expected {}",
            actual.len(),
            expected.len()
        ));
    }
    for (idx, (a, b)) in actual.iter().zip(expected.iter()).enumerate() {
        let diff = (a - b).abs();
        if diff > 1e-5 * a.abs().max(b.abs()).max(1.0) {
            return Err(anyhow!("index {}: {} vs {}", idx, a, b));
        }
    }
    Ok(())
}

/// Kernel that does nothing; used to observe which definition was selected.
pub struct NoopKernel {
    base: OpKernelBase,
}

impl OpKernel for NoopKernel {
    fn base(&self) -> &OpKernelBase {
        &self.base
    }

    fn compute(&self, _ctx: &mut OpKernelContext<'_>) -> Result<()> {
        Ok(())
    }
}

pub fn noop_factory(info: &OpKernelInfo<'_>) -> Result<Box<dyn OpKernel>> {
    Ok(Box::new(NoopKernel {
        base: OpKernelBase::new(info),
    }))
}
