use anyhow::Result;
use infercore::{
    unary_map, AllocatorInfo, CoreError, DType, ExecutionFrame, Executor, Graph, KernelRegistry,
    NodeArg, OptimizerConfig, RuleBasedOptimizer, Tensor, CPU_EXECUTION_PROVIDER,
};

use crate::common;

fn run_unary_f32(op: &str, data: Vec<f32>) -> Result<Vec<f32>> {
    let (graph, index) = common::single_op_graph(op, 6, DType::F32);
    let shape = [data.len()];
    let mut frame = ExecutionFrame::new(&graph)?;
    frame.feed("x", common::tensor(data, &shape)?)?;
    common::run_node(&graph, index, &mut frame)?;
    Ok(frame.fetch_tensor::<f32>("y")?.data.clone())
}

#[test]
fn float_unary_ops() -> Result<()> {
    let input = vec![-2.5f32, -0.5, 0.0, 1.5, 4.0];
    common::assert_close(&run_unary_f32("Abs", input.clone())?, &[2.5, 0.5, 0.0, 1.5, 4.0])?;
    common::assert_close(&run_unary_f32("Neg", input.clone())?, &[2.5, 0.5, -0.0, -1.5, -4.0])?;
    common::assert_close(&run_unary_f32("Floor", input.clone())?, &[-3.0, -1.0, 0.0, 1.0, 4.0])?;
    common::assert_close(&run_unary_f32("Ceil", input)?, &[-2.0, -0.0, 0.0, 2.0, 4.0])?;

    let positive = vec![0.25f32, 1.0, 4.0];
    common::assert_close(&run_unary_f32("Sqrt", positive.clone())?, &[0.5, 1.0, 2.0])?;
    common::assert_close(&run_unary_f32("Reciprocal", positive.clone())?, &[4.0, 1.0, 0.25])?;
    common::assert_close(
        &run_unary_f32("Log", positive)?,
        &[0.25f32.ln(), 0.0, 4.0f32.ln()],
    )?;
    common::assert_close(&run_unary_f32("Exp", vec![0.0, 1.0])?, &[1.0, std::f32::consts::E])?;
    Ok(())
}

#[test]
fn integer_abs_wraps_at_min() -> Result<()> {
    let (graph, index) = common::single_op_graph("Abs", 6, DType::I8);
    let mut frame = ExecutionFrame::new(&graph)?;
    frame.feed("x", common::tensor(vec![-5i8, 0, 7, i8::MIN], &[2, 2])?)?;
    common::run_node(&graph, index, &mut frame)?;
    let y = frame.fetch_tensor::<i8>("y")?;
    assert_eq!(y.shape(), &[2, 2]);
    assert_eq!(y.data, vec![5, 0, 7, i8::MIN]);
    Ok(())
}

#[test]
fn opset_before_six_has_no_kernel() -> Result<()> {
    let (graph, index) = common::single_op_graph("Abs", 5, DType::F32);
    let node = graph.node(index).expect("node");
    let err = KernelRegistry::global()
        .create_kernel(CPU_EXECUTION_PROVIDER, node, &AllocatorInfo::cpu())
        .err()
        .expect("Abs-5 is not registered");
    assert!(matches!(
        common::core_error(&err)?,
        CoreError::NoCompatibleKernel { version: 5, .. }
    ));
    Ok(())
}

#[test]
fn float_only_ops_reject_integers() {
    let (graph, index) = common::single_op_graph("Sqrt", 6, DType::I32);
    let node = graph.node(index).expect("node");
    assert!(KernelRegistry::global()
        .create_kernel(CPU_EXECUTION_PROVIDER, node, &AllocatorInfo::cpu())
        .is_err());
}

#[test]
fn unary_map_checks_shapes() -> Result<()> {
    let a = common::tensor(vec![1i32, 2, 3], &[3])?;
    let mut out = Tensor::<i32>::zeros(&[2]);
    assert!(unary_map(&a, &mut out, |v| v * 2).is_err());
    let mut out = Tensor::<i32>::zeros(&[3]);
    unary_map(&a, &mut out, |v| v * 2)?;
    assert_eq!(out.data, vec![2, 4, 6]);
    Ok(())
}

#[test]
fn executor_runs_an_optimized_chain() -> Result<()> {
    // x -> Identity -> Abs -> Identity -> Neg -> y
    let mut graph = Graph::new("chain");
    graph.add_input(NodeArg::new("x", DType::F32));
    graph.add_output(NodeArg::new("y", DType::F32));
    common::add_op(&mut graph, "Identity", 1, &["x"], &["x1"], DType::F32);
    common::add_op(&mut graph, "Abs", 6, &["x1"], &["a"], DType::F32);
    common::add_op(&mut graph, "Identity", 1, &["a"], &["a1"], DType::F32);
    common::add_op(&mut graph, "Neg", 6, &["a1"], &["y"], DType::F32);

    let optimizer = RuleBasedOptimizer::with_default_rules(OptimizerConfig::default())?;
    let stats = optimizer.optimize(&mut graph);
    assert_eq!(stats.applied, 2);
    assert_eq!(graph.node_count(), 2);
    graph.validate()?;

    let executor = Executor::new(&graph, KernelRegistry::global(), &AllocatorInfo::cpu())?;
    assert_eq!(executor.kernels().len(), 2);
    let mut frame = executor.make_frame()?;
    frame.feed("x", common::tensor(vec![-1.0f32, 2.0, -3.0], &[3])?)?;
    executor.run(&mut frame)?;
    assert_eq!(frame.fetch_tensor::<f32>("y")?.data, vec![-1.0, -2.0, -3.0]);
    Ok(())
}

#[test]
fn executor_orders_nodes_by_dependency() -> Result<()> {
    // Nodes inserted consumer first.
    let mut graph = Graph::new("reversed");
    graph.add_input(NodeArg::new("x", DType::F64));
    graph.add_output(NodeArg::new("y", DType::F64));
    common::add_op(&mut graph, "Exp", 6, &["s"], &["y"], DType::F64);
    common::add_op(&mut graph, "Sqrt", 6, &["x"], &["s"], DType::F64);

    let executor = Executor::new(&graph, KernelRegistry::global(), &AllocatorInfo::cpu())?;
    let order: Vec<&str> = executor
        .kernels()
        .iter()
        .map(|kernel| kernel.node().op_type.as_str())
        .collect();
    assert_eq!(order, vec!["Sqrt", "Exp"]);

    let mut frame = executor.make_frame()?;
    frame.feed("x", common::tensor(vec![0.0f64, 4.0], &[2])?)?;
    executor.run(&mut frame)?;
    let y = frame.fetch_tensor::<f64>("y")?;
    assert_eq!(y.data, vec![1.0, 2.0f64.exp()]);
    Ok(())
}

#[test]
fn executor_reports_unbindable_nodes() -> Result<()> {
    let (graph, _) = common::single_op_graph("Floor", 6, DType::U16);
    let err = Executor::new(&graph, KernelRegistry::global(), &AllocatorInfo::cpu())
        .err()
        .expect("no Floor kernel for u16");
    assert!(matches!(
        common::core_error(&err)?,
        CoreError::NoCompatibleKernel { .. }
    ));
    assert!(format!("{:#}", err).contains("binding"));
    Ok(())
}
