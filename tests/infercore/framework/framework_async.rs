use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use anyhow::Result;
use infercore::{
    AllocatorInfo, CoreError, DType, ExecutionFrame, KernelRegistry, OpKernelContext,
    CPU_EXECUTION_PROVIDER,
};

use crate::common;

#[test]
fn default_compute_async_is_not_implemented() -> Result<()> {
    let (graph, index) = common::single_op_graph("Identity", 1, DType::F32);
    let node = graph.node(index).expect("node");
    let kernel = KernelRegistry::global().create_kernel(
        CPU_EXECUTION_PROVIDER,
        node,
        &AllocatorInfo::cpu(),
    )?;
    let mut frame = ExecutionFrame::new(&graph)?;
    frame.feed("x", common::tensor(vec![1.0f32], &[1])?)?;

    let err = infercore::run_kernel_async(kernel.as_ref(), &mut frame).unwrap_err();
    assert!(matches!(
        common::core_error(&err)?,
        CoreError::NotImplemented { op, what: "compute_async" } if op == "Identity"
    ));
    Ok(())
}

#[test]
fn async_compute_fires_done_exactly_once() -> Result<()> {
    let (graph, index) = common::single_op_graph("Abs", 6, DType::F32);
    let node = graph.node(index).expect("node");
    let kernel = KernelRegistry::global().create_kernel(
        CPU_EXECUTION_PROVIDER,
        node,
        &AllocatorInfo::cpu(),
    )?;
    let mut frame = ExecutionFrame::new(&graph)?;
    frame.feed("x", common::tensor(vec![-1.0f32, 2.0, -3.5], &[3])?)?;

    let calls = Arc::new(AtomicUsize::new(0));
    {
        let calls = Arc::clone(&calls);
        let mut ctx = OpKernelContext::new(&mut frame, kernel.as_ref())?;
        kernel.compute_async(
            &mut ctx,
            Box::new(move || {
                calls.fetch_add(1, Ordering::SeqCst);
            }),
        )?;
    }
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(frame.fetch_tensor::<f32>("y")?.data, vec![1.0, 2.0, 3.5]);
    Ok(())
}

#[test]
fn async_and_sync_paths_agree() -> Result<()> {
    let (graph, index) = common::single_op_graph("Sqrt", 6, DType::F64);
    let data: Vec<f64> = (0..4096).map(|i| i as f64 * 0.25).collect();

    let mut sync_frame = ExecutionFrame::new(&graph)?;
    sync_frame.feed("x", common::tensor(data.clone(), &[64, 64])?)?;
    common::run_node(&graph, index, &mut sync_frame)?;

    let node = graph.node(index).expect("node");
    let kernel = KernelRegistry::global().create_kernel_for_node(node, &AllocatorInfo::cpu())?;
    let mut async_frame = ExecutionFrame::new(&graph)?;
    async_frame.feed("x", common::tensor(data, &[64, 64])?)?;
    infercore::run_kernel_async(kernel.as_ref(), &mut async_frame)?;

    let expected = sync_frame.fetch_tensor::<f64>("y")?;
    let actual = async_frame.fetch_tensor::<f64>("y")?;
    assert_eq!(actual.shape(), &[64, 64]);
    assert_eq!(actual.data, expected.data);
    Ok(())
}

#[test]
fn async_failure_still_reports_through_result() -> Result<()> {
    let (graph, index) = common::single_op_graph("Neg", 6, DType::I32);
    let node = graph.node(index).expect("node");
    let kernel = KernelRegistry::global().create_kernel_for_node(node, &AllocatorInfo::cpu())?;
    let mut frame = ExecutionFrame::new(&graph)?;
    // Input fed with the wrong element type.
    frame.feed("x", common::tensor(vec![1.0f32], &[1])?)?;
    let err = infercore::run_kernel_async(kernel.as_ref(), &mut frame).unwrap_err();
    assert!(matches!(
        common::core_error(&err)?,
        CoreError::TypeMismatch { .. }
    ));
    Ok(())
}
