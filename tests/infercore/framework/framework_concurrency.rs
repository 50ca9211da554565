use std::thread;

use anyhow::{anyhow, Result};
use infercore::{
    run_kernel, AllocatorInfo, DType, ExecutionFrame, Executor, Graph, KernelRegistry, NodeArg,
    CPU_EXECUTION_PROVIDER,
};

use crate::common;

const THREADS: usize = 8;

fn thread_input(worker: usize) -> Vec<f32> {
    (0..16).map(|i| -((worker * 100 + i) as f32)).collect()
}

#[test]
fn kernels_are_created_and_run_from_many_threads() -> Result<()> {
    let (graph, index) = common::single_op_graph("Abs", 6, DType::F32);
    let node = graph.node(index).ok_or_else(|| anyhow!("missing node"))?;

    thread::scope(|scope| {
        let handles: Vec<_> = (0..THREADS)
            .map(|worker| {
                let graph = &graph;
                scope.spawn(move || -> Result<Vec<f32>> {
                    let kernel = KernelRegistry::global().create_kernel(
                        CPU_EXECUTION_PROVIDER,
                        node,
                        &AllocatorInfo::cpu(),
                    )?;
                    let mut frame = ExecutionFrame::new(graph)?;
                    frame.feed("x", common::tensor(thread_input(worker), &[16])?)?;
                    run_kernel(kernel.as_ref(), &mut frame)?;
                    Ok(frame.fetch_tensor::<f32>("y")?.data.clone())
                })
            })
            .collect();
        for (worker, handle) in handles.into_iter().enumerate() {
            let out = handle
                .join()
                .map_err(|_| anyhow!("worker {} panicked", worker))??;
            let expected: Vec<f32> = thread_input(worker).iter().map(|v| v.abs()).collect();
            assert_eq!(out, expected);
        }
        Ok(())
    })
}

#[test]
fn one_executor_serves_concurrent_runs() -> Result<()> {
    // x -> Neg -> n -> Abs -> y
    let mut graph = Graph::new("shared");
    graph.add_input(NodeArg::new("x", DType::F32));
    graph.add_output(NodeArg::new("y", DType::F32));
    common::add_op(&mut graph, "Neg", 6, &["x"], &["n"], DType::F32);
    common::add_op(&mut graph, "Abs", 6, &["n"], &["y"], DType::F32);
    let executor = Executor::new(&graph, KernelRegistry::global(), &AllocatorInfo::cpu())?;

    thread::scope(|scope| {
        let handles: Vec<_> = (0..THREADS)
            .map(|worker| {
                let executor = &executor;
                scope.spawn(move || -> Result<Vec<f32>> {
                    let mut frame = executor.make_frame()?;
                    frame.feed("x", common::tensor(thread_input(worker), &[16])?)?;
                    executor.run(&mut frame)?;
                    Ok(frame.fetch_tensor::<f32>("y")?.data.clone())
                })
            })
            .collect();
        for (worker, handle) in handles.into_iter().enumerate() {
            let out = handle
                .join()
                .map_err(|_| anyhow!("worker {} panicked", worker))??;
            let expected: Vec<f32> = thread_input(worker).iter().map(|v| v.abs()).collect();
            assert_eq!(out, expected);
        }
        Ok(())
    })
}
