use anyhow::Result;
use infercore::{
    AllocatorInfo, CoreError, DType, Graph, KernelDefBuilder, KernelRegistry, MemType, NodeArg,
    CPU_EXECUTION_PROVIDER, CUDA_EXECUTION_PROVIDER, OPEN_VERSION_END,
};

use crate::common;

/// Two `Abs` kernels covering versions 1..=5 and 6 onwards.
fn split_version_registry() -> Result<KernelRegistry> {
    let mut registry = KernelRegistry::new();
    registry.register(
        KernelDefBuilder::new("Abs")
            .version_range(1, 5)
            .type_constraint("T", &[DType::F32])
            .build(),
        common::noop_factory,
    )?;
    registry.register(
        KernelDefBuilder::new("Abs")
            .since_version(6)
            .type_constraint("T", &[DType::F32])
            .build(),
        common::noop_factory,
    )?;
    Ok(registry)
}

#[test]
fn selects_kernel_by_version_range() -> Result<()> {
    let registry = split_version_registry()?;
    let graph = Graph::new("versions");
    let allocator = AllocatorInfo::cpu();
    for (version, expected_start) in [(1, 1), (5, 1), (6, 6), (13, 6)] {
        let node = common::op_node(&graph, "Abs", version, &["x"], &["y"], DType::F32);
        let kernel = registry.create_kernel(CPU_EXECUTION_PROVIDER, &node, &allocator)?;
        assert_eq!(kernel.base().kernel_def().version_start, expected_start);
        assert_eq!(kernel.node().since_version, version);
    }
    Ok(())
}

#[test]
fn version_outside_every_range_has_no_kernel() -> Result<()> {
    let mut registry = KernelRegistry::new();
    registry.register(
        KernelDefBuilder::new("Abs").version_range(6, 12).build(),
        common::noop_factory,
    )?;
    let graph = Graph::new("gap");
    for version in [5, 13] {
        let node = common::op_node(&graph, "Abs", version, &["x"], &["y"], DType::F32);
        let err = registry
            .create_kernel(CPU_EXECUTION_PROVIDER, &node, &AllocatorInfo::cpu())
            .err()
            .expect("no kernel expected");
        assert!(matches!(
            common::core_error(&err)?,
            CoreError::NoCompatibleKernel { version: v, .. } if *v == version
        ));
    }
    Ok(())
}

#[test]
fn provider_and_domain_must_match() -> Result<()> {
    let registry = split_version_registry()?;
    let graph = Graph::new("providers");
    let node = common::op_node(&graph, "Abs", 6, &["x"], &["y"], DType::F32);
    assert!(registry
        .create_kernel(CUDA_EXECUTION_PROVIDER, &node, &AllocatorInfo::cpu())
        .is_err());

    let custom = node.clone().with_domain("com.example");
    assert!(registry
        .create_kernel(CPU_EXECUTION_PROVIDER, &custom, &AllocatorInfo::cpu())
        .is_err());

    let assigned = node.with_provider(CUDA_EXECUTION_PROVIDER);
    assert!(registry
        .create_kernel_for_node(&assigned, &AllocatorInfo::cpu())
        .is_err());
    Ok(())
}

#[test]
fn type_constraints_filter_candidates() -> Result<()> {
    let mut registry = KernelRegistry::new();
    registry.register(
        KernelDefBuilder::new("Abs")
            .since_version(6)
            .type_constraint("T", &[DType::F32])
            .build(),
        common::noop_factory,
    )?;
    registry.register(
        KernelDefBuilder::new("Abs")
            .since_version(6)
            .type_constraint("T", &[DType::I64, DType::I32])
            .build(),
        common::noop_factory,
    )?;
    let graph = Graph::new("types");
    let allocator = AllocatorInfo::cpu();

    let int_node = common::op_node(&graph, "Abs", 6, &["x"], &["y"], DType::I32);
    let kernel = registry.create_kernel(CPU_EXECUTION_PROVIDER, &int_node, &allocator)?;
    assert_eq!(
        kernel.base().kernel_def().type_constraints["T"],
        vec![DType::I32, DType::I64]
    );

    let f64_node = common::op_node(&graph, "Abs", 6, &["x"], &["y"], DType::F64);
    assert!(registry
        .create_kernel(CPU_EXECUTION_PROVIDER, &f64_node, &allocator)
        .is_err());

    let untyped = graph.make_node(
        "Abs",
        vec![NodeArg::untyped("x")],
        vec![NodeArg::untyped("y")],
    );
    let err = registry
        .create_kernel(CPU_EXECUTION_PROVIDER, &untyped.with_version(6), &allocator)
        .err()
        .expect("untyped args cannot satisfy a constraint");
    assert!(matches!(
        common::core_error(&err)?,
        CoreError::NoCompatibleKernel { .. }
    ));
    Ok(())
}

#[test]
fn mixed_argument_types_fail_the_constraint() -> Result<()> {
    let registry = KernelRegistry::global();
    let graph = Graph::new("mixed");
    let node = graph
        .make_node(
            "Abs",
            vec![NodeArg::new("x", DType::F32)],
            vec![NodeArg::new("y", DType::F64)],
        )
        .with_version(6);
    assert!(registry
        .create_kernel(CPU_EXECUTION_PROVIDER, &node, &AllocatorInfo::cpu())
        .is_err());
    Ok(())
}

#[test]
fn kernel_info_exposes_node_attributes() -> Result<()> {
    let registry = KernelRegistry::global();
    let mut graph = Graph::new("attrs");
    graph.add_input(NodeArg::new("x", DType::F32));
    let node = common::op_node(&graph, "Unsqueeze", 1, &["x"], &["y"], DType::F32)
        .with_attr("axes", infercore::AttrValue::Ints(vec![1]));
    let kernel = registry.create_kernel(CPU_EXECUTION_PROVIDER, &node, &AllocatorInfo::cpu())?;
    assert_eq!(kernel.node().get_attrs::<i64>("axes")?, vec![1]);
    assert!(kernel.base().kernel_def().may_alias(0, 0));
    Ok(())
}

#[test]
fn global_registry_lists_builtin_kernels() {
    let registry = KernelRegistry::global();
    let names = registry.registered_op_names();
    for op in ["Identity", "Unsqueeze", "Slice", "Abs", "Neg", "Sqrt", "Exp"] {
        assert!(names.contains(&op), "missing {}", op);
    }
    assert!(!registry.is_empty());

    let abs: Vec<_> = registry.kernel_defs("Abs").collect();
    assert!(abs.iter().all(|def| def.version_start == 6));
    assert!(abs.iter().all(|def| def.version_end == OPEN_VERSION_END));
    assert!(abs
        .iter()
        .any(|def| def.type_constraints["T"] == vec![DType::I8]));
    assert!(registry.kernel_defs("Conv").next().is_none());
}

#[test]
fn memory_types_default_when_unset() {
    let def = KernelDefBuilder::new("Shape")
        .output_memory_type(0, MemType::CpuOutput)
        .build();
    assert_eq!(def.input_memory_type(0), MemType::Default);
    assert_eq!(def.output_memory_type(0), MemType::CpuOutput);
    assert_eq!(def.output_memory_type(1), MemType::Default);
    assert_eq!(def.to_string(), "Shape v1+ on CPUExecutionProvider");
}
