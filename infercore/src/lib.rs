pub mod logging;

mod config;
mod error;
mod framework;
mod graph;
mod ops;
mod optimizer;
mod registry;
mod tensor;

pub use config::{OptimizerConfig, CPU_EXECUTION_PROVIDER, CUDA_EXECUTION_PROVIDER, ONNX_DOMAIN};
pub use error::CoreError;
pub use framework::{
    run_kernel, run_kernel_async, AllocationStats, AllocatorInfo, AllocatorKind, AllocatorStats,
    ContextInputs, DoneCallback, ExecutionFrame, Executor, FrameValue, MLValue, OpKernel,
    OpKernelBase, OpKernelContext, OpKernelInfo, TensorSeq, ValueSlot, CPU_ALLOCATOR,
};
pub use graph::{
    describe_node, AttrValue, FromAttr, Graph, GraphDeserialize, GraphEditor, GraphSerialize,
    Node, NodeArg, NodeIndex, OpAttr, OpAttrs,
};
pub use ops::cpu::{
    register_cpu_kernels, resolve_slice_bounds, unary_map, unary_map_parallel, unsqueezed_shape,
    FloatElement, Identity, SignedElement, Slice, UnaryElementwise, Unsqueeze,
};
pub use optimizer::{EliminateIdentity, RewriteRule, RewriteStats, RuleBasedOptimizer};
pub use registry::{
    op_schema, KernelCreateInfo, KernelDef, KernelDefBuilder, KernelFactory, KernelRegistry,
    MemType, OpSchema, OPEN_VERSION_END, OP_SCHEMAS,
};
pub use tensor::{
    numel, DType, SliceIterator, SliceSkips, Tensor, TensorAxisCounters, TensorElement,
    TensorOptions, TensorPitches, TensorValue, ALL_DTYPES,
};
