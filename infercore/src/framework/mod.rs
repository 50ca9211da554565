mod allocator;
mod context;
mod executor;
mod frame;
mod ml_value;
mod op_kernel;

pub use allocator::{AllocationStats, AllocatorInfo, AllocatorKind, AllocatorStats, CPU_ALLOCATOR};
pub use context::{ContextInputs, OpKernelContext};
pub use executor::{run_kernel, run_kernel_async, Executor};
pub use frame::{ExecutionFrame, ValueSlot};
pub use ml_value::{FrameValue, MLValue, TensorSeq};
pub use op_kernel::{DoneCallback, OpKernel, OpKernelBase, OpKernelInfo};
