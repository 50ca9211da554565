mod kernel_def;
mod kernel_registry;
mod op_schema;

pub use kernel_def::{KernelDef, KernelDefBuilder, MemType, OPEN_VERSION_END};
pub use kernel_registry::{KernelCreateInfo, KernelFactory, KernelRegistry};
pub use op_schema::{op_schema, OpSchema, OP_SCHEMAS};
