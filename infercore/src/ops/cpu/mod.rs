mod elementwise;
mod identity;
mod registry;
mod slice;
mod unsqueeze;

pub use elementwise::{unary_map, unary_map_parallel, FloatElement, SignedElement, UnaryElementwise};
pub use identity::Identity;
pub use registry::register_cpu_kernels;
pub use slice::{resolve_slice_bounds, Slice};
pub use unsqueeze::{unsqueezed_shape, Unsqueeze};
