mod addressing;
mod tensor;
mod value;

pub use addressing::{numel, SliceIterator, SliceSkips, TensorAxisCounters, TensorPitches};
pub use tensor::{Tensor, TensorOptions};
pub use value::{DType, TensorElement, TensorValue, ALL_DTYPES};
