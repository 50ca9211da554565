use anyhow::Result;

use crate::error::CoreError;
use crate::tensor::{DType, Tensor, TensorElement, TensorValue};

/// A value stored in an execution frame slot.
#[derive(Debug, Clone, PartialEq)]
pub enum MLValue {
    Tensor(TensorValue),
    TensorSeq(TensorSeq),
}

impl MLValue {
    pub fn type_name(&self) -> String {
        match self {
            MLValue::Tensor(value) => value.type_name(),
            MLValue::TensorSeq(seq) => seq.type_name(),
        }
    }

    pub fn size_in_bytes(&self) -> usize {
        match self {
            MLValue::Tensor(value) => value.size_in_bytes(),
            MLValue::TensorSeq(seq) => seq.tensors.iter().map(TensorValue::size_in_bytes).sum(),
        }
    }

    pub fn as_tensor(&self) -> Option<&TensorValue> {
        match self {
            MLValue::Tensor(value) => Some(value),
            MLValue::TensorSeq(_) => None,
        }
    }
}

impl From<TensorValue> for MLValue {
    fn from(value: TensorValue) -> Self {
        MLValue::Tensor(value)
    }
}

impl<T: TensorElement> From<Tensor<T>> for MLValue {
    fn from(tensor: Tensor<T>) -> Self {
        MLValue::Tensor(tensor.into())
    }
}

impl From<TensorSeq> for MLValue {
    fn from(seq: TensorSeq) -> Self {
        MLValue::TensorSeq(seq)
    }
}

/// Ordered tensors of one element type.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TensorSeq {
    /// Fixed by the first pushed tensor.
    pub dtype: Option<DType>,
    pub tensors: Vec<TensorValue>,
}

impl TensorSeq {
    pub fn push(&mut self, tensor: TensorValue) -> Result<()> {
        match self.dtype {
            Some(dtype) if dtype != tensor.dtype() => {
                return Err(CoreError::dtype_mismatch(dtype, tensor.dtype()).into());
            }
            Some(_) => {}
            None => self.dtype = Some(tensor.dtype()),
        }
        self.tensors.push(tensor);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.tensors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tensors.is_empty()
    }

    pub fn type_name(&self) -> String {
        match self.dtype {
            Some(dtype) => format!("seq(tensor({}))", dtype),
            None => "seq".to_string(),
        }
    }
}

/// Rust types a kernel can request from a frame slot.
pub trait FrameValue: Sized {
    fn type_name() -> String;
    fn from_ml_value(value: &MLValue) -> Option<&Self>;
    fn from_ml_value_mut(value: &mut MLValue) -> Option<&mut Self>;
    fn into_ml_value(self) -> MLValue;
}

impl FrameValue for TensorValue {
    fn type_name() -> String {
        "tensor".to_string()
    }

    fn from_ml_value(value: &MLValue) -> Option<&Self> {
        match value {
            MLValue::Tensor(tensor) => Some(tensor),
            MLValue::TensorSeq(_) => None,
        }
    }

    fn from_ml_value_mut(value: &mut MLValue) -> Option<&mut Self> {
        match value {
            MLValue::Tensor(tensor) => Some(tensor),
            MLValue::TensorSeq(_) => None,
        }
    }

    fn into_ml_value(self) -> MLValue {
        MLValue::Tensor(self)
    }
}

impl<T: TensorElement> FrameValue for Tensor<T> {
    fn type_name() -> String {
        format!("tensor({})", T::DTYPE)
    }

    fn from_ml_value(value: &MLValue) -> Option<&Self> {
        match value {
            MLValue::Tensor(tensor) => T::tensor_ref(tensor),
            MLValue::TensorSeq(_) => None,
        }
    }

    fn from_ml_value_mut(value: &mut MLValue) -> Option<&mut Self> {
        match value {
            MLValue::Tensor(tensor) => T::tensor_mut(tensor),
            MLValue::TensorSeq(_) => None,
        }
    }

    fn into_ml_value(self) -> MLValue {
        MLValue::Tensor(T::into_value(self))
    }
}

impl FrameValue for TensorSeq {
    fn type_name() -> String {
        "seq".to_string()
    }

    fn from_ml_value(value: &MLValue) -> Option<&Self> {
        match value {
            MLValue::TensorSeq(seq) => Some(seq),
            MLValue::Tensor(_) => None,
        }
    }

    fn from_ml_value_mut(value: &mut MLValue) -> Option<&mut Self> {
        match value {
            MLValue::TensorSeq(seq) => Some(seq),
            MLValue::Tensor(_) => None,
        }
    }

    fn into_ml_value(self) -> MLValue {
        MLValue::TensorSeq(self)
    }
}

/// Borrow `value` as `T`, or report what the slot actually holds.
pub(crate) fn downcast<T: FrameValue>(value: &MLValue) -> Result<&T> {
    T::from_ml_value(value)
        .ok_or_else(|| CoreError::type_mismatch(T::type_name(), value.type_name()).into())
}

pub(crate) fn downcast_mut<T: FrameValue>(value: &mut MLValue) -> Result<&mut T> {
    if T::from_ml_value(value).is_none() {
        return Err(CoreError::type_mismatch(T::type_name(), value.type_name()).into());
    }
    T::from_ml_value_mut(value)
        .ok_or_else(|| CoreError::type_mismatch(T::type_name(), "unknown").into())
}
