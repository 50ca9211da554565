use std::fmt;

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};

use crate::error::CoreError;

use super::{numel, Tensor};

/// Supported element dtypes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DType {
    F32,
    F64,
    I8,
    I16,
    I32,
    I64,
    U8,
    U16,
    U32,
    U64,
    Bool,
}

pub const ALL_DTYPES: &[DType] = &[
    DType::F32,
    DType::F64,
    DType::I8,
    DType::I16,
    DType::I32,
    DType::I64,
    DType::U8,
    DType::U16,
    DType::U32,
    DType::U64,
    DType::Bool,
];

impl DType {
    /// Parse a dtype from its identifier string.
    pub fn from_ident(ident: &str) -> Result<Self> {
        match ident {
            "f32" | "float" => Ok(DType::F32),
            "f64" | "double" => Ok(DType::F64),
            "i8" | "int8" => Ok(DType::I8),
            "i16" | "int16" => Ok(DType::I16),
            "i32" | "int32" => Ok(DType::I32),
            "i64" | "int64" => Ok(DType::I64),
            "u8" | "uint8" => Ok(DType::U8),
            "u16" | "uint16" => Ok(DType::U16),
            "u32" | "uint32" => Ok(DType::U32),
            "u64" | "uint64" => Ok(DType::U64),
            "bool" => Ok(DType::Bool),
            _ => Err(anyhow!("unsupported dtype: {}", ident)),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            DType::F32 => "f32",
            DType::F64 => "f64",
            DType::I8 => "i8",
            DType::I16 => "i16",
            DType::I32 => "i32",
            DType::I64 => "i64",
            DType::U8 => "u8",
            DType::U16 => "u16",
            DType::U32 => "u32",
            DType::U64 => "u64",
            DType::Bool => "bool",
        }
    }

    /// Size of one element in bytes.
    pub fn size_of(self) -> usize {
        match self {
            DType::I8 | DType::U8 | DType::Bool => 1,
            DType::I16 | DType::U16 => 2,
            DType::F32 | DType::I32 | DType::U32 => 4,
            DType::F64 | DType::I64 | DType::U64 => 8,
        }
    }

    pub fn is_float(self) -> bool {
        matches!(self, DType::F32 | DType::F64)
    }

    pub fn is_signed_int(self) -> bool {
        matches!(self, DType::I8 | DType::I16 | DType::I32 | DType::I64)
    }
}

impl fmt::Display for DType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Runtime tensor value with an enum over concrete dtypes.
#[derive(Debug, Clone, PartialEq)]
pub enum TensorValue {
    F32(Tensor<f32>),
    F64(Tensor<f64>),
    I8(Tensor<i8>),
    I16(Tensor<i16>),
    I32(Tensor<i32>),
    I64(Tensor<i64>),
    U8(Tensor<u8>),
    U16(Tensor<u16>),
    U32(Tensor<u32>),
    U64(Tensor<u64>),
    Bool(Tensor<bool>),
}

/// Run `$body` with `$tensor` bound to the typed tensor inside a `TensorValue`.
#[macro_export]
macro_rules! with_tensor {
    ($value:expr, $tensor:ident => $body:expr) => {
        match $value {
            $crate::TensorValue::F32($tensor) => $body,
            $crate::TensorValue::F64($tensor) => $body,
            $crate::TensorValue::I8($tensor) => $body,
            $crate::TensorValue::I16($tensor) => $body,
            $crate::TensorValue::I32($tensor) => $body,
            $crate::TensorValue::I64($tensor) => $body,
            $crate::TensorValue::U8($tensor) => $body,
            $crate::TensorValue::U16($tensor) => $body,
            $crate::TensorValue::U32($tensor) => $body,
            $crate::TensorValue::U64($tensor) => $body,
            $crate::TensorValue::Bool($tensor) => $body,
        }
    };
}

/// Run `$body` with the type alias `$t` naming the Rust element type of `$dtype`.
#[macro_export]
macro_rules! with_dtype {
    ($dtype:expr, $t:ident => $body:expr) => {
        match $dtype {
            $crate::DType::F32 => {
                type $t = f32;
                $body
            }
            $crate::DType::F64 => {
                type $t = f64;
                $body
            }
            $crate::DType::I8 => {
                type $t = i8;
                $body
            }
            $crate::DType::I16 => {
                type $t = i16;
                $body
            }
            $crate::DType::I32 => {
                type $t = i32;
                $body
            }
            $crate::DType::I64 => {
                type $t = i64;
                $body
            }
            $crate::DType::U8 => {
                type $t = u8;
                $body
            }
            $crate::DType::U16 => {
                type $t = u16;
                $body
            }
            $crate::DType::U32 => {
                type $t = u32;
                $body
            }
            $crate::DType::U64 => {
                type $t = u64;
                $body
            }
            $crate::DType::Bool => {
                type $t = bool;
                $body
            }
        }
    };
}

/// Element type that can be viewed inside a `TensorValue`.
pub trait TensorElement: Sized + Copy + Default + Send + Sync + fmt::Debug + 'static {
    const DTYPE: DType;

    fn tensor_ref(value: &TensorValue) -> Option<&Tensor<Self>>;
    fn tensor_mut(value: &mut TensorValue) -> Option<&mut Tensor<Self>>;
    fn into_value(tensor: Tensor<Self>) -> TensorValue;
}

macro_rules! impl_tensor_element {
    ($($variant:ident => $ty:ty),+ $(,)?) => {
        $(
            impl TensorElement for $ty {
                const DTYPE: DType = DType::$variant;

                fn tensor_ref(value: &TensorValue) -> Option<&Tensor<Self>> {
                    match value {
                        TensorValue::$variant(tensor) => Some(tensor),
                        _ => None,
                    }
                }

                fn tensor_mut(value: &mut TensorValue) -> Option<&mut Tensor<Self>> {
                    match value {
                        TensorValue::$variant(tensor) => Some(tensor),
                        _ => None,
                    }
                }

                fn into_value(tensor: Tensor<Self>) -> TensorValue {
                    TensorValue::$variant(tensor)
                }
            }
        )+
    };
}

impl_tensor_element!(
    F32 => f32,
    F64 => f64,
    I8 => i8,
    I16 => i16,
    I32 => i32,
    I64 => i64,
    U8 => u8,
    U16 => u16,
    U32 => u32,
    U64 => u64,
    Bool => bool,
);

impl<T: TensorElement> From<Tensor<T>> for TensorValue {
    fn from(tensor: Tensor<T>) -> Self {
        T::into_value(tensor)
    }
}

impl TensorValue {
    pub fn dtype(&self) -> DType {
        match self {
            TensorValue::F32(_) => DType::F32,
            TensorValue::F64(_) => DType::F64,
            TensorValue::I8(_) => DType::I8,
            TensorValue::I16(_) => DType::I16,
            TensorValue::I32(_) => DType::I32,
            TensorValue::I64(_) => DType::I64,
            TensorValue::U8(_) => DType::U8,
            TensorValue::U16(_) => DType::U16,
            TensorValue::U32(_) => DType::U32,
            TensorValue::U64(_) => DType::U64,
            TensorValue::Bool(_) => DType::Bool,
        }
    }

    pub fn shape(&self) -> &[usize] {
        with_tensor!(self, tensor => tensor.shape())
    }

    /// Logical element count.
    pub fn len(&self) -> usize {
        numel(self.shape())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn size_in_bytes(&self) -> usize {
        self.len() * self.dtype().size_of()
    }

    /// Type name used in diagnostics, e.g. `tensor(f32)`.
    pub fn type_name(&self) -> String {
        format!("tensor({})", self.dtype())
    }

    /// Construct a zero-filled tensor for a dtype and shape.
    pub fn zeros(dtype: DType, shape: &[usize]) -> Self {
        with_dtype!(dtype, T => T::into_value(Tensor::<T>::zeros(shape)))
    }

    /// Copy the element data of `src` into this tensor, keeping this shape.
    pub fn copy_from(&mut self, src: &TensorValue) -> Result<()> {
        if self.dtype() != src.dtype() {
            return Err(CoreError::dtype_mismatch(self.dtype(), src.dtype()).into());
        }
        if self.len() != src.len() {
            return Err(anyhow!(
                "cannot copy {} elements into a tensor of {}",
                src.len(),
                self.len()
            ));
        }
        with_dtype!(self.dtype(), T => copy_typed::<T>(self, src))
    }
}

fn copy_typed<T: TensorElement>(dst: &mut TensorValue, src: &TensorValue) -> Result<()> {
    let src = T::tensor_ref(src).ok_or_else(|| anyhow!("copy source dtype changed"))?;
    let dst = T::tensor_mut(dst).ok_or_else(|| anyhow!("copy target dtype changed"))?;
    dst.data.copy_from_slice(&src.data);
    Ok(())
}
