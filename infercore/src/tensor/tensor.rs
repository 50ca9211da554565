use anyhow::{anyhow, Result};

use super::addressing::{numel, TensorPitches};

/// Construction options for `Tensor::from_vec_with_opts`.
#[derive(Debug, Clone, Default)]
pub struct TensorOptions {
    /// Explicit shape. `None` makes a rank-1 tensor over the whole buffer.
    pub shape: Option<Vec<usize>>,
}

impl TensorOptions {
    pub fn with_shape(shape: &[usize]) -> Self {
        Self {
            shape: Some(shape.to_vec()),
        }
    }
}

/// Dense row-major tensor. The flat buffer always holds exactly
/// `numel(shape)` elements.
#[derive(Debug, Clone, PartialEq)]
pub struct Tensor<T> {
    pub data: Vec<T>,
    shape: Vec<usize>,
    pitches: TensorPitches,
}

impl<T> Tensor<T> {
    /// ```no_run
    /// # use infercore::Tensor;
    /// # fn main() -> anyhow::Result<()> {
    /// let t = Tensor::from_vec(vec![1.0f32, 2.0, 3.0])?;
    /// assert_eq!(t.shape(), &[3]);
    /// # Ok(()) }
    /// ```
    pub fn from_vec(data: Vec<T>) -> Result<Self> {
        Self::from_vec_with_opts(data, TensorOptions::default())
    }

    /// ```no_run
    /// # use infercore::{Tensor, TensorOptions};
    /// # fn main() -> anyhow::Result<()> {
    /// let t = Tensor::from_vec_with_opts(
    ///     vec![1.0f32, 2.0, 3.0, 4.0],
    ///     TensorOptions::with_shape(&[2, 2]),
    /// )?;
    /// assert_eq!(t.strides(), &[2, 1]);
    /// # Ok(()) }
    /// ```
    pub fn from_vec_with_opts(data: Vec<T>, opts: TensorOptions) -> Result<Self> {
        let shape = opts.shape.unwrap_or_else(|| vec![data.len()]);
        if numel(&shape) != data.len() {
            return Err(anyhow!(
                "shape {:?} holds {} elements but {} were given",
                shape,
                numel(&shape),
                data.len()
            ));
        }
        Ok(Self::from_parts(data, shape))
    }

    /// Rank-0 tensor.
    pub fn from_scalar(value: T) -> Self {
        Self::from_parts(vec![value], Vec::new())
    }

    fn from_parts(data: Vec<T>, shape: Vec<usize>) -> Self {
        let pitches = TensorPitches::new(&shape);
        Self {
            data,
            shape,
            pitches,
        }
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    /// Row-major strides, equal to the pitch vector of the shape.
    pub fn strides(&self) -> &[usize] {
        &self.pitches
    }

    pub fn pitches(&self) -> &TensorPitches {
        &self.pitches
    }

    pub fn rank(&self) -> usize {
        self.shape.len()
    }

    pub fn numel(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Element at a multidimensional index. Panics on a rank mismatch or an
    /// index past its dimension.
    pub fn at(&self, indices: &[usize]) -> &T {
        for (axis, (&idx, &dim)) in indices.iter().zip(&self.shape).enumerate() {
            assert!(
                idx < dim,
                "index {} out of bounds for dim {} on axis {}",
                idx,
                dim,
                axis
            );
        }
        &self.data[self.pitches.offset(indices)]
    }

    pub fn to_vec(&self) -> Vec<T>
    where
        T: Clone,
    {
        self.data.clone()
    }
}

impl<T: Clone + Default> Tensor<T> {
    pub fn zeros(shape: &[usize]) -> Self {
        Self::from_parts(vec![T::default(); numel(shape)], shape.to_vec())
    }
}
