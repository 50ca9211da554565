use anyhow::Result;

use crate::error::CoreError;
use crate::framework::{OpKernel, OpKernelBase, OpKernelContext, OpKernelInfo};
use crate::tensor::{SliceIterator, TensorElement, TensorValue};
use crate::with_dtype;

/// Per-axis `(starts, extents)` for slicing `shape`.
///
/// Negative positions count from the end of the axis; both ends are clamped
/// into `[0, dim]`. An empty or reversed range yields extent 0. Axes not
/// named keep their full range.
pub fn resolve_slice_bounds(
    shape: &[usize],
    starts: &[i64],
    ends: &[i64],
    axes: Option<&[i64]>,
) -> Result<(Vec<usize>, Vec<usize>)> {
    if starts.len() != ends.len() {
        return Err(CoreError::invalid_argument(
            "Slice",
            format!("{} starts but {} ends", starts.len(), ends.len()),
        )
        .into());
    }
    let default_axes: Vec<i64> = (0..starts.len() as i64).collect();
    let axes = axes.unwrap_or(default_axes.as_slice());
    if axes.len() != starts.len() {
        return Err(CoreError::invalid_argument(
            "Slice",
            format!("{} axes but {} starts", axes.len(), starts.len()),
        )
        .into());
    }
    let rank = shape.len();
    let mut out_starts = vec![0usize; rank];
    let mut extents = shape.to_vec();
    let mut seen = vec![false; rank];
    for ((&axis, &start), &end) in axes.iter().zip(starts).zip(ends) {
        let axis = if axis < 0 { axis + rank as i64 } else { axis };
        if axis < 0 || axis as usize >= rank {
            return Err(CoreError::invalid_argument(
                "Slice",
                format!("axis {} out of range for rank {}", axis, rank),
            )
            .into());
        }
        let axis = axis as usize;
        if seen[axis] {
            return Err(
                CoreError::invalid_argument("Slice", format!("duplicate axis {}", axis)).into(),
            );
        }
        seen[axis] = true;
        let dim = shape[axis] as i64;
        let clamp = |pos: i64| -> usize {
            let pos = if pos < 0 { pos + dim } else { pos };
            pos.clamp(0, dim) as usize
        };
        let begin = clamp(start);
        let finish = clamp(end);
        out_starts[axis] = begin;
        extents[axis] = finish.saturating_sub(begin);
    }
    Ok((out_starts, extents))
}

pub struct Slice {
    base: OpKernelBase,
    starts: Vec<i64>,
    ends: Vec<i64>,
    axes: Option<Vec<i64>>,
}

impl Slice {
    pub fn new(info: &OpKernelInfo<'_>) -> Result<Self> {
        let starts = info.get_attrs::<i64>("starts")?;
        let ends = info.get_attrs::<i64>("ends")?;
        let axes = match info.node().attrs.get("axes") {
            Some(_) => Some(info.get_attrs::<i64>("axes")?),
            None => None,
        };
        Ok(Self {
            base: OpKernelBase::new(info),
            starts,
            ends,
            axes,
        })
    }
}

impl OpKernel for Slice {
    fn base(&self) -> &OpKernelBase {
        &self.base
    }

    fn compute(&self, ctx: &mut OpKernelContext<'_>) -> Result<()> {
        let shape = ctx.input_value(0)?.shape().to_vec();
        let (starts, extents) =
            resolve_slice_bounds(&shape, &self.starts, &self.ends, self.axes.as_deref())?;
        let (inputs, out) = ctx.split_output(0, &extents)?;
        let input = inputs.value(0)?;
        with_dtype!(input.dtype(), T => copy_slice::<T>(input, out, &starts, &extents))
    }
}

fn copy_slice<T: TensorElement>(
    input: &TensorValue,
    out: &mut TensorValue,
    starts: &[usize],
    extents: &[usize],
) -> Result<()> {
    let out_dtype = out.dtype();
    let src = T::tensor_ref(input).ok_or_else(|| CoreError::dtype_mismatch(T::DTYPE, input.dtype()))?;
    let dst = T::tensor_mut(out).ok_or_else(|| CoreError::dtype_mismatch(T::DTYPE, out_dtype))?;
    SliceIterator::for_tensor(src, starts, extents).copy_to(&mut dst.data);
    Ok(())
}
