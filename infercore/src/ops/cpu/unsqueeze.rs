use anyhow::Result;

use crate::error::CoreError;
use crate::framework::{OpKernel, OpKernelBase, OpKernelContext, OpKernelInfo};

/// Output shape of inserting size-1 dims at `axes` (positions in the output).
pub fn unsqueezed_shape(input: &[usize], axes: &[i64]) -> Result<Vec<usize>> {
    let rank = input.len() + axes.len();
    let mut inserted = vec![false; rank];
    for &axis in axes {
        if axis < 0 || axis as usize >= rank {
            return Err(CoreError::invalid_argument(
                "Unsqueeze",
                format!("axis {} out of range for output rank {}", axis, rank),
            )
            .into());
        }
        if inserted[axis as usize] {
            return Err(CoreError::invalid_argument(
                "Unsqueeze",
                format!("duplicate axis {}", axis),
            )
            .into());
        }
        inserted[axis as usize] = true;
    }
    let mut dims = input.iter().copied();
    let shape = inserted
        .into_iter()
        .map(|is_new| if is_new { 1 } else { dims.next().unwrap_or(1) })
        .collect();
    Ok(shape)
}

pub struct Unsqueeze {
    base: OpKernelBase,
    axes: Vec<i64>,
}

impl Unsqueeze {
    /// Fails when the node has no `axes` attribute.
    pub fn new(info: &OpKernelInfo<'_>) -> Result<Self> {
        let axes = info.get_attrs::<i64>("axes")?;
        Ok(Self {
            base: OpKernelBase::new(info),
            axes,
        })
    }
}

impl OpKernel for Unsqueeze {
    fn base(&self) -> &OpKernelBase {
        &self.base
    }

    fn compute(&self, ctx: &mut OpKernelContext<'_>) -> Result<()> {
        let shape = unsqueezed_shape(ctx.input_value(0)?.shape(), &self.axes)?;
        let (inputs, out) = ctx.split_output(0, &shape)?;
        out.copy_from(inputs.value(0)?)
    }
}
