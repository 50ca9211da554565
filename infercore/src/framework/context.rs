use anyhow::Result;

use crate::error::CoreError;
use crate::graph::Node;
use crate::tensor::{DType, Tensor, TensorElement, TensorValue};

use super::allocator::{AllocationStats, AllocatorInfo};
use super::frame::{materialize, ExecutionFrame, ValueSlot};
use super::ml_value::{downcast, downcast_mut, FrameValue};
use super::OpKernel;

/// Read access to a kernel's inputs.
#[derive(Clone, Copy)]
pub struct ContextInputs<'c> {
    node: &'c Node,
    slots: &'c [&'c ValueSlot],
}

impl<'c> ContextInputs<'c> {
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Panics if `index` is outside the node's declared inputs.
    pub fn get<T: FrameValue>(&self, index: usize) -> Result<&'c T> {
        assert!(
            index < self.slots.len(),
            "{}: input index {} out of range ({} inputs)",
            self.node.name,
            index,
            self.slots.len()
        );
        downcast::<T>(self.slots[index].value()?)
    }

    pub fn tensor<T: TensorElement>(&self, index: usize) -> Result<&'c Tensor<T>> {
        self.get::<Tensor<T>>(index)
    }

    pub fn value(&self, index: usize) -> Result<&'c TensorValue> {
        self.get::<TensorValue>(index)
    }
}

/// Per-invocation view of one node's arguments inside an execution frame.
///
/// Logical input `i` and output `j` resolve to frame positions
/// `arg_start + i` and `arg_start + num_inputs + j`. Outputs are allocated on
/// first request, sized by the kernel.
pub struct OpKernelContext<'a> {
    node: &'a Node,
    allocator: &'a AllocatorInfo,
    inputs: Vec<&'a ValueSlot>,
    outputs: Vec<&'a mut ValueSlot>,
    stats: &'a mut AllocationStats,
}

impl<'a> OpKernelContext<'a> {
    pub fn new(frame: &'a mut ExecutionFrame, kernel: &'a dyn OpKernel) -> Result<Self> {
        let base = kernel.base();
        let node = base.node();
        let binding = frame.bind_node(node.index, node.inputs.len(), node.outputs.len())?;
        Ok(Self {
            node,
            allocator: base.allocator(),
            inputs: binding.inputs,
            outputs: binding.outputs,
            stats: binding.stats,
        })
    }

    pub fn node(&self) -> &'a Node {
        self.node
    }

    pub fn num_inputs(&self) -> usize {
        self.inputs.len()
    }

    pub fn num_outputs(&self) -> usize {
        self.outputs.len()
    }

    pub fn inputs(&self) -> ContextInputs<'_> {
        ContextInputs {
            node: self.node,
            slots: &self.inputs,
        }
    }

    pub fn input<T: FrameValue>(&self, index: usize) -> Result<&T> {
        self.inputs().get::<T>(index)
    }

    pub fn input_tensor<T: TensorElement>(&self, index: usize) -> Result<&Tensor<T>> {
        self.inputs().tensor::<T>(index)
    }

    pub fn input_value(&self, index: usize) -> Result<&TensorValue> {
        self.inputs().value(index)
    }

    fn check_output_index(&self, index: usize) {
        assert!(
            index < self.outputs.len(),
            "{}: output index {} out of range ({} outputs)",
            self.node.name,
            index,
            self.outputs.len()
        );
    }

    /// Element type of output `index`: the declared dtype, else that of the
    /// first input.
    pub fn output_dtype(&self, index: usize) -> Result<DType> {
        self.check_output_index(index);
        if let Some(dtype) = self.node.outputs[index].dtype {
            return Ok(dtype);
        }
        if !self.inputs.is_empty() {
            return Ok(self.input_value(0)?.dtype());
        }
        Err(CoreError::invalid_argument(
            &self.node.op_type,
            format!("cannot infer the element type of output {}", index),
        )
        .into())
    }

    /// Non-tensor output; an empty slot is filled with `T::default()`.
    pub fn output_value<T: FrameValue + Default>(&mut self, index: usize) -> Result<&mut T> {
        self.check_output_index(index);
        let slot = &mut *self.outputs[index];
        let value = slot.value.get_or_insert_with(|| T::default().into_ml_value());
        downcast_mut::<T>(value)
    }

    /// Tensor output `index` with `shape`.
    ///
    /// Allocates from the kernel's allocator on first call. A pre-bound or
    /// already allocated tensor is returned as is when its shape matches and
    /// rejected with a shape error otherwise.
    pub fn output(&mut self, index: usize, shape: &[usize]) -> Result<&mut TensorValue> {
        let dtype = self.output_dtype(index)?;
        let slot = &mut *self.outputs[index];
        materialize(slot, &mut *self.stats, self.allocator, dtype, shape)
    }

    pub fn output_tensor<T: TensorElement>(
        &mut self,
        index: usize,
        shape: &[usize],
    ) -> Result<&mut Tensor<T>> {
        let dtype = self.output_dtype(index)?;
        if dtype != T::DTYPE {
            return Err(CoreError::dtype_mismatch(dtype, T::DTYPE).into());
        }
        let slot = &mut *self.outputs[index];
        let value = materialize(slot, &mut *self.stats, self.allocator, dtype, shape)?;
        T::tensor_mut(value).ok_or_else(|| CoreError::dtype_mismatch(dtype, T::DTYPE).into())
    }

    /// Inputs together with output `index`, for kernels that read and write
    /// in the same step.
    pub fn split_output(
        &mut self,
        index: usize,
        shape: &[usize],
    ) -> Result<(ContextInputs<'_>, &mut TensorValue)> {
        let dtype = self.output_dtype(index)?;
        let slot = &mut *self.outputs[index];
        let output = materialize(slot, &mut *self.stats, self.allocator, dtype, shape)?;
        let inputs = ContextInputs {
            node: self.node,
            slots: &self.inputs,
        };
        Ok((inputs, output))
    }
}
