//! Per-run value storage.
//!
//! The frame gives every distinct argument name one value slot and lays out
//! an argument table: for each node, in index order, the slots of its inputs
//! followed by the slots of its outputs. A kernel's logical argument `i`
//! lives at table position `arg_start(node) + i`.
use std::collections::{HashMap, HashSet};

use anyhow::Result;

use crate::error::CoreError;
use crate::graph::{Graph, NodeIndex};
use crate::tensor::{DType, Tensor, TensorElement, TensorValue};

use super::allocator::{AllocationStats, AllocatorInfo};
use super::ml_value::{downcast, downcast_mut, FrameValue, MLValue};

#[derive(Debug)]
pub struct ValueSlot {
    pub(crate) name: String,
    pub(crate) value: Option<MLValue>,
    /// Allocator that produced `value`; `None` for fed values.
    pub(crate) allocator: Option<AllocatorInfo>,
}

impl ValueSlot {
    fn new(name: String) -> Self {
        Self {
            name,
            value: None,
            allocator: None,
        }
    }

    pub(crate) fn value(&self) -> Result<&MLValue> {
        self.value.as_ref().ok_or_else(|| {
            CoreError::MissingValue {
                arg: self.name.clone(),
            }
            .into()
        })
    }
}

#[derive(Debug, Clone, Copy)]
struct NodeArgs {
    start: usize,
    inputs: usize,
    outputs: usize,
}

/// Disjoint borrows of one node's input and output slots.
pub(crate) struct NodeBinding<'f> {
    pub(crate) inputs: Vec<&'f ValueSlot>,
    pub(crate) outputs: Vec<&'f mut ValueSlot>,
    pub(crate) stats: &'f mut AllocationStats,
}

#[derive(Debug)]
pub struct ExecutionFrame {
    slots: Vec<ValueSlot>,
    slot_index: HashMap<String, usize>,
    arg_table: Vec<usize>,
    node_args: HashMap<NodeIndex, NodeArgs>,
    stats: AllocationStats,
}

impl ExecutionFrame {
    pub fn new(graph: &Graph) -> Result<Self> {
        let mut frame = Self {
            slots: Vec::new(),
            slot_index: HashMap::new(),
            arg_table: Vec::new(),
            node_args: HashMap::new(),
            stats: AllocationStats::default(),
        };
        for arg in graph
            .inputs
            .iter()
            .chain(graph.initializers.iter())
            .chain(graph.outputs.iter())
        {
            frame.intern(&arg.name);
        }
        for node in graph.nodes() {
            let outputs: HashSet<&str> = node.outputs.iter().map(|arg| arg.name.as_str()).collect();
            if outputs.len() != node.outputs.len() {
                return Err(CoreError::invalid_graph(format!(
                    "node {} writes the same value twice",
                    node.name
                ))
                .into());
            }
            if let Some(arg) = node.inputs.iter().find(|arg| outputs.contains(arg.name.as_str())) {
                return Err(CoreError::invalid_graph(format!(
                    "node {} reads and writes {}",
                    node.name, arg.name
                ))
                .into());
            }
            let start = frame.arg_table.len();
            for arg in node.inputs.iter().chain(node.outputs.iter()) {
                let slot = frame.intern(&arg.name);
                frame.arg_table.push(slot);
            }
            frame.node_args.insert(
                node.index,
                NodeArgs {
                    start,
                    inputs: node.inputs.len(),
                    outputs: node.outputs.len(),
                },
            );
        }
        Ok(frame)
    }

    fn intern(&mut self, name: &str) -> usize {
        if let Some(&slot) = self.slot_index.get(name) {
            return slot;
        }
        let slot = self.slots.len();
        self.slots.push(ValueSlot::new(name.to_string()));
        self.slot_index.insert(name.to_string(), slot);
        slot
    }

    /// Table position of the node's first input.
    pub fn arg_start(&self, node: NodeIndex) -> Result<usize> {
        self.node_args
            .get(&node)
            .map(|args| args.start)
            .ok_or_else(|| CoreError::invalid_graph(format!("node {} is not in this frame", node)).into())
    }

    /// Length of the argument table.
    pub fn arg_count(&self) -> usize {
        self.arg_table.len()
    }

    fn slot_at(&self, position: usize) -> &ValueSlot {
        assert!(
            position < self.arg_table.len(),
            "argument position {} out of range ({} entries)",
            position,
            self.arg_table.len()
        );
        &self.slots[self.arg_table[position]]
    }

    fn slot_at_mut(&mut self, position: usize) -> &mut ValueSlot {
        assert!(
            position < self.arg_table.len(),
            "argument position {} out of range ({} entries)",
            position,
            self.arg_table.len()
        );
        let slot = self.arg_table[position];
        &mut self.slots[slot]
    }

    fn named_slot(&self, name: &str) -> Result<&ValueSlot> {
        self.slot_index
            .get(name)
            .map(|&slot| &self.slots[slot])
            .ok_or_else(|| CoreError::invalid_graph(format!("unknown value {}", name)).into())
    }

    /// Bind a value to a named argument ahead of execution.
    ///
    /// Feeding a graph output pre-binds its storage; the producing kernel then
    /// writes into it in place, provided the shapes agree.
    pub fn feed(&mut self, name: &str, value: impl Into<MLValue>) -> Result<()> {
        let slot = *self
            .slot_index
            .get(name)
            .ok_or_else(|| CoreError::invalid_graph(format!("unknown value {}", name)))?;
        let slot = &mut self.slots[slot];
        slot.value = Some(value.into());
        slot.allocator = None;
        Ok(())
    }

    pub fn fetch(&self, name: &str) -> Result<&MLValue> {
        self.named_slot(name)?.value()
    }

    pub fn fetch_tensor<T: TensorElement>(&self, name: &str) -> Result<&Tensor<T>> {
        downcast::<Tensor<T>>(self.fetch(name)?)
    }

    pub fn get_value<T: FrameValue>(&self, position: usize) -> Result<&T> {
        downcast::<T>(self.slot_at(position).value()?)
    }

    pub fn get_mutable_value<T: FrameValue>(&mut self, position: usize) -> Result<&mut T> {
        let slot = self.slot_at_mut(position);
        let value = slot.value.as_mut().ok_or_else(|| CoreError::MissingValue {
            arg: slot.name.clone(),
        })?;
        downcast_mut::<T>(value)
    }

    /// Allocate the tensor for a table position unless one already exists.
    pub fn allocate_tensor(
        &mut self,
        position: usize,
        dtype: DType,
        shape: &[usize],
        allocator: &AllocatorInfo,
    ) -> Result<&mut TensorValue> {
        assert!(
            position < self.arg_table.len(),
            "argument position {} out of range ({} entries)",
            position,
            self.arg_table.len()
        );
        let slot = &mut self.slots[self.arg_table[position]];
        materialize(slot, &mut self.stats, allocator, dtype, shape)
    }

    /// Allocator that produced the named value, if a kernel allocated it.
    pub fn allocator_of(&self, name: &str) -> Option<&AllocatorInfo> {
        self.named_slot(name).ok()?.allocator.as_ref()
    }

    pub fn allocation_stats(&self) -> &AllocationStats {
        &self.stats
    }

    /// Hand out the slots of one node: shared borrows for inputs, exclusive
    /// borrows for outputs.
    pub(crate) fn bind_node(
        &mut self,
        node: NodeIndex,
        num_inputs: usize,
        num_outputs: usize,
    ) -> Result<NodeBinding<'_>> {
        let args = *self
            .node_args
            .get(&node)
            .ok_or_else(|| CoreError::invalid_graph(format!("node {} is not in this frame", node)))?;
        if args.inputs != num_inputs || args.outputs != num_outputs {
            return Err(CoreError::invalid_graph(format!(
                "node {} has {} inputs and {} outputs in the frame, kernel expects {} and {}",
                node, args.inputs, args.outputs, num_inputs, num_outputs
            ))
            .into());
        }
        let input_ids = &self.arg_table[args.start..args.start + args.inputs];
        let output_ids =
            &self.arg_table[args.start + args.inputs..args.start + args.inputs + args.outputs];

        let mut shared: HashMap<usize, &ValueSlot> = HashMap::new();
        let mut exclusive: HashMap<usize, &mut ValueSlot> = HashMap::new();
        for (id, slot) in self.slots.iter_mut().enumerate() {
            if output_ids.contains(&id) {
                exclusive.insert(id, slot);
            } else if input_ids.contains(&id) {
                shared.insert(id, slot);
            }
        }
        let inputs = input_ids.iter().map(|id| shared[id]).collect();
        let mut outputs = Vec::with_capacity(output_ids.len());
        for id in output_ids {
            let slot = exclusive
                .remove(id)
                .ok_or_else(|| CoreError::invalid_graph(format!("slot {} bound twice", id)))?;
            outputs.push(slot);
        }
        Ok(NodeBinding {
            inputs,
            outputs,
            stats: &mut self.stats,
        })
    }
}

/// Return the tensor in `slot`, allocating it first if the slot is empty.
///
/// An existing tensor must already have the requested dtype and shape.
pub(crate) fn materialize<'s>(
    slot: &'s mut ValueSlot,
    stats: &mut AllocationStats,
    allocator: &AllocatorInfo,
    dtype: DType,
    shape: &[usize],
) -> Result<&'s mut TensorValue> {
    if slot.value.is_none() {
        let tensor = TensorValue::zeros(dtype, shape);
        stats.record(allocator, tensor.size_in_bytes());
        slot.allocator = Some(allocator.clone());
        slot.value = Some(MLValue::Tensor(tensor));
    }
    let name = &slot.name;
    match slot.value.as_mut() {
        Some(MLValue::Tensor(tensor)) => {
            if tensor.shape() != shape {
                return Err(CoreError::ShapeMismatch {
                    expected: tensor.shape().to_vec(),
                    actual: shape.to_vec(),
                }
                .into());
            }
            if tensor.dtype() != dtype {
                return Err(CoreError::dtype_mismatch(tensor.dtype(), dtype).into());
            }
            Ok(tensor)
        }
        Some(other) => Err(CoreError::type_mismatch(format!("tensor({})", dtype), other.type_name()).into()),
        None => Err(CoreError::MissingValue { arg: name.clone() }.into()),
    }
}
