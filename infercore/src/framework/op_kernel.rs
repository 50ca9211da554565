use std::sync::Arc;

use anyhow::Result;

use crate::error::CoreError;
use crate::graph::{FromAttr, Node};
use crate::registry::KernelDef;

use super::{AllocatorInfo, OpKernelContext};

/// Invoked exactly once when an asynchronous compute has written its outputs.
pub type DoneCallback = Box<dyn FnOnce() + Send>;

/// Read-only view handed to a kernel factory.
///
/// Borrows its parts for the duration of the construction call only; a
/// kernel keeps what it needs by building an `OpKernelBase`.
#[derive(Clone, Copy)]
pub struct OpKernelInfo<'a> {
    node: &'a Node,
    allocator: &'a AllocatorInfo,
    kernel_def: &'a Arc<KernelDef>,
}

impl<'a> OpKernelInfo<'a> {
    pub fn new(node: &'a Node, allocator: &'a AllocatorInfo, kernel_def: &'a Arc<KernelDef>) -> Self {
        Self {
            node,
            allocator,
            kernel_def,
        }
    }

    pub fn node(&self) -> &'a Node {
        self.node
    }

    pub fn allocator(&self) -> &'a AllocatorInfo {
        self.allocator
    }

    pub fn kernel_def(&self) -> &'a KernelDef {
        self.kernel_def
    }

    pub fn get_attr<T: FromAttr>(&self, name: &str) -> Result<T> {
        self.node.get_attr(name)
    }

    pub fn get_attrs<T: FromAttr>(&self, name: &str) -> Result<Vec<T>> {
        self.node.get_attrs(name)
    }
}

/// State every kernel carries: the node and definition it was built for.
#[derive(Debug, Clone)]
pub struct OpKernelBase {
    node: Node,
    kernel_def: Arc<KernelDef>,
    allocator: AllocatorInfo,
}

impl OpKernelBase {
    pub fn new(info: &OpKernelInfo<'_>) -> Self {
        Self {
            node: info.node.clone(),
            kernel_def: Arc::clone(info.kernel_def),
            allocator: info.allocator.clone(),
        }
    }

    pub fn node(&self) -> &Node {
        &self.node
    }

    pub fn kernel_def(&self) -> &KernelDef {
        &self.kernel_def
    }

    pub fn allocator(&self) -> &AllocatorInfo {
        &self.allocator
    }
}

/// An executable bound to one node and one kernel definition.
///
/// Kernels are shared between concurrent runs, so `compute` takes `&self`;
/// all per-call state lives in the context.
pub trait OpKernel: Send + Sync {
    fn base(&self) -> &OpKernelBase;

    fn compute(&self, ctx: &mut OpKernelContext<'_>) -> Result<()>;

    /// Asynchronous variant. Implementations call `done` exactly once, after
    /// every output is written, possibly from another thread.
    fn compute_async(&self, ctx: &mut OpKernelContext<'_>, done: DoneCallback) -> Result<()> {
        let _ = (ctx, done);
        Err(CoreError::NotImplemented {
            op: self.base().node().op_type.clone(),
            what: "compute_async",
        }
        .into())
    }

    fn node(&self) -> &Node {
        self.base().node()
    }
}
