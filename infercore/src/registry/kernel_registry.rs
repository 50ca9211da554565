use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Result;
use once_cell::sync::Lazy;

use crate::config::CPU_EXECUTION_PROVIDER;
use crate::error::CoreError;
use crate::framework::{AllocatorInfo, OpKernel, OpKernelInfo};
use crate::graph::Node;
use crate::ops::cpu::register_cpu_kernels;

use super::{op_schema, KernelDef};

pub type KernelFactory =
    Box<dyn Fn(&OpKernelInfo<'_>) -> Result<Box<dyn OpKernel>> + Send + Sync>;

/// A registered definition together with the factory that builds it.
pub struct KernelCreateInfo {
    pub kernel_def: Arc<KernelDef>,
    factory: KernelFactory,
}

impl KernelCreateInfo {
    pub fn create(&self, node: &Node, allocator: &AllocatorInfo) -> Result<Box<dyn OpKernel>> {
        let info = OpKernelInfo::new(node, allocator, &self.kernel_def);
        (self.factory)(&info)
    }
}

/// Operator name to kernel factories.
///
/// Filled once at startup and only read afterwards; `create_kernel` takes
/// `&self`, so a populated registry can be shared between threads.
#[derive(Default)]
pub struct KernelRegistry {
    kernels: HashMap<String, Vec<KernelCreateInfo>>,
}

static GLOBAL_REGISTRY: Lazy<KernelRegistry> = Lazy::new(|| {
    match KernelRegistry::with_cpu_kernels() {
        Ok(registry) => registry,
        Err(err) => {
            crate::critical!("CPU kernel registration failed: {}", err);
            panic!("CPU kernel registration failed: {}", err);
        }
    }
});

impl KernelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with every built-in CPU kernel.
    pub fn with_cpu_kernels() -> Result<Self> {
        let mut registry = Self::new();
        register_cpu_kernels(&mut registry)?;
        Ok(registry)
    }

    /// Process-wide registry built from `with_cpu_kernels` on first use.
    pub fn global() -> &'static KernelRegistry {
        &GLOBAL_REGISTRY
    }

    /// Add a kernel. Fails if some node could match both this definition and
    /// one already registered.
    pub fn register<F>(&mut self, kernel_def: KernelDef, factory: F) -> Result<()>
    where
        F: Fn(&OpKernelInfo<'_>) -> Result<Box<dyn OpKernel>> + Send + Sync + 'static,
    {
        check_aliases(&kernel_def)?;
        let entries = self.kernels.entry(kernel_def.op_name.clone()).or_default();
        if let Some(existing) = entries
            .iter()
            .find(|entry| entry.kernel_def.overlaps(&kernel_def))
        {
            return Err(CoreError::KernelConflict {
                op: kernel_def.op_name.clone(),
                provider: kernel_def.provider.clone(),
                existing: existing.kernel_def.to_string(),
            }
            .into());
        }
        crate::trace!("registered kernel {}", kernel_def);
        entries.push(KernelCreateInfo {
            kernel_def: Arc::new(kernel_def),
            factory: Box::new(factory),
        });
        Ok(())
    }

    /// The single registered kernel that can run `node` on `provider`.
    pub fn find_kernel(&self, provider: &str, node: &Node) -> Result<&KernelCreateInfo> {
        let mut matches = self
            .kernels
            .get(&node.op_type)
            .into_iter()
            .flatten()
            .filter(|entry| {
                let def = &entry.kernel_def;
                def.provider == provider
                    && def.domain == node.domain
                    && def.supports_version(node.since_version)
                    && def.type_constraints_satisfied(node)
            });
        let Some(first) = matches.next() else {
            return Err(CoreError::NoCompatibleKernel {
                op: node.op_type.clone(),
                provider: provider.to_string(),
                version: node.since_version,
            }
            .into());
        };
        let extra = matches.count();
        if extra > 0 {
            return Err(CoreError::AmbiguousKernel {
                op: node.op_type.clone(),
                provider: provider.to_string(),
                count: extra + 1,
            }
            .into());
        }
        Ok(first)
    }

    pub fn create_kernel(
        &self,
        provider: &str,
        node: &Node,
        allocator: &AllocatorInfo,
    ) -> Result<Box<dyn OpKernel>> {
        let entry = self.find_kernel(provider, node)?;
        crate::trace!(
            "node {} ({} v{}) -> {}",
            node.name,
            node.op_type,
            node.since_version,
            entry.kernel_def
        );
        entry.create(node, allocator)
    }

    /// Like `create_kernel`, using the node's assigned provider or the CPU
    /// provider when it has none.
    pub fn create_kernel_for_node(
        &self,
        node: &Node,
        allocator: &AllocatorInfo,
    ) -> Result<Box<dyn OpKernel>> {
        let provider = node.provider.as_deref().unwrap_or(CPU_EXECUTION_PROVIDER);
        self.create_kernel(provider, node, allocator)
    }

    /// Every operator name with at least one kernel, in no particular order.
    pub fn registered_op_names(&self) -> Vec<&str> {
        self.kernels
            .iter()
            .filter(|(_, entries)| !entries.is_empty())
            .map(|(name, _)| name.as_str())
            .collect()
    }

    pub fn kernel_defs<'r>(&'r self, op_name: &str) -> impl Iterator<Item = &'r KernelDef> + 'r {
        self.kernels
            .get(op_name)
            .into_iter()
            .flatten()
            .map(|entry| entry.kernel_def.as_ref())
    }

    /// Number of registered kernels.
    pub fn len(&self) -> usize {
        self.kernels.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// An alias is only allowed where the operator's schema lets output 0 reuse
/// input 0. Operators without a schema are not checked.
fn check_aliases(kernel_def: &KernelDef) -> Result<()> {
    let Some(schema) = op_schema(&kernel_def.op_name) else {
        return Ok(());
    };
    match kernel_def
        .aliases
        .iter()
        .find(|&&alias| !schema.supports_inplace || alias != (0, 0))
    {
        Some(&(input, output)) => Err(CoreError::InvalidArgument {
            op: kernel_def.op_name.clone(),
            reason: format!("output {} cannot alias input {}", output, input),
        }
        .into()),
        None => Ok(()),
    }
}
