use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::config::{CPU_EXECUTION_PROVIDER, ONNX_DOMAIN};
use crate::graph::Node;
use crate::tensor::DType;

use super::op_schema;

/// Version end used for kernels that stay valid for every later opset.
pub const OPEN_VERSION_END: u32 = u32::MAX;

/// Where an argument must live when the kernel runs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemType {
    #[default]
    Default,
    CpuInput,
    CpuOutput,
}

/// Immutable description of when a kernel implementation applies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KernelDef {
    pub op_name: String,
    pub domain: String,
    /// Inclusive version range.
    pub version_start: u32,
    pub version_end: u32,
    pub provider: String,
    pub type_constraints: BTreeMap<String, Vec<DType>>,
    /// `(input, output)` pairs whose storage may be shared.
    pub aliases: Vec<(usize, usize)>,
    pub input_memory: BTreeMap<usize, MemType>,
    pub output_memory: BTreeMap<usize, MemType>,
}

impl KernelDef {
    pub fn supports_version(&self, version: u32) -> bool {
        self.version_start <= version && version <= self.version_end
    }

    pub fn input_memory_type(&self, index: usize) -> MemType {
        self.input_memory.get(&index).copied().unwrap_or_default()
    }

    pub fn output_memory_type(&self, index: usize) -> MemType {
        self.output_memory.get(&index).copied().unwrap_or_default()
    }

    pub fn may_alias(&self, input: usize, output: usize) -> bool {
        self.aliases.contains(&(input, output))
    }

    /// True when some node could satisfy both definitions.
    pub fn overlaps(&self, other: &KernelDef) -> bool {
        if self.op_name != other.op_name
            || self.domain != other.domain
            || self.provider != other.provider
        {
            return false;
        }
        if self.version_end < other.version_start || other.version_end < self.version_start {
            return false;
        }
        self.type_constraints.iter().all(|(param, allowed)| {
            match other.type_constraints.get(param) {
                Some(other_allowed) => allowed.iter().any(|dtype| other_allowed.contains(dtype)),
                None => true,
            }
        })
    }

    /// Check every type constraint against the node's actual element types.
    ///
    /// Each constrained parameter is resolved through the op schema to the
    /// node arguments it types; all of them must carry a declared dtype in
    /// the allowed set.
    pub fn type_constraints_satisfied(&self, node: &Node) -> bool {
        if self.type_constraints.is_empty() {
            return true;
        }
        let Some(schema) = op_schema(&node.op_type) else {
            return false;
        };
        self.type_constraints.iter().all(|(param, allowed)| {
            let inputs = node
                .inputs
                .iter()
                .enumerate()
                .filter(|(idx, _)| schema.input_param(*idx) == Some(param.as_str()))
                .map(|(_, arg)| arg.dtype);
            let outputs = node
                .outputs
                .iter()
                .enumerate()
                .filter(|(idx, _)| schema.output_param(*idx) == Some(param.as_str()))
                .map(|(_, arg)| arg.dtype);
            let mut bound = inputs.chain(outputs).peekable();
            if bound.peek().is_none() {
                return false;
            }
            bound.all(|dtype| matches!(dtype, Some(dtype) if allowed.contains(&dtype)))
        })
    }
}

impl fmt::Display for KernelDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.op_name)?;
        if !self.domain.is_empty() {
            write!(f, "@{}", self.domain)?;
        }
        if self.version_end == OPEN_VERSION_END {
            write!(f, " v{}+", self.version_start)?;
        } else {
            write!(f, " v{}-{}", self.version_start, self.version_end)?;
        }
        for (param, allowed) in &self.type_constraints {
            let names: Vec<&str> = allowed.iter().map(|dtype| dtype.as_str()).collect();
            write!(f, " {}=[{}]", param, names.join(","))?;
        }
        write!(f, " on {}", self.provider)
    }
}

/// Fluent constructor for `KernelDef`.
///
/// ```no_run
/// # use infercore::{DType, KernelDefBuilder};
/// let def = KernelDefBuilder::new("Abs")
///     .since_version(6)
///     .type_constraint("T", &[DType::F32])
///     .build();
/// assert!(def.supports_version(13));
/// ```
#[derive(Debug, Clone)]
pub struct KernelDefBuilder {
    def: KernelDef,
}

impl KernelDefBuilder {
    pub fn new(op_name: impl Into<String>) -> Self {
        Self {
            def: KernelDef {
                op_name: op_name.into(),
                domain: ONNX_DOMAIN.to_string(),
                version_start: 1,
                version_end: OPEN_VERSION_END,
                provider: CPU_EXECUTION_PROVIDER.to_string(),
                type_constraints: BTreeMap::new(),
                aliases: Vec::new(),
                input_memory: BTreeMap::new(),
                output_memory: BTreeMap::new(),
            },
        }
    }

    pub fn domain(mut self, domain: impl Into<String>) -> Self {
        self.def.domain = domain.into();
        self
    }

    /// Open-ended range starting at `version`.
    pub fn since_version(mut self, version: u32) -> Self {
        self.def.version_start = version;
        self.def.version_end = OPEN_VERSION_END;
        self
    }

    /// Inclusive range; panics when `start > end`.
    pub fn version_range(mut self, start: u32, end: u32) -> Self {
        assert!(start <= end, "empty kernel version range {}..={}", start, end);
        self.def.version_start = start;
        self.def.version_end = end;
        self
    }

    pub fn provider(mut self, provider: impl Into<String>) -> Self {
        self.def.provider = provider.into();
        self
    }

    pub fn type_constraint(mut self, param: impl Into<String>, allowed: &[DType]) -> Self {
        let mut allowed = allowed.to_vec();
        allowed.sort();
        allowed.dedup();
        self.def.type_constraints.insert(param.into(), allowed);
        self
    }

    pub fn alias(mut self, input: usize, output: usize) -> Self {
        self.def.aliases.push((input, output));
        self
    }

    pub fn input_memory_type(mut self, index: usize, mem_type: MemType) -> Self {
        self.def.input_memory.insert(index, mem_type);
        self
    }

    pub fn output_memory_type(mut self, index: usize, mem_type: MemType) -> Self {
        self.def.output_memory.insert(index, mem_type);
        self
    }

    pub fn build(self) -> KernelDef {
        self.def
    }
}
