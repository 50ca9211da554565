use std::collections::HashMap;

use serde::{Deserialize, Serialize};

pub const CPU_ALLOCATOR: &str = "Cpu";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AllocatorKind {
    #[default]
    Device,
    Arena,
}

/// Identifies the memory pool an output buffer comes from.
///
/// Passed through unchanged from kernel construction to output allocation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AllocatorInfo {
    pub name: String,
    pub device_id: u32,
    pub kind: AllocatorKind,
}

impl AllocatorInfo {
    pub fn new(name: impl Into<String>, device_id: u32, kind: AllocatorKind) -> Self {
        Self {
            name: name.into(),
            device_id,
            kind,
        }
    }

    pub fn cpu() -> Self {
        Self::new(CPU_ALLOCATOR, 0, AllocatorKind::Device)
    }
}

impl Default for AllocatorInfo {
    fn default() -> Self {
        Self::cpu()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AllocatorStats {
    pub allocations: usize,
    pub bytes: usize,
}

/// Bytes handed out per allocator during one run.
#[derive(Debug, Clone, Default)]
pub struct AllocationStats {
    per_allocator: HashMap<AllocatorInfo, AllocatorStats>,
}

impl AllocationStats {
    pub fn record(&mut self, allocator: &AllocatorInfo, bytes: usize) {
        let stats = self.per_allocator.entry(allocator.clone()).or_default();
        stats.allocations += 1;
        stats.bytes += bytes;
    }

    pub fn get(&self, allocator: &AllocatorInfo) -> Option<&AllocatorStats> {
        self.per_allocator.get(allocator)
    }

    pub fn total_bytes(&self) -> usize {
        self.per_allocator.values().map(|stats| stats.bytes).sum()
    }
}
