//! Core graph data types.
//!
//! A graph owns its nodes in an index-stable arena: removing a node leaves a
//! hole so every surviving `NodeIndex` keeps pointing at the same node.
//! Edges are implicit; a consumer references a producer's output by argument
//! name.
use std::collections::{HashMap, HashSet};

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::ONNX_DOMAIN;
use crate::error::CoreError;
use crate::tensor::DType;

use super::attrs::FromAttr;

/// Attribute value attached to a node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AttrValue {
    Float(f32),
    Int(i64),
    Str(String),
    Floats(Vec<f32>),
    Ints(Vec<i64>),
    Strs(Vec<String>),
    DType(DType),
}

impl AttrValue {
    pub fn kind(&self) -> &'static str {
        match self {
            AttrValue::Float(_) => "float",
            AttrValue::Int(_) => "int",
            AttrValue::Str(_) => "string",
            AttrValue::Floats(_) => "floats",
            AttrValue::Ints(_) => "ints",
            AttrValue::Strs(_) => "strings",
            AttrValue::DType(_) => "dtype",
        }
    }
}

/// Named attribute for an op invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpAttr {
    pub name: String,
    pub value: AttrValue,
}

/// Collection of op attributes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OpAttrs {
    pub items: Vec<OpAttr>,
}

impl OpAttrs {
    /// Build an empty attribute set.
    pub fn none() -> Self {
        Self { items: Vec::new() }
    }

    pub fn get(&self, name: &str) -> Option<&AttrValue> {
        self.items
            .iter()
            .find(|attr| attr.name == name)
            .map(|attr| &attr.value)
    }

    /// Insert or replace an attribute.
    pub fn set(&mut self, name: impl Into<String>, value: AttrValue) {
        let name = name.into();
        match self.items.iter_mut().find(|attr| attr.name == name) {
            Some(attr) => attr.value = value,
            None => self.items.push(OpAttr { name, value }),
        }
    }
}

/// Stable position of a node inside its graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeIndex(pub usize);

impl std::fmt::Display for NodeIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A named, optionally typed value flowing along graph edges.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeArg {
    pub name: String,
    pub dtype: Option<DType>,
    pub shape: Option<Vec<usize>>,
}

impl NodeArg {
    pub fn new(name: impl Into<String>, dtype: DType) -> Self {
        Self {
            name: name.into(),
            dtype: Some(dtype),
            shape: None,
        }
    }

    pub fn untyped(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            dtype: None,
            shape: None,
        }
    }

    pub fn with_shape(mut self, shape: &[usize]) -> Self {
        self.shape = Some(shape.to_vec());
        self
    }
}

/// A graph vertex: one operator invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    pub index: NodeIndex,
    pub uuid: Uuid,
    pub name: String,
    pub op_type: String,
    pub domain: String,
    pub since_version: u32,
    pub inputs: Vec<NodeArg>,
    pub outputs: Vec<NodeArg>,
    /// Execution provider assigned to this node, if any.
    pub provider: Option<String>,
    pub attrs: OpAttrs,
}

impl Node {
    pub fn input_defs(&self) -> &[NodeArg] {
        &self.inputs
    }

    pub fn output_defs(&self) -> &[NodeArg] {
        &self.outputs
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_version(mut self, version: u32) -> Self {
        self.since_version = version;
        self
    }

    pub fn with_domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = domain.into();
        self
    }

    pub fn with_provider(mut self, provider: impl Into<String>) -> Self {
        self.provider = Some(provider.into());
        self
    }

    pub fn with_attr(mut self, name: impl Into<String>, value: AttrValue) -> Self {
        self.attrs.set(name, value);
        self
    }

    /// Substitute input defs by name. Returns true if any input changed.
    pub fn replace_defs(&mut self, replacements: &HashMap<String, NodeArg>) -> bool {
        let mut changed = false;
        for input in &mut self.inputs {
            if let Some(replacement) = replacements.get(&input.name) {
                *input = replacement.clone();
                changed = true;
            }
        }
        changed
    }

    pub fn consumes(&self, name: &str) -> bool {
        self.inputs.iter().any(|arg| arg.name == name)
    }

    /// Fetch a single typed attribute.
    pub fn get_attr<T: FromAttr>(&self, name: &str) -> Result<T> {
        let value = self.attr_value(name)?;
        T::from_attr(value).ok_or_else(|| self.attr_type_error(name, T::KIND))
    }

    /// Fetch a repeated typed attribute.
    pub fn get_attrs<T: FromAttr>(&self, name: &str) -> Result<Vec<T>> {
        let value = self.attr_value(name)?;
        T::from_attrs(value).ok_or_else(|| self.attr_type_error(name, T::LIST_KIND))
    }

    fn attr_value(&self, name: &str) -> Result<&AttrValue> {
        self.attrs.get(name).ok_or_else(|| {
            CoreError::MissingAttribute {
                node: self.name.clone(),
                name: name.to_string(),
            }
            .into()
        })
    }

    fn attr_type_error(&self, name: &str, expected: &'static str) -> anyhow::Error {
        CoreError::AttributeType {
            node: self.name.clone(),
            name: name.to_string(),
            expected,
        }
        .into()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Graph {
    pub name: String,
    pub inputs: Vec<NodeArg>,
    pub outputs: Vec<NodeArg>,
    pub initializers: Vec<NodeArg>,
    nodes: Vec<Option<Node>>,
}

impl Graph {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn add_input(&mut self, arg: NodeArg) {
        self.inputs.push(arg);
    }

    pub fn add_output(&mut self, arg: NodeArg) {
        self.outputs.push(arg);
    }

    pub fn add_initializer(&mut self, arg: NodeArg) {
        self.initializers.push(arg);
    }

    /// Allocate a node with the next free index and a fresh UUID.
    pub fn make_node(
        &self,
        op_type: impl Into<String>,
        inputs: Vec<NodeArg>,
        outputs: Vec<NodeArg>,
    ) -> Node {
        let index = NodeIndex(self.nodes.len());
        let op_type = op_type.into();
        Node {
            index,
            uuid: Uuid::new_v4(),
            name: format!("{}_{}", op_type, index.0),
            op_type,
            domain: ONNX_DOMAIN.to_string(),
            since_version: 1,
            inputs,
            outputs,
            provider: None,
            attrs: OpAttrs::none(),
        }
    }

    /// Insert a node built by `make_node`.
    pub fn add_node(&mut self, mut node: Node) -> NodeIndex {
        let index = NodeIndex(self.nodes.len());
        node.index = index;
        self.nodes.push(Some(node));
        index
    }

    pub fn node(&self, index: NodeIndex) -> Option<&Node> {
        self.nodes.get(index.0).and_then(Option::as_ref)
    }

    pub fn node_mut(&mut self, index: NodeIndex) -> Option<&mut Node> {
        self.nodes.get_mut(index.0).and_then(Option::as_mut)
    }

    /// Live nodes in index order.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter().filter_map(Option::as_ref)
    }

    pub fn node_indices(&self) -> Vec<NodeIndex> {
        self.nodes().map(|node| node.index).collect()
    }

    pub fn node_count(&self) -> usize {
        self.nodes().count()
    }

    pub fn find_node(&self, name: &str) -> Option<&Node> {
        self.nodes().find(|node| node.name == name)
    }

    pub fn producer_of(&self, arg: &str) -> Option<NodeIndex> {
        self.nodes()
            .find(|node| node.outputs.iter().any(|out| out.name == arg))
            .map(|node| node.index)
    }

    pub fn consumers_of(&self, arg: &str) -> Vec<NodeIndex> {
        self.nodes()
            .filter(|node| node.consumes(arg))
            .map(|node| node.index)
            .collect()
    }

    /// Nodes consuming any output of `index`.
    pub fn output_nodes(&self, index: NodeIndex) -> Vec<NodeIndex> {
        let Some(node) = self.node(index) else {
            return Vec::new();
        };
        let outputs: HashSet<&str> = node.outputs.iter().map(|arg| arg.name.as_str()).collect();
        self.nodes()
            .filter(|other| other.inputs.iter().any(|arg| outputs.contains(arg.name.as_str())))
            .map(|other| other.index)
            .collect()
    }

    /// Nodes producing any input of `index`.
    pub fn input_nodes(&self, index: NodeIndex) -> Vec<NodeIndex> {
        let Some(node) = self.node(index) else {
            return Vec::new();
        };
        let mut producers = Vec::new();
        for arg in &node.inputs {
            if let Some(producer) = self.producer_of(&arg.name) {
                if !producers.contains(&producer) {
                    producers.push(producer);
                }
            }
        }
        producers
    }

    pub fn is_graph_output(&self, arg: &str) -> bool {
        self.outputs.iter().any(|out| out.name == arg)
    }

    pub fn remove_node(&mut self, index: NodeIndex) -> Result<Node> {
        self.nodes
            .get_mut(index.0)
            .and_then(Option::take)
            .ok_or_else(|| CoreError::invalid_graph(format!("no node at {}", index)).into())
    }

    /// Check that every node sits at the index it records and that every node
    /// input and graph output resolves to a value.
    pub fn validate(&self) -> Result<()> {
        for (slot, node) in self.nodes.iter().enumerate() {
            if let Some(node) = node {
                if node.index.0 != slot {
                    return Err(CoreError::invalid_graph(format!(
                        "node {} records index {} but sits at {}",
                        node.name, node.index, slot
                    ))
                    .into());
                }
            }
        }
        let mut available: HashSet<&str> = self
            .inputs
            .iter()
            .chain(self.initializers.iter())
            .map(|arg| arg.name.as_str())
            .collect();
        for node in self.nodes() {
            for out in &node.outputs {
                if !available.insert(out.name.as_str()) {
                    return Err(CoreError::invalid_graph(format!(
                        "{} is defined more than once",
                        out.name
                    ))
                    .into());
                }
            }
        }
        for node in self.nodes() {
            for input in &node.inputs {
                if !available.contains(input.name.as_str()) {
                    return Err(CoreError::invalid_graph(format!(
                        "node {} reads undefined value {}",
                        node.name, input.name
                    ))
                    .into());
                }
            }
        }
        for out in &self.outputs {
            if !available.contains(out.name.as_str()) {
                return Err(anyhow!(CoreError::invalid_graph(format!(
                    "graph output {} is never produced",
                    out.name
                ))));
            }
        }
        Ok(())
    }
}
