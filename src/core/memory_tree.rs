//! In-memory [`StructuralTree`] built node by node.
//!
//! Used by tests and benchmarks, and by callers whose parser already produced
//! owned node data and just needs an adapter.

use crate::core::tree::{NodeId, NodeType, StructuralTree};

/// One node of a [`MemoryTree`].
#[derive(Debug, Clone)]
pub struct MemoryNode {
    pub node_type: NodeType,
    pub subtype: u8,
    pub header: Vec<u8>,
    pub body: Vec<u8>,
    pub tail: Vec<u8>,
    pub base: u32,
    children: Vec<NodeId>,
}

impl MemoryNode {
    pub fn new(node_type: NodeType, subtype: u8) -> Self {
        Self {
            node_type,
            subtype,
            header: Vec::new(),
            body: Vec::new(),
            tail: Vec::new(),
            base: 0,
            children: Vec::new(),
        }
    }

    pub fn with_header(mut self, header: impl Into<Vec<u8>>) -> Self {
        self.header = header.into();
        self
    }

    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    pub fn with_tail(mut self, tail: impl Into<Vec<u8>>) -> Self {
        self.tail = tail.into();
        self
    }

    pub fn with_base(mut self, base: u32) -> Self {
        self.base = base;
        self
    }
}

/// Arena-backed tree. The first node added with [`MemoryTree::add_root`] is
/// the root.
#[derive(Debug, Clone, Default)]
pub struct MemoryTree {
    nodes: Vec<MemoryNode>,
    root: Option<NodeId>,
    address_diff: u64,
    boot_guard_info: Option<String>,
}

impl MemoryTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_root(&mut self, node: MemoryNode) -> NodeId {
        let id = self.push(node);
        self.root.get_or_insert(id);
        id
    }

    pub fn add_child(&mut self, parent: NodeId, node: MemoryNode) -> NodeId {
        let id = self.push(node);
        if let Some(p) = self.nodes.get_mut(parent.0) {
            p.children.push(id);
        }
        id
    }

    /// Appends a child slot that resolves to no node, as a broken parser
    /// model would hand out.
    pub fn add_dangling_child(&mut self, parent: NodeId) {
        if let Some(p) = self.nodes.get_mut(parent.0) {
            p.children.push(NodeId::INVALID);
        }
    }

    pub fn set_address_diff(&mut self, diff: u64) {
        self.address_diff = diff;
    }

    pub fn set_boot_guard_info(&mut self, info: impl Into<String>) {
        self.boot_guard_info = Some(info.into());
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    fn push(&mut self, node: MemoryNode) -> NodeId {
        self.nodes.push(node);
        NodeId(self.nodes.len() - 1)
    }

    fn get(&self, node: NodeId) -> Option<&MemoryNode> {
        self.nodes.get(node.0)
    }
}

impl StructuralTree for MemoryTree {
    fn root(&self) -> NodeId {
        self.root.unwrap_or(NodeId::INVALID)
    }

    fn is_valid(&self, node: NodeId) -> bool {
        node.0 < self.nodes.len()
    }

    fn node_type(&self, node: NodeId) -> NodeType {
        self.get(node).map_or(NodeType::Other(0), |n| n.node_type)
    }

    fn node_subtype(&self, node: NodeId) -> u8 {
        self.get(node).map_or(0, |n| n.subtype)
    }

    fn header(&self, node: NodeId) -> &[u8] {
        self.get(node).map(|n| n.header.as_slice()).unwrap_or(&[])
    }

    fn body(&self, node: NodeId) -> &[u8] {
        self.get(node).map(|n| n.body.as_slice()).unwrap_or(&[])
    }

    fn tail(&self, node: NodeId) -> &[u8] {
        self.get(node).map(|n| n.tail.as_slice()).unwrap_or(&[])
    }

    fn base(&self, node: NodeId) -> u32 {
        self.get(node).map_or(0, |n| n.base)
    }

    fn child_count(&self, node: NodeId) -> usize {
        self.get(node).map_or(0, |n| n.children.len())
    }

    fn child(&self, node: NodeId, index: usize) -> NodeId {
        self.get(node)
            .and_then(|n| n.children.get(index).copied())
            .unwrap_or(NodeId::INVALID)
    }

    fn address_diff(&self) -> u64 {
        self.address_diff
    }

    fn boot_guard_info(&self) -> Option<String> {
        self.boot_guard_info.clone()
    }
}
