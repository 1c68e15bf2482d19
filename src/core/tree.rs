//! Read-only view of a parsed firmware image.
//!
//! Building the tree (volume and file parsing, decompression, nested volume
//! recursion) is the job of an external structural parser. Exploration only
//! needs the narrow accessor set below, so any parser can be plugged in and
//! tests can drive the explorer with a synthetic [`MemoryTree`].
//!
//! [`MemoryTree`]: crate::core::memory_tree::MemoryTree

use std::fmt;

use thiserror::Error;

use crate::error::ImageInfoError;

/// Opaque handle to a node of a [`StructuralTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub usize);

impl NodeId {
    /// Handle that no tree considers valid.
    pub const INVALID: NodeId = NodeId(usize::MAX);
}

/// Structural node types produced by the parser.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeType {
    Root,
    Capsule,
    Image,
    Region,
    Padding,
    Volume,
    File,
    Section,
    FreeSpace,
    Microcode,
    Other(u8),
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeType::Root => write!(f, "Root"),
            NodeType::Capsule => write!(f, "Capsule"),
            NodeType::Image => write!(f, "Image"),
            NodeType::Region => write!(f, "Region"),
            NodeType::Padding => write!(f, "Padding"),
            NodeType::Volume => write!(f, "Volume"),
            NodeType::File => write!(f, "File"),
            NodeType::Section => write!(f, "Section"),
            NodeType::FreeSpace => write!(f, "Free space"),
            NodeType::Microcode => write!(f, "Microcode"),
            NodeType::Other(raw) => write!(f, "Other({raw})"),
        }
    }
}

/// Accessors the explorer needs from a parsed image.
///
/// Accessors on an invalid node return empty/zero values; callers that care
/// check [`StructuralTree::is_valid`] first.
pub trait StructuralTree {
    /// Top-level item of the image (capsule or image node).
    fn root(&self) -> NodeId;
    fn is_valid(&self, node: NodeId) -> bool;
    fn node_type(&self, node: NodeId) -> NodeType;
    /// Type-specific subtype (FFS file type for files, image kind for images).
    fn node_subtype(&self, node: NodeId) -> u8;
    fn header(&self, node: NodeId) -> &[u8];
    fn body(&self, node: NodeId) -> &[u8];
    fn tail(&self, node: NodeId) -> &[u8];
    /// Offset of the node from the start of the parsed buffer.
    fn base(&self, node: NodeId) -> u32;
    fn child_count(&self, node: NodeId) -> usize;
    fn child(&self, node: NodeId, index: usize) -> NodeId;
    /// Difference between flash offsets and memory-mapped addresses, as
    /// computed by the parser for the last volume it mapped.
    fn address_diff(&self) -> u64;

    /// Boot Guard security summary, if the parser found a boot policy.
    fn boot_guard_info(&self) -> Option<String> {
        None
    }

    /// Header + body + tail length.
    fn full_size(&self, node: NodeId) -> usize {
        self.header(node).len() + self.body(node).len() + self.tail(node).len()
    }

    /// Header, body and tail concatenated.
    fn full_bytes(&self, node: NodeId) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.full_size(node));
        out.extend_from_slice(self.header(node));
        out.extend_from_slice(self.body(node));
        out.extend_from_slice(self.tail(node));
        out
    }
}

/// Error raised by a structural parser.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct ParseError {
    pub message: String,
}

impl ParseError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl From<ParseError> for ImageInfoError {
    fn from(err: ParseError) -> Self {
        ImageInfoError::StructuralParse {
            message: err.message,
        }
    }
}

/// Builds a [`StructuralTree`] from raw image bytes.
pub trait StructuralParser {
    type Tree: StructuralTree;

    fn parse(&self, image: &[u8]) -> Result<Self::Tree, ParseError>;
}

impl<F, T> StructuralParser for F
where
    F: Fn(&[u8]) -> Result<T, ParseError>,
    T: StructuralTree,
{
    type Tree = T;

    fn parse(&self, image: &[u8]) -> Result<T, ParseError> {
        self(image)
    }
}
