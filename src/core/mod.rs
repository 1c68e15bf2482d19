//! Core types for firmware image exploration: the parsed-tree abstraction,
//! GUID helpers and the report model with its on-disk form.

pub mod guid;
pub mod memory_tree;
pub mod report;
pub mod schema;
pub mod tree;

pub use report::{
    AccessGrant, CapsuleInfo, FlashDescriptorInfo, ImageLayout, IntelImageInfo, MasterAccess,
    MasterSectionV1, MasterSectionV2, ModuleInfo, RegionAccess, RegionEntry, Report,
    UefiImageInfo,
};
pub use tree::{NodeId, NodeType, ParseError, StructuralParser, StructuralTree};
