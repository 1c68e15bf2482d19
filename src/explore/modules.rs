//! Collection of boot-critical FFS files (PEI/DXE cores, PEIMs, drivers).

use tracing::{debug, trace};

use crate::core::guid::GuidDatabase;
use crate::core::report::ModuleInfo;
use crate::core::tree::{NodeId, NodeType, StructuralTree};
use crate::error::{ImageInfoError, Result};
use crate::formats::uefi::{format_checksum, FfsFileHeader, ModuleKind};

/// Per-traversal values that are not stored in the tree nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TraversalContext {
    /// Offset added to a node base to get its memory-mapped address.
    pub address_diff: u64,
}

impl TraversalContext {
    pub fn from_tree<T: StructuralTree + ?Sized>(tree: &T) -> Self {
        Self {
            address_diff: tree.address_diff(),
        }
    }
}

/// Depth-first collector; see [`collect_modules`].
pub struct ModuleCollector<'a, T: ?Sized, G: ?Sized> {
    tree: &'a T,
    names: &'a G,
    context: TraversalContext,
    modules: Vec<ModuleInfo>,
}

impl<'a, T, G> ModuleCollector<'a, T, G>
where
    T: StructuralTree + ?Sized,
    G: GuidDatabase + ?Sized,
{
    pub fn new(tree: &'a T, names: &'a G, context: TraversalContext) -> Self {
        Self {
            tree,
            names,
            context,
            modules: Vec::new(),
        }
    }

    pub fn collect(mut self, start: NodeId) -> Result<Vec<ModuleInfo>> {
        self.visit(start)?;
        Ok(self.modules)
    }

    fn visit(&mut self, node: NodeId) -> Result<()> {
        if !self.tree.is_valid(node) {
            return Err(ImageInfoError::InvalidNode {
                context: "collecting module metadata".to_string(),
            });
        }

        if self.tree.node_type(node) == NodeType::File {
            if let Some(kind) = ModuleKind::from_file_type(self.tree.node_subtype(node)) {
                // Sections inside a module are not listed separately.
                let module = self.describe(node, kind)?;
                trace!(kind = ?kind, guid = %module.guid, base = module.base, "module");
                self.modules.push(module);
                return Ok(());
            }
        }

        for index in 0..self.tree.child_count(node) {
            let child = self.tree.child(node, index);
            self.visit(child)?;
        }
        Ok(())
    }

    fn describe(&self, node: NodeId, kind: ModuleKind) -> Result<ModuleInfo> {
        let tree = self.tree;
        let bytes = tree.full_bytes(node);
        let header = FfsFileHeader::parse(&bytes)?;
        let guid = header.guid();
        let base = tree.base(node);
        let data_address = self
            .context
            .address_diff
            .wrapping_add(u64::from(base))
            .wrapping_add(tree.header(node).len() as u64);

        Ok(ModuleInfo {
            kind,
            name: self.names.display_name(&guid),
            guid,
            base,
            data_address,
            attributes: u32::from(header.attributes),
            size: u32::try_from(bytes.len()).unwrap_or(u32::MAX),
            header_checksum: format_checksum(header.header_checksum),
            data_checksum: format_checksum(header.file_checksum),
        })
    }
}

/// Lists matched modules in pre-order, starting at the tree root. A matched
/// file's children are not visited. Any invalid node aborts the walk and
/// nothing collected so far is returned.
pub fn collect_modules<T, G>(tree: &T, names: &G) -> Result<Vec<ModuleInfo>>
where
    T: StructuralTree + ?Sized,
    G: GuidDatabase + ?Sized,
{
    let context = TraversalContext::from_tree(tree);
    let modules = ModuleCollector::new(tree, names, context).collect(tree.root())?;
    debug!(count = modules.len(), "modules collected");
    Ok(modules)
}
