//! `INODE_DIR` section: parent → ordered children.
//!
//! Unlike the string and inode sections there is no header record. Each
//! `DirEntry` is `{parent = 1, children = 2 (repeated uint64), refChildren = 3}`.
//! Large directories are split across several entries with the same parent.

use hashbrown::HashMap;

use fsimage_error::Result;
use fsimage_types::{DirectoryEdge, INODE_DIR_SECTION, InodeId, MessageReader};
use tracing::info;

use crate::scanner::{ScanStats, scan_records};

/// Merged directory graph.
#[derive(Debug, Clone, Default)]
pub struct Adjacency {
    children: HashMap<InodeId, Vec<InodeId>>,
    edges: usize,
}

impl Adjacency {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode a whole `INODE_DIR` section.
    pub fn decode(section: &[u8]) -> Result<(Self, ScanStats)> {
        let mut adjacency = Self::new();
        let stats = scan_records(INODE_DIR_SECTION, section, 0, |record| {
            adjacency.add_edge(decode_dir_entry(record)?);
            Ok(())
        })?;
        info!(
            section = INODE_DIR_SECTION,
            parents = adjacency.parent_count(),
            edges = adjacency.edge_count(),
            skipped = stats.skipped,
            "directory section decoded"
        );
        Ok((adjacency, stats))
    }

    /// Append `edge.children_ids` after any children already known for the
    /// parent.
    pub fn add_edge(&mut self, edge: DirectoryEdge) {
        self.edges += edge.children_ids.len();
        self.children
            .entry(edge.parent_id)
            .or_default()
            .extend(edge.children_ids);
    }

    /// Children of `parent` in insertion order; empty if none are listed.
    #[must_use]
    pub fn children(&self, parent: InodeId) -> &[InodeId] {
        self.children.get(&parent).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Number of distinct parents.
    #[must_use]
    pub fn parent_count(&self) -> usize {
        self.children.len()
    }

    /// Number of parent → child links.
    #[must_use]
    pub const fn edge_count(&self) -> usize {
        self.edges
    }
}

/// Decode one `DirEntry`. `refChildren` is ignored.
pub fn decode_dir_entry(record: &[u8]) -> Result<DirectoryEdge> {
    let mut edge = DirectoryEdge::default();
    for field in MessageReader::new(record) {
        let field = field?;
        match field.number {
            1 => edge.parent_id = field.value.as_u64("parent")?,
            2 => field.value.extend_u64s("children", &mut edge.children_ids)?,
            _ => {}
        }
    }
    Ok(edge)
}
