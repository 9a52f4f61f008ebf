//! Path reconstruction over the directory graph.
//!
//! The walk is depth-first pre-order from [`ROOT_INODE_ID`], with children in
//! adjacency order. It uses an explicit work stack, so namespace depth is
//! bounded only by memory.

use fsimage_types::{InodeId, InodeRecord, ROOT_INODE_ID, name_to_text};

use crate::directory::Adjacency;
use crate::inode::InodeMap;

/// An inode together with its reconstructed absolute path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedInode<'a> {
    pub path: String,
    pub record: &'a InodeRecord,
}

#[derive(Debug)]
struct Frame {
    id: InodeId,
    path: String,
}

/// Lazy pre-order iterator over every reachable inode that has a record.
///
/// An id listed as a child but missing from the inode map yields nothing,
/// but its own children are still visited, with the missing name treated as
/// empty. The graph is assumed to be a tree below the root.
#[derive(Debug)]
pub struct NamespaceWalker<'a> {
    inodes: &'a InodeMap,
    adjacency: &'a Adjacency,
    stack: Vec<Frame>,
}

impl<'a> NamespaceWalker<'a> {
    #[must_use]
    pub fn new(inodes: &'a InodeMap, adjacency: &'a Adjacency) -> Self {
        Self::from_root(inodes, adjacency, ROOT_INODE_ID)
    }

    /// Walk the subtree below `root`, which is rendered as `/`.
    #[must_use]
    pub fn from_root(inodes: &'a InodeMap, adjacency: &'a Adjacency, root: InodeId) -> Self {
        Self {
            inodes,
            adjacency,
            stack: vec![Frame {
                id: root,
                path: "/".to_owned(),
            }],
        }
    }

    fn push_children(&mut self, frame: &Frame) {
        let children = self.adjacency.children(frame.id);
        self.stack.reserve(children.len());
        for &child in children.iter().rev() {
            let name = self
                .inodes
                .get(child)
                .map(|record| name_to_text(&record.name))
                .unwrap_or_default();
            self.stack.push(Frame {
                id: child,
                path: child_path(&frame.path, &name),
            });
        }
    }
}

impl<'a> Iterator for NamespaceWalker<'a> {
    type Item = ResolvedInode<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(frame) = self.stack.pop() {
            self.push_children(&frame);
            if let Some(record) = self.inodes.get(frame.id) {
                return Some(ResolvedInode {
                    path: frame.path,
                    record,
                });
            }
        }
        None
    }
}

/// Join an escaped child name onto its parent's path.
#[must_use]
pub fn child_path(parent: &str, name: &str) -> String {
    if parent == "/" {
        format!("/{name}")
    } else {
        format!("{parent}/{name}")
    }
}
