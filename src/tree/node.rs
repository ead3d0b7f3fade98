// src/tree/node.rs
// =============================================================================
// The in-memory model of a repository's file hierarchy.
//
// A Tree is an ordered list of top-level Nodes. Directories own their children
// in the order the listing returned them (never sorted). A node's `path` is its
// identity and is unique across the whole tree.
// =============================================================================

use crate::github::EntryKind;
use serde::Serialize;

/// Files and directories share one kind enum with the remote listing
pub type NodeKind = EntryKind;

/// One file or directory in the materialized tree
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Node {
    /// Last path segment
    pub name: String,
    /// Path relative to the repository root
    pub path: String,
    pub kind: NodeKind,
    /// For files this is authoritative. For directories it only reflects the
    /// last value a front end set on it.
    pub selected: bool,
    /// `Some` for directories, `None` for files
    #[serde(skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<Node>>,
}

impl Node {
    pub fn file(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            kind: NodeKind::File,
            selected: false,
            children: None,
        }
    }

    pub fn directory(name: impl Into<String>, path: impl Into<String>, children: Vec<Node>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            kind: NodeKind::Directory,
            selected: false,
            children: Some(children),
        }
    }

    pub fn is_dir(&self) -> bool {
        self.kind == NodeKind::Directory
    }

    pub fn children(&self) -> &[Node] {
        self.children.as_deref().unwrap_or(&[])
    }

    pub fn child(&self, name: &str) -> Option<&Node> {
        self.children().iter().find(|c| c.name == name)
    }
}

/// A whole repository, top-level entries in listing order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Tree {
    pub nodes: Vec<Node>,
}

impl Tree {
    pub fn new(nodes: Vec<Node>) -> Self {
        Self { nodes }
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Looks a node up by its repository path ("src/main.rs")
    pub fn find(&self, path: &str) -> Option<&Node> {
        let mut segments = path.split('/').filter(|s| !s.is_empty());
        let first = segments.next()?;
        let mut node = self.nodes.iter().find(|n| n.name == first)?;
        for segment in segments {
            node = node.child(segment)?;
        }
        Some(node)
    }

    pub fn find_mut(&mut self, path: &str) -> Option<&mut Node> {
        let mut segments = path.split('/').filter(|s| !s.is_empty());
        let first = segments.next()?;
        let mut node = self.nodes.iter_mut().find(|n| n.name == first)?;
        for segment in segments {
            node = node
                .children
                .as_mut()?
                .iter_mut()
                .find(|n| n.name == segment)?;
        }
        Some(node)
    }

    /// Every file node in pre-order (listing order, parents before children)
    pub fn files(&self) -> Vec<&Node> {
        fn walk<'a>(nodes: &'a [Node], out: &mut Vec<&'a Node>) {
            for node in nodes {
                match &node.children {
                    Some(children) => walk(children, out),
                    None => out.push(node),
                }
            }
        }

        let mut out = Vec::new();
        walk(&self.nodes, &mut out);
        out
    }

    pub fn file_count(&self) -> usize {
        self.files().len()
    }

    pub fn dir_count(&self) -> usize {
        fn count(nodes: &[Node]) -> usize {
            nodes
                .iter()
                .filter(|n| n.is_dir())
                .map(|n| 1 + count(n.children()))
                .sum()
        }
        count(&self.nodes)
    }
}
