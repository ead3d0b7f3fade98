// src/tree/selection.rs
// =============================================================================
// Selection state on top of the tree.
//
// Rules:
// - Selecting or deselecting a directory sets the same value on every node
//   below it. Whatever the children had before is overwritten.
// - Toggling a file changes only that file.
// - The SelectionSet (the paths that will be combined) is always rebuilt by
//   walking the whole tree. It is never patched in place, so it cannot drift
//   from the node flags.
// =============================================================================

use crate::error::{Error, Result};
use crate::tree::node::{Node, Tree};
use globset::{Glob, GlobSet, GlobSetBuilder};
use std::collections::BTreeSet;

impl Node {
    /// Sets `selected` on this node and, for directories, on every descendant
    pub fn set_selected(&mut self, value: bool) {
        self.selected = value;
        if let Some(children) = &mut self.children {
            for child in children {
                child.set_selected(value);
            }
        }
    }
}

/// Paths of the selected files, iterated in lexicographic order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionSet {
    paths: BTreeSet<String>,
}

impl SelectionSet {
    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    pub fn contains(&self, path: &str) -> bool {
        self.paths.contains(path)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.paths.iter().map(String::as_str)
    }
}

impl FromIterator<String> for SelectionSet {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        Self {
            paths: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a SelectionSet {
    type Item = &'a String;
    type IntoIter = std::collections::btree_set::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.paths.iter()
    }
}

/// Walks the whole tree and collects every selected file path.
/// Directories are never part of the result.
pub fn recompute_selection_set(tree: &Tree) -> SelectionSet {
    SelectionSet {
        paths: tree
            .files()
            .into_iter()
            .filter(|n| n.selected)
            .map(|n| n.path.clone())
            .collect(),
    }
}

/// Include/exclude glob patterns over repository paths.
///
/// `*` also matches across `/`, so `*.rs` picks up `src/main.rs`.
/// No include patterns means "everything".
#[derive(Debug, Clone)]
pub struct PathFilter {
    include: Option<GlobSet>,
    exclude: GlobSet,
}

impl PathFilter {
    pub fn new<S: AsRef<str>>(include: &[S], exclude: &[S]) -> Result<Self> {
        let include = if include.is_empty() {
            None
        } else {
            Some(build_globset(include)?)
        };

        Ok(Self {
            include,
            exclude: build_globset(exclude)?,
        })
    }

    /// A filter that matches every path
    pub fn all() -> Self {
        Self {
            include: None,
            exclude: GlobSet::empty(),
        }
    }

    pub fn matches(&self, path: &str) -> bool {
        let included = self.include.as_ref().map_or(true, |set| set.is_match(path));
        included && !self.exclude.is_match(path)
    }
}

fn build_globset<S: AsRef<str>>(patterns: &[S]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let pattern = pattern.as_ref();
        let glob = Glob::new(pattern)
            .map_err(|e| Error::InvalidPattern(format!("{}: {}", pattern, e)))?;
        builder.add(glob);
    }
    builder
        .build()
        .map_err(|e| Error::InvalidPattern(e.to_string()))
}

impl Tree {
    /// Selects or deselects the node at `path` and returns the fresh selection
    pub fn set_selected(&mut self, path: &str, value: bool) -> Result<SelectionSet> {
        let node = self
            .find_mut(path)
            .ok_or_else(|| Error::UnknownPath(path.to_string()))?;
        node.set_selected(value);
        Ok(recompute_selection_set(self))
    }

    /// Replaces the selection with every file matching `filter`.
    ///
    /// Directory flags are set to true only when every file below them ended
    /// up selected, so a front end drawing checkboxes shows the right state.
    pub fn select_matching(&mut self, filter: &PathFilter) -> SelectionSet {
        fn apply(nodes: &mut [Node], filter: &PathFilter) -> bool {
            let mut all_selected = true;
            for node in nodes {
                match &mut node.children {
                    Some(children) => {
                        let has_files = has_files(children);
                        let selected = apply(children, filter) && has_files;
                        node.selected = selected;
                        all_selected &= selected || !has_files;
                    }
                    None => {
                        node.selected = filter.matches(&node.path);
                        all_selected &= node.selected;
                    }
                }
            }
            all_selected
        }

        fn has_files(nodes: &[Node]) -> bool {
            nodes
                .iter()
                .any(|n| n.children.as_deref().map_or(true, has_files))
        }

        apply(&mut self.nodes, filter);
        recompute_selection_set(self)
    }
}
