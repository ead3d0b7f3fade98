// src/tree/mod.rs
// =============================================================================
// The repository tree: building it from remote listings, looking nodes up,
// and tracking which files are selected.
//
// Submodules:
// - node: Node / Tree data model
// - builder: recursive listing into a Tree
// - selection: select/deselect with propagation, SelectionSet, glob filters
// =============================================================================

mod builder;
mod node;
mod selection;

pub use builder::{is_materialized, TreeBuilder, DEFAULT_CONCURRENCY, EXCLUDED_DIR};
pub use node::{Node, NodeKind, Tree};
pub use selection::{recompute_selection_set, PathFilter, SelectionSet};
