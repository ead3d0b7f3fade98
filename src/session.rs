// src/session.rs
// =============================================================================
// One repository session: the tree, the selection and the content cache for
// the repository the user is currently looking at.
//
// Everything lives in this one value owned by the caller. Pointing at another
// repository is an explicit reset() that throws all three away.
//
// Loads can run outside the session (for example in a spawned task). A
// LoadTicket remembers which session generation started the load, and
// finish_load() refuses a tree from a generation that has since been reset,
// so an old repository's tree can never land in a new session.
// =============================================================================

use crate::combine::{self, CombineOptions, ContentCache};
use crate::error::{Error, Result};
use crate::github::{RemoteListing, RepoRef};
use crate::tree::{recompute_selection_set, PathFilter, SelectionSet, Tree, TreeBuilder};
use tracing::{debug, info, warn};

/// Proof of which session generation started a tree load
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadTicket {
    generation: u64,
    repo: RepoRef,
}

#[derive(Debug)]
pub struct Session {
    repo: RepoRef,
    tree: Tree,
    selection: SelectionSet,
    cache: ContentCache,
    generation: u64,
}

impl Session {
    pub fn new(repo: RepoRef) -> Self {
        Self {
            repo,
            tree: Tree::default(),
            selection: SelectionSet::default(),
            cache: ContentCache::new(),
            generation: 0,
        }
    }

    pub fn repo(&self) -> &RepoRef {
        &self.repo
    }

    pub fn tree(&self) -> &Tree {
        &self.tree
    }

    pub fn selection(&self) -> &SelectionSet {
        &self.selection
    }

    pub fn cache(&self) -> &ContentCache {
        &self.cache
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Switches to another repository and drops tree, selection and cache
    pub fn reset(&mut self, repo: RepoRef) {
        info!(from = %self.repo, to = %repo, "resetting session");
        self.repo = repo;
        self.tree = Tree::default();
        self.selection = SelectionSet::default();
        self.cache.clear();
        self.generation += 1;
    }

    pub fn begin_load(&self) -> LoadTicket {
        LoadTicket {
            generation: self.generation,
            repo: self.repo.clone(),
        }
    }

    /// Installs a freshly built tree, unless the session moved on meanwhile
    pub fn finish_load(&mut self, ticket: LoadTicket, tree: Tree) -> Result<()> {
        if ticket.generation != self.generation || ticket.repo != self.repo {
            warn!(repo = %ticket.repo, "discarding tree from a previous session");
            return Err(Error::StaleSession);
        }

        self.selection = recompute_selection_set(&tree);
        self.tree = tree;
        Ok(())
    }

    /// Lists the whole repository through `client` and installs the tree
    pub async fn load(&mut self, client: &dyn RemoteListing, concurrency: usize) -> Result<()> {
        let ticket = self.begin_load();
        let tree = TreeBuilder::new(client)
            .with_concurrency(concurrency)
            .build()
            .await?;
        self.finish_load(ticket, tree)
    }

    pub fn set_selected(&mut self, path: &str, value: bool) -> Result<&SelectionSet> {
        self.selection = self.tree.set_selected(path, value)?;
        Ok(&self.selection)
    }

    pub fn select_matching(&mut self, filter: &PathFilter) -> &SelectionSet {
        self.selection = self.tree.select_matching(filter);
        &self.selection
    }

    /// Copy of the current selection, so a combine is not affected by later toggles
    pub fn snapshot_selection(&self) -> SelectionSet {
        self.selection.clone()
    }

    /// Combines the current selection using this session's cache
    pub async fn combine(&mut self, client: &dyn RemoteListing, options: &CombineOptions) -> Result<String> {
        let selection = self.snapshot_selection();
        debug!(files = selection.len(), cached = self.cache.len(), "combining selection");
        combine::combine(client, &selection, &mut self.cache, options).await
    }
}

// BEGINNER NOTES:
//
// 1. What is a generation counter?
//    - A number that goes up every time the session is reset
//    - begin_load() remembers the current number in a LoadTicket
//    - finish_load() compares it again; a mismatch means the user moved on
//    - The old tree is thrown away instead of overwriting the new session
//
// 2. Why snapshot_selection()?
//    - combine() works on a copy (clone) of the selection
//    - Toggling files later does not change a combine already running
//
// 3. Why does combine take &mut self?
//    - It writes into the session's cache
//    - Rust allows only one &mut borrow at a time, so a reset cannot
//      happen in the middle of a combine
