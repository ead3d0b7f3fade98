// src/tree/builder.rs
// =============================================================================
// Builds the full repository tree by listing every directory recursively.
//
// How it works:
// 1. List the repository root
// 2. Drop hidden entries (".git", ".github", ...) and node_modules
// 3. For every directory left, list it too (and so on, depth-first)
// 4. Only when everything is listed do we hand back a Tree
//
// One directory = one network round trip, so this is the slow part. Sibling
// directories are listed concurrently, but results are collected in listing
// order, so the tree is the same no matter which request finishes first.
// A single semaphore caps how many listings are in flight across the whole
// tree, not per level.
// =============================================================================

use crate::error::{Error, Result};
use crate::github::{EntryKind, RemoteEntry, RemoteListing};
use crate::tree::node::{Node, Tree};
use futures::future::BoxFuture;
use futures::stream::{self, StreamExt, TryStreamExt};
use futures::FutureExt;
use std::time::Instant;
use tokio::sync::Semaphore;
use tracing::{debug, info, instrument};

/// Directory name that is never materialized
pub const EXCLUDED_DIR: &str = "node_modules";

/// Default number of directory listings in flight at once
pub const DEFAULT_CONCURRENCY: usize = 8;

/// Hidden entries and node_modules never make it into the tree
pub fn is_materialized(name: &str) -> bool {
    !name.starts_with('.') && name != EXCLUDED_DIR
}

pub struct TreeBuilder<'a> {
    client: &'a dyn RemoteListing,
    concurrency: usize,
    // Shared by every level of the recursion
    permits: Semaphore,
}

impl<'a> TreeBuilder<'a> {
    pub fn new(client: &'a dyn RemoteListing) -> Self {
        Self {
            client,
            concurrency: DEFAULT_CONCURRENCY,
            permits: Semaphore::new(DEFAULT_CONCURRENCY),
        }
    }

    /// How many directory listings may run at once (1 = fully sequential)
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self.permits = Semaphore::new(self.concurrency);
        self
    }

    /// Lists the whole repository. Any failed listing aborts the build.
    #[instrument(skip(self), fields(concurrency = self.concurrency))]
    pub async fn build(&self) -> Result<Tree> {
        let start = Instant::now();
        let tree = Tree::new(self.build_dir(String::new()).await?);

        info!(
            files = tree.file_count(),
            dirs = tree.dir_count(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "repository tree built"
        );
        Ok(tree)
    }

    // Recursive async functions need a boxed future
    fn build_dir(&self, path: String) -> BoxFuture<'_, Result<Vec<Node>>> {
        async move {
            let entries: Vec<RemoteEntry> = self
                .list(&path)
                .await?
                .into_iter()
                .filter(|entry| is_materialized(&entry.name))
                .collect();

            debug!(path = %path, entries = entries.len(), "listing filtered");

            // buffered() (not buffer_unordered) keeps the listing order
            stream::iter(entries.into_iter().map(|entry| self.build_node(entry)))
                .buffered(self.concurrency)
                .try_collect()
                .await
        }
        .boxed()
    }

    // Holds a permit only for the request itself, never while recursing,
    // otherwise parents would starve their own children
    async fn list(&self, path: &str) -> Result<Vec<RemoteEntry>> {
        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|_| Error::UnexpectedResponse("listing semaphore closed".to_string()))?;
        self.client.list_directory(path).await
    }

    async fn build_node(&self, entry: RemoteEntry) -> Result<Node> {
        match entry.kind {
            EntryKind::Directory => {
                let children = self.build_dir(entry.path.clone()).await?;
                Ok(Node::directory(entry.name, entry.path, children))
            }
            EntryKind::File => Ok(Node::file(entry.name, entry.path)),
        }
    }
}

// BEGINNER NOTES:
//
// 1. Why BoxFuture?
//    - An async fn returns an anonymous future type
//    - If that future awaits itself, the type would contain itself (infinite size)
//    - .boxed() puts the inner future on the heap, which breaks the cycle
//
// 2. buffered vs buffer_unordered
//    - Both run up to n futures at the same time
//    - buffer_unordered(n) yields whichever finishes first
//    - buffered(n) yields them in the order they went in
//    - We want GitHub's listing order, so buffered it is
//
// 3. Why a Semaphore on top of buffered?
//    - buffered(n) only limits the children of one directory
//    - Every child runs its own buffered(n), so deep trees would multiply
//    - The semaphore holds `concurrency` permits shared by all levels
//    - `_permit` is dropped at the end of list(), freeing the slot
//
// 4. What is the ? after .await?
//    - list_directory returns a Result
//    - ? hands an Err straight back to our caller, so one failed listing
//      stops the whole build (try_collect stops the siblings too)

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeRemote;
    use std::time::Duration;

    fn remote() -> FakeRemote {
        FakeRemote::new()
            .with_file("README.md", b"# demo")
            .with_file("src/main.rs", b"fn main() {}")
            .with_file("src/util/mod.rs", b"")
            .with_file(".gitignore", b"target")
            .with_file(".github/workflows/ci.yml", b"on: push")
            .with_file("node_modules/left-pad/index.js", b"")
            .with_file("docs/guide.md", b"guide")
            .with_file("a.txt", b"a")
    }

    #[tokio::test]
    async fn test_build_filters_hidden_and_excluded() {
        let remote = remote();
        let tree = TreeBuilder::new(&remote).build().await.unwrap();

        let top: Vec<&str> = tree.nodes.iter().map(|n| n.name.as_str()).collect();
        assert_eq!(top, vec!["README.md", "src", "docs", "a.txt"]);
        assert!(tree.find("node_modules").is_none());
        assert!(tree.find(".github/workflows/ci.yml").is_none());

        // Hidden directories are never listed at all
        assert_eq!(remote.list_count(), 4); // "", src, src/util, docs
    }

    #[tokio::test]
    async fn test_nodes_start_unselected_with_paths() {
        let remote = remote();
        let tree = TreeBuilder::new(&remote).build().await.unwrap();

        let util = tree.find("src/util").unwrap();
        assert!(util.is_dir());
        assert_eq!(util.path, "src/util");
        assert_eq!(util.children().len(), 1);
        assert!(tree.files().iter().all(|n| !n.selected && n.children.is_none()));
    }

    #[tokio::test]
    async fn test_concurrent_build_matches_sequential() {
        // First sibling answers last, so completion order differs from listing order
        let remote = remote()
            .with_file("zeta/z.txt", b"z")
            .with_listing_delay("src", Duration::from_millis(30))
            .with_listing_delay("src/util", Duration::from_millis(10));

        let sequential = TreeBuilder::new(&remote).with_concurrency(1).build().await.unwrap();
        let concurrent = TreeBuilder::new(&remote).with_concurrency(16).build().await.unwrap();
        assert_eq!(sequential, concurrent);
    }

    #[tokio::test]
    async fn test_concurrency_bounds_all_levels() {
        // 4 directories per level, 3 levels deep
        let mut remote = FakeRemote::new().with_default_listing_delay(Duration::from_millis(20));
        for a in 0..4 {
            for b in 0..4 {
                for c in 0..4 {
                    remote = remote.with_file(&format!("d{}/d{}/d{}/f.txt", a, b, c), b"x");
                }
            }
        }

        let tree = TreeBuilder::new(&remote).with_concurrency(2).build().await.unwrap();

        assert_eq!(tree.file_count(), 64);
        assert_eq!(remote.list_count(), 1 + 4 + 16 + 64);
        assert!(remote.peak_in_flight() <= 2, "peak was {}", remote.peak_in_flight());
        assert_eq!(remote.peak_in_flight(), 2);
    }

    #[tokio::test]
    async fn test_nested_hidden_and_excluded_are_never_listed() {
        let remote = FakeRemote::new()
            .with_file("src/lib.rs", b"")
            .with_file("src/.cache/x", b"")
            .with_file("pkg/node_modules/y/index.js", b"")
            .with_file("pkg/index.js", b"");

        let tree = TreeBuilder::new(&remote).build().await.unwrap();

        assert!(tree.find("src/.cache").is_none());
        assert!(tree.find("pkg/node_modules").is_none());
        assert!(tree.find("pkg/index.js").is_some());

        let mut listed = remote.listed_paths();
        listed.sort();
        assert_eq!(listed, vec!["", "pkg", "src"]);
    }

    #[tokio::test]
    async fn test_listing_failure_aborts_build() {
        let remote = remote().with_failure("src/util", 403, "API rate limit exceeded");
        let result = TreeBuilder::new(&remote).build().await;

        match result {
            Err(Error::Remote { status, message }) => {
                assert_eq!(status, 403);
                assert_eq!(message, "API rate limit exceeded");
            }
            other => panic!("expected remote error, got {:?}", other),
        }
    }

    #[test]
    fn test_is_materialized() {
        assert!(is_materialized("src"));
        assert!(is_materialized("node_modules_backup"));
        assert!(!is_materialized(".env"));
        assert!(!is_materialized("node_modules"));
    }
}
