// src/lib.rs
// =============================================================================
// repo-combiner library: list a GitHub repository, pick files, and combine
// them into one text document.
//
// Flow:
//   RepoRef::parse -> GithubClient -> TreeBuilder -> Tree (selection)
//     -> combine() (ContentCache, optional image resizing) -> String
//
// The Session type ties tree, selection and cache to one repository.
// =============================================================================

pub mod combine;
pub mod error;
pub mod github;
pub mod session;
pub mod tree;

#[cfg(test)]
mod testing;

pub use combine::{combine, CombineOptions, ContentCache};
pub use error::{Error, Result};
pub use github::{ClientConfig, GithubClient, RemoteListing, RepoRef};
pub use session::{LoadTicket, Session};
pub use tree::{PathFilter, SelectionSet, Tree, TreeBuilder};
