// src/github/mod.rs
// =============================================================================
// This module handles everything that talks to GitHub.
//
// Currently implements:
// - Parsing GitHub URLs to extract owner/repo (reference.rs)
// - Listing directories and fetching file bodies via the contents API (fetch.rs)
// =============================================================================

mod fetch;
mod reference;

pub use fetch::{
    decode_payload, ClientConfig, EntryKind, GithubClient, RemoteEntry, RemoteListing,
    DEFAULT_API_BASE,
};
pub use reference::RepoRef;
