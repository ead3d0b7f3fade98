// src/github/reference.rs
// =============================================================================
// Parses a GitHub repository link into its owner and repository name.
//
// Supported formats:
//   - https://github.com/owner/repo
//   - https://github.com/owner/repo.git
//   - https://github.com/owner/repo/tree/main/src   (extra segments ignored)
//   - github.com/owner/repo                         (scheme optional)
//
// Anything else is rejected with InvalidRepositoryReference before a single
// request is sent.
// =============================================================================

use crate::error::{Error, Result};
use serde::Serialize;
use std::fmt;
use url::Url;

/// Owner/repository pair identifying one GitHub repository.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct RepoRef {
    pub owner: String,
    pub repo: String,
}

impl RepoRef {
    /// Parses a repository link typed by the user.
    ///
    /// Example:
    ///   "https://github.com/rust-lang/rust" -> RepoRef { owner: "rust-lang", repo: "rust" }
    pub fn parse(input: &str) -> Result<Self> {
        let input = input.trim();
        if input.is_empty() {
            return Err(Error::InvalidRepositoryReference(
                "empty repository URL".to_string(),
            ));
        }

        // Accept "github.com/owner/repo" without a scheme
        let with_scheme = if input.contains("://") {
            input.to_string()
        } else {
            format!("https://{}", input)
        };

        let parsed = Url::parse(&with_scheme)
            .map_err(|e| Error::InvalidRepositoryReference(format!("{}: {}", input, e)))?;

        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(Error::InvalidRepositoryReference(format!(
                "unsupported scheme: {}",
                input
            )));
        }

        let host = parsed.host_str().unwrap_or_default().to_ascii_lowercase();
        if !matches!(host.as_str(), "github.com" | "www.github.com") {
            return Err(Error::InvalidRepositoryReference(format!(
                "not a GitHub URL: {}",
                input
            )));
        }

        let parts: Vec<&str> = parsed
            .path_segments()
            .map(|segments| segments.filter(|s| !s.is_empty()).collect())
            .unwrap_or_default();

        if parts.len() < 2 {
            return Err(Error::InvalidRepositoryReference(format!(
                "expected https://github.com/<owner>/<repo>, got {}",
                input
            )));
        }

        let owner = parts[0].to_string();
        let repo = parts[1].trim_end_matches(".git").to_string();

        if repo.is_empty() {
            return Err(Error::InvalidRepositoryReference(format!(
                "missing repository name: {}",
                input
            )));
        }

        Ok(RepoRef { owner, repo })
    }
}

impl fmt::Display for RepoRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.repo)
    }
}
