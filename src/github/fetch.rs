// src/github/fetch.rs
// =============================================================================
// This module talks to the GitHub contents API.
//
// Strategy:
// - One request lists one directory: GET /repos/<owner>/<repo>/contents/<path>
// - One request fetches one file; GitHub returns its body base64 encoded
// - Recursion is NOT done here, the tree builder drives it (see tree/builder.rs)
//
// The RemoteListing trait is the seam between the network and the rest of the
// program. Tests plug in an in-memory fake instead of GithubClient.
// =============================================================================

use crate::error::{Error, Result};
use crate::github::reference::RepoRef;
use async_trait::async_trait;
use base64::{engine::general_purpose, Engine as _};
use reqwest::header::ACCEPT;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, instrument};
use url::Url;

/// Default GitHub REST endpoint
pub const DEFAULT_API_BASE: &str = "https://api.github.com";

const LIST_FALLBACK: &str = "Failed to fetch repository contents";
const FILE_FALLBACK: &str = "Failed to fetch file content";

/// Kind of a repository entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryKind {
    File,
    Directory,
}

/// One entry of a directory listing, as the rest of the program sees it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteEntry {
    pub name: String,
    pub path: String,
    pub kind: EntryKind,
    /// Blob/tree sha reported by the host
    pub raw_ref: Option<String>,
}

/// Fetches directory listings and file bodies from a remote repository.
///
/// `fetch_file_body` returns the base64 payload exactly as the host encodes
/// it (transport line breaks removed); decoding is the caller's business.
#[async_trait]
pub trait RemoteListing: Send + Sync {
    async fn list_directory(&self, path: &str) -> Result<Vec<RemoteEntry>>;

    async fn fetch_file_body(&self, path: &str) -> Result<String>;
}

/// Settings for the HTTP client
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub api_base: String,
    pub token: Option<String>,
    pub timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            token: None,
            timeout: Duration::from_secs(30),
        }
    }
}

// Shape of a single entry in the GitHub contents API response.
// Only the fields we use are listed; serde ignores the rest.
#[derive(Debug, Deserialize)]
struct ApiEntry {
    name: String,
    path: String,
    #[serde(rename = "type")]
    entry_type: String,
    #[serde(default)]
    sha: Option<String>,
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    encoding: Option<String>,
    #[serde(default)]
    download_url: Option<String>,
}

// A directory answers with an array, a file with a single object
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ApiListing {
    Many(Vec<ApiEntry>),
    One(Box<ApiEntry>),
}

impl ApiEntry {
    fn into_remote_entry(self) -> RemoteEntry {
        let kind = if self.entry_type == "dir" {
            EntryKind::Directory
        } else {
            EntryKind::File
        };

        RemoteEntry {
            name: self.name,
            path: self.path,
            kind,
            raw_ref: self.sha,
        }
    }
}

/// RemoteListing backed by the GitHub REST API
#[derive(Debug, Clone)]
pub struct GithubClient {
    http: Client,
    api_base: Url,
    token: Option<String>,
    repo: RepoRef,
}

impl GithubClient {
    pub fn new(repo: RepoRef, config: &ClientConfig) -> Result<Self> {
        let api_base = Url::parse(&config.api_base).map_err(|e| {
            Error::InvalidRepositoryReference(format!(
                "invalid API base '{}': {}",
                config.api_base, e
            ))
        })?;

        if api_base.cannot_be_a_base() {
            return Err(Error::InvalidRepositoryReference(format!(
                "invalid API base '{}'",
                config.api_base
            )));
        }

        // GitHub rejects requests without a User-Agent
        let mut builder = Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")));

        // A local API mirror must not be routed through HTTP(S)_PROXY
        if matches!(api_base.host_str(), Some("localhost" | "127.0.0.1" | "[::1]")) {
            builder = builder.no_proxy();
        }

        let http = builder.build()?;

        Ok(Self {
            http,
            api_base,
            token: config.token.clone(),
            repo,
        })
    }

    // Builds .../repos/<owner>/<repo>/contents/<path>, encoding every segment
    fn contents_url(&self, path: &str) -> Result<Url> {
        let mut url = self.api_base.clone();
        {
            let mut segments = url.path_segments_mut().map_err(|_| {
                Error::InvalidRepositoryReference(format!("invalid API base '{}'", self.api_base))
            })?;
            segments
                .pop_if_empty()
                .extend(["repos", self.repo.owner.as_str(), self.repo.repo.as_str(), "contents"]);
            segments.extend(path.split('/').filter(|s| !s.is_empty()));
        }
        Ok(url)
    }

    async fn get_listing(&self, path: &str, fallback: &str) -> Result<ApiListing> {
        let url = self.contents_url(path)?;
        debug!(%url, "GET");

        let mut request = self
            .http
            .get(url)
            .header(ACCEPT, "application/vnd.github+json");
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(remote_error(status.as_u16(), &body, fallback));
        }

        serde_json::from_str(&body).map_err(|e| {
            Error::UnexpectedResponse(format!("could not parse listing for '{}': {}", path, e))
        })
    }

    // Files above the inline limit come back without content, only a raw link
    async fn download_raw(&self, url: &str) -> Result<Vec<u8>> {
        debug!(url, "downloading raw file body");

        let mut request = self.http.get(url);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(remote_error(status.as_u16(), &body, FILE_FALLBACK));
        }

        Ok(response.bytes().await?.to_vec())
    }
}

#[async_trait]
impl RemoteListing for GithubClient {
    #[instrument(skip(self), fields(repo = %self.repo))]
    async fn list_directory(&self, path: &str) -> Result<Vec<RemoteEntry>> {
        let entries = match self.get_listing(path, LIST_FALLBACK).await? {
            ApiListing::Many(entries) => entries,
            ApiListing::One(entry) => vec![*entry],
        };

        debug!(count = entries.len(), "listed directory");
        Ok(entries.into_iter().map(ApiEntry::into_remote_entry).collect())
    }

    #[instrument(skip(self), fields(repo = %self.repo))]
    async fn fetch_file_body(&self, path: &str) -> Result<String> {
        let entry = match self.get_listing(path, FILE_FALLBACK).await? {
            ApiListing::One(entry) => *entry,
            ApiListing::Many(_) => {
                return Err(Error::UnexpectedResponse(format!(
                    "'{}' is a directory, not a file",
                    path
                )))
            }
        };

        let omitted = entry.encoding.as_deref() == Some("none");
        match (entry.content, omitted) {
            (Some(content), false) => Ok(strip_transport_whitespace(&content)),
            (_, _) => match entry.download_url {
                Some(download_url) => {
                    let bytes = self.download_raw(&download_url).await?;
                    Ok(general_purpose::STANDARD.encode(bytes))
                }
                None => Err(Error::UnexpectedResponse(format!(
                    "no content returned for '{}'",
                    path
                ))),
            },
        }
    }
}

/// Builds a RemoteError from a non-success response body.
///
/// GitHub error bodies look like {"message": "Not Found", ...}. When the body
/// has no usable message the generic fallback text is used instead.
pub fn remote_error(status: u16, body: &str, fallback: &str) -> Error {
    let message = serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(str::to_string))
        .filter(|m| !m.trim().is_empty())
        .unwrap_or_else(|| fallback.to_string());

    Error::Remote { status, message }
}

/// GitHub wraps base64 content at 60 columns; the decoder wants one line
pub fn strip_transport_whitespace(payload: &str) -> String {
    payload.chars().filter(|c| !c.is_ascii_whitespace()).collect()
}

/// Decodes a base64 payload as returned by `fetch_file_body`
pub fn decode_payload(payload: &str) -> Result<Vec<u8>> {
    general_purpose::STANDARD
        .decode(strip_transport_whitespace(payload))
        .map_err(|e| Error::UnexpectedResponse(format!("invalid base64 payload: {}", e)))
}

// -----------------------------------------------------------------------------
// BEGINNER NOTES:
//
// 1. Why a trait for the client?
//    - The tree builder and the combiner only need "list" and "fetch"
//    - Hiding GithubClient behind RemoteListing lets tests use a fake
//    - #[async_trait] is needed because the trait is used as &dyn RemoteListing
//
// 2. What does #[serde(untagged)] do?
//    - serde tries each variant in order until one fits the JSON
//    - An array matches Many, an object matches One
//
// 3. Why keep the payload base64 encoded?
//    - Text files get decoded later, images get wrapped in a data URI
//    - Storing one format means the cache does not care which is which
// -----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn client(api_base: &str) -> GithubClient {
        let config = ClientConfig {
            api_base: api_base.to_string(),
            ..ClientConfig::default()
        };
        let repo = RepoRef::parse("https://github.com/alice/demo").unwrap();
        GithubClient::new(repo, &config).unwrap()
    }

    #[test]
    fn test_remote_error_uses_host_message() {
        let err = remote_error(404, r#"{"message":"Not Found"}"#, FILE_FALLBACK);
        match err {
            Error::Remote { status, message } => {
                assert_eq!(status, 404);
                assert_eq!(message, "Not Found");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_remote_error_falls_back() {
        let err = remote_error(502, "<html>Bad gateway</html>", LIST_FALLBACK);
        assert_eq!(err.to_string(), format!("HTTP 502: {}", LIST_FALLBACK));

        let err = remote_error(500, r#"{"message":""}"#, FILE_FALLBACK);
        assert_eq!(err.to_string(), format!("HTTP 500: {}", FILE_FALLBACK));
    }

    #[test]
    fn test_parse_listing_array_and_object() {
        let json = r#"[
            {"name":"src","path":"src","type":"dir","sha":"abc"},
            {"name":"a.txt","path":"a.txt","type":"file","sha":"def"},
            {"name":"link","path":"link","type":"symlink"}
        ]"#;
        let listing: ApiListing = serde_json::from_str(json).unwrap();
        let entries: Vec<RemoteEntry> = match listing {
            ApiListing::Many(e) => e.into_iter().map(ApiEntry::into_remote_entry).collect(),
            ApiListing::One(_) => panic!("expected array"),
        };
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].kind, EntryKind::Directory);
        assert_eq!(entries[0].raw_ref.as_deref(), Some("abc"));
        assert_eq!(entries[1].kind, EntryKind::File);
        assert_eq!(entries[2].kind, EntryKind::File);

        let json = r#"{"name":"a.txt","path":"a.txt","type":"file","content":"aGk=\n","encoding":"base64"}"#;
        let listing: ApiListing = serde_json::from_str(json).unwrap();
        assert!(matches!(listing, ApiListing::One(_)));
    }

    #[test]
    fn test_contents_url_encodes_segments() {
        let c = client("https://api.github.com");
        let url = c.contents_url("docs/my file#1.md").unwrap();
        assert_eq!(
            url.as_str(),
            "https://api.github.com/repos/alice/demo/contents/docs/my%20file%231.md"
        );

        let root = c.contents_url("").unwrap();
        assert_eq!(root.as_str(), "https://api.github.com/repos/alice/demo/contents");
    }

    #[test]
    fn test_contents_url_with_prefixed_base() {
        let c = client("http://localhost:8080/api/v3/");
        let url = c.contents_url("src/lib.rs").unwrap();
        assert_eq!(
            url.as_str(),
            "http://localhost:8080/api/v3/repos/alice/demo/contents/src/lib.rs"
        );
    }

    #[test]
    fn test_invalid_api_base() {
        let config = ClientConfig {
            api_base: "not a url".to_string(),
            ..ClientConfig::default()
        };
        let repo = RepoRef::parse("https://github.com/alice/demo").unwrap();
        assert!(GithubClient::new(repo, &config).is_err());
    }

    // Minimal HTTP server answering canned (path, status, body) routes
    async fn serve(routes: Vec<(String, u16, String)>) -> String {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            while let Ok((mut socket, _)) = listener.accept().await {
                let routes = routes.clone();
                tokio::spawn(async move {
                    let mut buf = vec![0u8; 8192];
                    let n = socket.read(&mut buf).await.unwrap_or(0);
                    let request = String::from_utf8_lossy(&buf[..n]).to_string();
                    let path = request.split_whitespace().nth(1).unwrap_or("/").to_string();

                    let (status, body) = routes
                        .iter()
                        .find(|(p, _, _)| *p == path)
                        .map(|(_, s, b)| (*s, b.clone()))
                        .unwrap_or((404, r#"{"message":"Not Found"}"#.to_string()));

                    let response = format!(
                        "HTTP/1.1 {} Canned\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                        status,
                        body.len(),
                        body
                    );
                    let _ = socket.write_all(response.as_bytes()).await;
                });
            }
        });

        format!("http://{}", addr)
    }

    #[tokio::test]
    async fn test_list_directory_over_http() {
        let base = serve(vec![(
            "/repos/alice/demo/contents".to_string(),
            200,
            r#"[{"name":"src","path":"src","type":"dir","sha":"1"},{"name":"a.txt","path":"a.txt","type":"file","sha":"2"}]"#.to_string(),
        )])
        .await;

        let entries = client(&base).list_directory("").await.unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].kind, EntryKind::Directory);
        assert_eq!(entries[1].path, "a.txt");
    }

    #[tokio::test]
    async fn test_fetch_file_body_over_http() {
        let base = serve(vec![(
            "/repos/alice/demo/contents/a.txt".to_string(),
            200,
            r#"{"name":"a.txt","path":"a.txt","type":"file","encoding":"base64","content":"aGVs\nbG8=\n"}"#.to_string(),
        )])
        .await;

        let body = client(&base).fetch_file_body("a.txt").await.unwrap();
        assert_eq!(body, "aGVsbG8=");
        assert_eq!(decode_payload(&body).unwrap(), b"hello");
    }

    #[tokio::test]
    async fn test_fetch_missing_file_surfaces_host_message() {
        let base = serve(Vec::new()).await;

        let err = client(&base).fetch_file_body("missing.txt").await.unwrap_err();
        match err {
            Error::Remote { status, message } => {
                assert_eq!(status, 404);
                assert_eq!(message, "Not Found");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_fetch_large_file_via_download_url() {
        // Two servers: the API one points at the raw one
        let raw_base = serve(vec![("/raw/big.txt".to_string(), 200, "big body".to_string())]).await;
        let entry = format!(
            r#"{{"name":"big.txt","path":"big.txt","type":"file","encoding":"none","content":"","download_url":"{}/raw/big.txt"}}"#,
            raw_base
        );
        let base = serve(vec![("/repos/alice/demo/contents/big.txt".to_string(), 200, entry)]).await;

        let body = client(&base).fetch_file_body("big.txt").await.unwrap();
        assert_eq!(decode_payload(&body).unwrap(), b"big body");
    }

    #[tokio::test]
    async fn test_fetch_directory_as_file_is_unexpected() {
        let base = serve(vec![(
            "/repos/alice/demo/contents/src".to_string(),
            200,
            r#"[{"name":"lib.rs","path":"src/lib.rs","type":"file"}]"#.to_string(),
        )])
        .await;

        let err = client(&base).fetch_file_body("src").await.unwrap_err();
        assert!(matches!(err, Error::UnexpectedResponse(_)));
    }

    #[test]
    fn test_decode_payload_with_line_breaks() {
        let bytes = decode_payload("aGVs\nbG8g\nd29y\nbGQ=\n").unwrap();
        assert_eq!(bytes, b"hello world");
        assert!(decode_payload("***").is_err());
    }
}
