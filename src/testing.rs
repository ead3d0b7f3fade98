// src/testing.rs
// In-memory RemoteListing used by the unit tests.

use crate::error::{Error, Result};
use crate::github::{EntryKind, RemoteEntry, RemoteListing};
use async_trait::async_trait;
use base64::{engine::general_purpose, Engine as _};
use image::{ImageFormat, Rgb, RgbImage};
use std::collections::HashMap;
use std::io::Cursor;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

#[derive(Default)]
pub struct FakeRemote {
    listings: HashMap<String, Vec<RemoteEntry>>,
    files: HashMap<String, String>,
    failures: HashMap<String, (u16, String)>,
    delays: HashMap<String, Duration>,
    default_delay: Option<Duration>,
    in_flight: AtomicUsize,
    peak_in_flight: AtomicUsize,
    listed: Mutex<Vec<String>>,
    fetched: Mutex<Vec<String>>,
}

impl FakeRemote {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a file (and any missing parent directories) in insertion order
    pub fn with_file(mut self, path: &str, bytes: &[u8]) -> Self {
        self.ensure_entry(path, EntryKind::File);
        self.files
            .insert(path.to_string(), general_purpose::STANDARD.encode(bytes));
        self
    }

    /// Any list or fetch of `path` answers with this status and message
    pub fn with_failure(mut self, path: &str, status: u16, message: &str) -> Self {
        self.failures
            .insert(path.to_string(), (status, message.to_string()));
        self
    }

    pub fn with_listing_delay(mut self, path: &str, delay: Duration) -> Self {
        self.delays.insert(path.to_string(), delay);
        self
    }

    /// Delay for every listing without its own delay
    pub fn with_default_listing_delay(mut self, delay: Duration) -> Self {
        self.default_delay = Some(delay);
        self
    }

    pub fn fetch_count(&self) -> usize {
        self.fetched.lock().unwrap().len()
    }

    pub fn fetched_paths(&self) -> Vec<String> {
        self.fetched.lock().unwrap().clone()
    }

    pub fn list_count(&self) -> usize {
        self.listed.lock().unwrap().len()
    }

    pub fn listed_paths(&self) -> Vec<String> {
        self.listed.lock().unwrap().clone()
    }

    /// Most listings that were running at the same time
    pub fn peak_in_flight(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }

    fn ensure_entry(&mut self, path: &str, kind: EntryKind) {
        let (parent, name) = match path.rsplit_once('/') {
            Some((parent, name)) => (parent.to_string(), name.to_string()),
            None => (String::new(), path.to_string()),
        };

        if !parent.is_empty() {
            self.ensure_entry(&parent, EntryKind::Directory);
        }

        if kind == EntryKind::Directory {
            self.listings.entry(path.to_string()).or_default();
        }

        let siblings = self.listings.entry(parent).or_default();
        if !siblings.iter().any(|e| e.name == name) {
            siblings.push(RemoteEntry {
                name,
                path: path.to_string(),
                kind,
                raw_ref: None,
            });
        }
    }

    fn failure(&self, path: &str) -> Option<Error> {
        self.failures.get(path).map(|(status, message)| Error::Remote {
            status: *status,
            message: message.clone(),
        })
    }
}

#[async_trait]
impl RemoteListing for FakeRemote {
    async fn list_directory(&self, path: &str) -> Result<Vec<RemoteEntry>> {
        self.listed.lock().unwrap().push(path.to_string());

        let running = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(running, Ordering::SeqCst);
        if let Some(delay) = self.delays.get(path).copied().or(self.default_delay) {
            tokio::time::sleep(delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if let Some(err) = self.failure(path) {
            return Err(err);
        }
        self.listings.get(path).cloned().ok_or_else(|| Error::Remote {
            status: 404,
            message: "Not Found".to_string(),
        })
    }

    async fn fetch_file_body(&self, path: &str) -> Result<String> {
        self.fetched.lock().unwrap().push(path.to_string());
        if let Some(err) = self.failure(path) {
            return Err(err);
        }
        self.files.get(path).cloned().ok_or_else(|| Error::Remote {
            status: 404,
            message: "Not Found".to_string(),
        })
    }
}

/// PNG bytes of a width x height gradient
pub fn png(width: u32, height: u32) -> Vec<u8> {
    let img = RgbImage::from_fn(width, height, |x, y| Rgb([(x % 256) as u8, (y % 256) as u8, 128]));
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, ImageFormat::Png).unwrap();
    out.into_inner()
}
