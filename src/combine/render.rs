// src/combine/render.rs
// =============================================================================
// The combine step: turns the selected files into one text document.
//
// Output format, per file:
//
//   ================================================
//   ==================== File: src/main.rs ====================
//   ================================================
//
//   <file body>
//
// (the separator lines are exactly as long as the header line)
//
// Files are written in SelectionSet order (lexicographic by path), entries are
// separated by a blank line, and the whole document is trimmed at the end.
// =============================================================================

use crate::combine::cache::ContentCache;
use crate::combine::imaging::{data_uri, image_extension, resize};
use crate::error::{Error, Result};
use crate::github::{decode_payload, RemoteListing};
use crate::tree::SelectionSet;
use base64::{engine::general_purpose, Engine as _};
use tracing::{debug, info, instrument};

/// Knobs the combine step takes from the caller
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CombineOptions {
    /// Write images as data URIs instead of their raw decoded bytes
    pub embed_images: bool,
    /// Pixel ceiling for embedded images; `None` keeps them at full size
    pub max_image_pixels: Option<u64>,
}

impl CombineOptions {
    /// Builds options from the three user-facing toggles.
    ///
    /// The pixel limit only applies when images are embedded and the limit
    /// toggle is on.
    pub fn from_flags(embed_images: bool, limit_image_size: bool, max_image_pixels: Option<u64>) -> Self {
        let max_image_pixels = if embed_images && limit_image_size {
            max_image_pixels
        } else {
            None
        };

        Self {
            embed_images,
            max_image_pixels,
        }
    }
}

/// The three banner lines in front of every file
pub fn banner(path: &str) -> String {
    let header = format!("==================== File: {} ====================", path);
    let separator = "=".repeat(header.chars().count());
    format!("{}\n{}\n{}", separator, header, separator)
}

/// One file's entry: leading blank line, banner, blank line, body
pub fn render_entry(path: &str, body: &str) -> String {
    format!("\n{}\n\n{}", banner(path), body)
}

/// Combines every path in `selection` into one document.
///
/// Payloads come from `cache` when present, otherwise from `client` (and are
/// cached right away). The first failure aborts the whole call and no output
/// is returned, but anything fetched before it stays in the cache.
#[instrument(skip_all, fields(files = selection.len(), embed_images = options.embed_images))]
pub async fn combine(
    client: &dyn RemoteListing,
    selection: &SelectionSet,
    cache: &mut ContentCache,
    options: &CombineOptions,
) -> Result<String> {
    let mut entries = Vec::with_capacity(selection.len());
    let mut fetched = 0usize;

    for path in selection.iter() {
        let payload = match cache.get(path) {
            Some(payload) => {
                debug!(path, "cache hit");
                payload.to_string()
            }
            None => {
                let payload = client.fetch_file_body(path).await?;
                cache.put(path, payload.clone());
                fetched += 1;
                payload
            }
        };

        let body = render_body(path, &payload, options).await?;
        entries.push(render_entry(path, &body));
    }

    info!(fetched, cached = selection.len() - fetched, "combined files");
    Ok(entries.join("\n").trim().to_string())
}

// Text for one file: decoded text, or a data URI for embedded images
async fn render_body(path: &str, payload: &str, options: &CombineOptions) -> Result<String> {
    let extension = match image_extension(path) {
        Some(ext) if options.embed_images => ext,
        _ => {
            let bytes = decode_payload(payload)?;
            return Ok(String::from_utf8_lossy(&bytes).into_owned());
        }
    };

    let payload = match options.max_image_pixels {
        Some(max_pixels) => {
            let bytes = decode_payload(payload)?;
            let target = extension.clone();
            let resized = tokio::task::spawn_blocking(move || resize(&bytes, max_pixels, &target))
                .await
                .map_err(|e| Error::ImageDecode(format!("resize task failed: {}", e)))??;

            debug!(path, width = resized.width, height = resized.height, resized = resized.resized, "image prepared");
            general_purpose::STANDARD.encode(resized.bytes)
        }
        None => payload.to_string(),
    };

    Ok(data_uri(&extension, &payload))
}

// BEGINNER NOTES:
//
// 1. Why &mut ContentCache?
//    - combine() both reads and fills the cache
//    - The caller owns the cache and keeps it between runs
//    - A second combine of the same files makes no requests at all
//
// 2. What is spawn_blocking?
//    - Tokio runs async tasks on a few worker threads
//    - Resampling a big image keeps a thread busy for a while
//    - spawn_blocking moves that work to a separate thread pool
//    - The closure must own its data (move), hence bytes and target are moved in
//
// 3. Why two ?? after the spawn_blocking await?
//    - The first ? handles the task itself failing (a panic inside it)
//    - The second ? handles resize() returning an error
//
// 4. What is String::from_utf8_lossy?
//    - Turns bytes into text even if they are not valid UTF-8
//    - Invalid bytes become the replacement character
//    - Valid text comes through exactly as it was
