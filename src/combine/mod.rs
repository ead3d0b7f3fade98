// src/combine/mod.rs
// =============================================================================
// Everything needed to turn a selection into the combined document.
//
// Submodules:
// - cache: payloads already fetched in this session
// - imaging: image detection, resizing, data URIs
// - render: the combine algorithm and the banner format
// =============================================================================

mod cache;
mod imaging;
mod render;

pub use cache::ContentCache;
pub use imaging::{data_uri, image_extension, is_image, resize, scaled_dimensions, ResizedImage, IMAGE_EXTENSIONS};
pub use render::{banner, combine, render_entry, CombineOptions};
