// SPDX-License-Identifier: GPL-3.0-or-later
// src/domain/blob.rs
//
// In-memory image payloads: PNG data URLs and the decoded blobs handed to hosts.

use std::io::Cursor;

use anyhow::{Context, anyhow, ensure};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use image::{GenericImageView, ImageFormat, RgbaImage};

use crate::constant::EXPORT_MIME;

/// Encoded image bytes together with their MIME type and pixel size.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Blob {
    pub mime: String,
    pub bytes: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

impl Blob {
    /// Decode a base64 `data:` URL and check that it holds a readable image.
    pub fn from_data_url(url: &str) -> anyhow::Result<Self> {
        let rest = url
            .strip_prefix("data:")
            .ok_or_else(|| anyhow!("Not a data URL"))?;
        let (header, payload) = rest
            .split_once(',')
            .ok_or_else(|| anyhow!("Data URL has no payload"))?;
        let mime = header
            .strip_suffix(";base64")
            .ok_or_else(|| anyhow!("Only base64 data URLs are supported"))?;

        let bytes = STANDARD
            .decode(payload)
            .context("Failed to decode data URL payload")?;
        let decoded = image::load_from_memory(&bytes).context("Failed to decode exported image")?;
        let (width, height) = decoded.dimensions();

        Ok(Self {
            mime: mime.to_string(),
            bytes,
            width,
            height,
        })
    }

    /// Decode the blob back into pixels.
    pub fn to_image(&self) -> anyhow::Result<RgbaImage> {
        let decoded = image::load_from_memory(&self.bytes).context("Failed to decode blob")?;
        Ok(decoded.to_rgba8())
    }
}

/// Encode `image` as PNG.
pub fn encode_png(image: &RgbaImage) -> anyhow::Result<Vec<u8>> {
    ensure!(
        image.width() > 0 && image.height() > 0,
        "Cannot encode an empty image"
    );
    let mut bytes = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .context("Failed to write PNG")?;
    Ok(bytes)
}

/// Encode `image` as a `data:image/png;base64,...` URL.
pub fn png_data_url(image: &RgbaImage) -> anyhow::Result<String> {
    let bytes = encode_png(image)?;
    Ok(format!("data:{EXPORT_MIME};base64,{}", STANDARD.encode(bytes)))
}

/// Wrap arbitrary content in a base64 data URL of the given MIME type.
pub fn data_url(mime: &str, content: &[u8]) -> String {
    format!("data:{mime};base64,{}", STANDARD.encode(content))
}
