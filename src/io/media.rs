// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Media files on disk.
//!
//! Reading local videos into assets, writing exports and decoding
//! thumbnails into pixels egui can upload as a texture.

use crate::models::asset::{Asset, ExportFile};
use anyhow::{Context, Result};
use std::path::Path;

/// Decoded RGBA image.
pub struct LoadedImage {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

/// Decode an encoded image (JPEG, PNG, WebP...) into RGBA pixels.
pub fn decode_image(bytes: &[u8]) -> Result<LoadedImage> {
    let img = image::load_from_memory(bytes).context("Failed to decode image")?;
    let rgba = img.to_rgba8();
    let (width, height) = rgba.dimensions();

    Ok(LoadedImage {
        width,
        height,
        pixels: rgba.into_raw(),
    })
}

/// Read a local video file into an asset titled after the file stem.
pub fn read_video(path: &Path) -> Result<Asset> {
    let bytes = std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    let title = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("video")
        .to_string();
    Ok(Asset::new(bytes, title))
}

/// Write an export to `path`.
pub fn save_export(export: &ExportFile, path: &Path) -> Result<()> {
    std::fs::write(path, &export.bytes)
        .with_context(|| format!("saving {} to {}", export.file_name, path.display()))?;
    log::info!("Saved {} ({} bytes)", path.display(), export.bytes.len());
    Ok(())
}

/// Make a server-provided name safe to offer as a default file name.
pub fn sanitize_file_name(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();
    let cleaned = cleaned.trim().trim_start_matches('.').to_string();
    if cleaned.is_empty() {
        "video.mp4".to_string()
    } else {
        cleaned
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use tempfile::tempdir;

    #[test]
    fn test_decode_png() {
        let mut encoded = Vec::new();
        let img = image::RgbaImage::from_pixel(3, 2, image::Rgba([10, 20, 30, 255]));
        image::DynamicImage::ImageRgba8(img)
            .write_to(&mut std::io::Cursor::new(&mut encoded), image::ImageFormat::Png)
            .unwrap();

        let loaded = decode_image(&encoded).unwrap();
        assert_eq!((loaded.width, loaded.height), (3, 2));
        assert_eq!(loaded.pixels.len(), 3 * 2 * 4);
        assert_eq!(&loaded.pixels[..4], &[10, 20, 30, 255]);
        assert!(decode_image(b"not an image").is_err());
    }

    #[test]
    fn test_read_and_save() {
        let dir = tempdir().unwrap();
        let source = dir.path().join("My Talk.mp4");
        std::fs::write(&source, b"fake video").unwrap();

        let asset = read_video(&source).unwrap();
        assert_eq!(asset.title, "My Talk");
        assert_eq!(&asset.bytes[..], b"fake video");

        let export = ExportFile::with_prefix("edited_", &asset.title, Bytes::from_static(b"out"));
        let target = dir.path().join(&export.file_name);
        save_export(&export, &target).unwrap();
        assert_eq!(std::fs::read(target).unwrap(), b"out");
    }

    #[test]
    fn test_sanitize_file_name() {
        assert_eq!(sanitize_file_name("a/b:c?.mp4"), "a_b_c_.mp4");
        assert_eq!(sanitize_file_name("  ..hidden.mp4 "), "hidden.mp4");
        assert_eq!(sanitize_file_name(""), "video.mp4");
    }
}
