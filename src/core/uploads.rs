//! Images attached to playlist locations

use anyhow::Result;
use image::{DynamicImage, GenericImageView, ImageFormat};
use std::fs;
use std::path::Path;

use crate::config::UPLOADS_PREFIX;
use crate::utils::auth::generate_random_string;
use crate::utils::hashing::content_hash;

const THUMB_HEIGHT: u32 = 250;

/// Decode an uploaded image, store it as PNG with a `thumb_` copy, and return the file name
pub fn save_upload(dir: &Path, bytes: &[u8]) -> Result<String> {
    fs::create_dir_all(dir)?;

    let img = image::load_from_memory(bytes)?;
    let filename = format!("{}{}.png", content_hash(bytes), generate_random_string(5));

    let thumb = resize_to_height(&img, THUMB_HEIGHT);
    thumb.save_with_format(dir.join(format!("thumb_{}", filename)), ImageFormat::Png)?;
    img.save_with_format(dir.join(&filename), ImageFormat::Png)?;

    Ok(filename)
}

/// Delete an upload and its thumbnail; files already gone are ignored
pub fn remove_upload(dir: &Path, filename: &str) -> Result<()> {
    for name in [filename.to_string(), format!("thumb_{}", filename)] {
        match fs::remove_file(dir.join(name)) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }
    }
    Ok(())
}

/// Public URL of a stored upload
pub fn image_url(filename: &str) -> String {
    format!("{}/{}", UPLOADS_PREFIX, filename)
}

fn resize_to_height(img: &DynamicImage, height: u32) -> DynamicImage {
    let (w, h) = img.dimensions();
    if h <= height || h == 0 {
        return img.clone();
    }
    let aspect = w as f32 / h as f32;
    let new_w = ((height as f32 * aspect).round() as u32).max(1);
    img.resize_exact(new_w, height, image::imageops::FilterType::Triangle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageOutputFormat, RgbImage};
    use std::io::Cursor;
    use tempfile::TempDir;

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = DynamicImage::ImageRgb8(RgbImage::new(width, height));
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, ImageOutputFormat::Png).unwrap();
        out.into_inner()
    }

    #[test]
    fn test_save_upload_with_thumbnail() {
        let dir = TempDir::new().unwrap();
        let filename = save_upload(dir.path(), &png_bytes(100, 500)).unwrap();

        assert!(filename.ends_with(".png"));
        assert!(dir.path().join(&filename).exists());

        let thumb = image::open(dir.path().join(format!("thumb_{}", filename))).unwrap();
        assert_eq!(thumb.dimensions(), (50, 250));
        assert_eq!(image_url(&filename), format!("/uploads/{}", filename));
    }

    #[test]
    fn test_small_image_thumbnail_keeps_size() {
        let dir = TempDir::new().unwrap();
        let filename = save_upload(dir.path(), &png_bytes(40, 30)).unwrap();
        let thumb = image::open(dir.path().join(format!("thumb_{}", filename))).unwrap();
        assert_eq!(thumb.dimensions(), (40, 30));
    }

    #[test]
    fn test_remove_upload() {
        let dir = TempDir::new().unwrap();
        let filename = save_upload(dir.path(), &png_bytes(10, 10)).unwrap();

        remove_upload(dir.path(), &filename).unwrap();
        assert!(!dir.path().join(&filename).exists());
        assert!(!dir.path().join(format!("thumb_{}", filename)).exists());

        remove_upload(dir.path(), &filename).unwrap();
    }

    #[test]
    fn test_rejects_non_image() {
        let dir = TempDir::new().unwrap();
        assert!(save_upload(dir.path(), b"not an image").is_err());
    }
}
