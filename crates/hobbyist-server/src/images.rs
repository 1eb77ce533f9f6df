//! Storage for uploaded images.
//!
//! Files live under a UUID name in a flat directory.  The format is sniffed
//! from magic bytes on write (anything that is not an image is rejected)
//! and again on read to pick the response content type.  The returned
//! public URL points back at the serving endpoint.

use std::path::PathBuf;

use tokio::fs;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::ApiError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    Jpeg,
    Png,
    Webp,
    Gif,
}

impl ImageFormat {
    pub fn content_type(&self) -> &'static str {
        match self {
            ImageFormat::Jpeg => "image/jpeg",
            ImageFormat::Png => "image/png",
            ImageFormat::Webp => "image/webp",
            ImageFormat::Gif => "image/gif",
        }
    }
}

/// Identify an image format from its leading magic bytes.
pub fn sniff_format(data: &[u8]) -> Option<ImageFormat> {
    if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
        Some(ImageFormat::Jpeg)
    } else if data.starts_with(&[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A]) {
        Some(ImageFormat::Png)
    } else if data.len() >= 12 && &data[0..4] == b"RIFF" && &data[8..12] == b"WEBP" {
        Some(ImageFormat::Webp)
    } else if data.starts_with(b"GIF8") {
        Some(ImageFormat::Gif)
    } else {
        None
    }
}

#[derive(Debug, Clone)]
pub struct ImageStore {
    base_path: PathBuf,
    max_size: usize,
}

impl ImageStore {
    pub async fn new(base_path: PathBuf, max_size: usize) -> Result<Self, ApiError> {
        fs::create_dir_all(&base_path).await.map_err(|e| {
            ApiError::Internal(format!(
                "Failed to create image directory '{}': {}",
                base_path.display(),
                e
            ))
        })?;

        info!(path = %base_path.display(), "Image store initialized");

        Ok(Self {
            base_path,
            max_size,
        })
    }

    /// Persist an uploaded image and return its id.
    pub async fn store_image(&self, data: &[u8]) -> Result<Uuid, ApiError> {
        if data.is_empty() {
            return Err(ApiError::Validation("No image data provided.".to_string()));
        }
        if data.len() > self.max_size {
            return Err(ApiError::Validation(format!(
                "Image too large: {} bytes (max {}).",
                data.len(),
                self.max_size
            )));
        }
        if sniff_format(data).is_none() {
            return Err(ApiError::Validation(
                "Unsupported image format (expected JPEG, PNG, WebP or GIF).".to_string(),
            ));
        }

        let id = Uuid::new_v4();
        let path = self.base_path.join(id.to_string());

        fs::write(&path, data)
            .await
            .map_err(|e| ApiError::Internal(format!("Failed to write image {id}: {e}")))?;

        debug!(id = %id, size = data.len(), "Stored image");
        Ok(id)
    }

    /// Read an image back along with its sniffed content type.
    pub async fn get_image(&self, id: Uuid) -> Result<(Vec<u8>, &'static str), ApiError> {
        let path = self.base_path.join(id.to_string());

        if !path.exists() {
            return Err(ApiError::NotFound("Image not found.".to_string()));
        }

        let data = fs::read(&path)
            .await
            .map_err(|e| ApiError::Internal(format!("Failed to read image {id}: {e}")))?;

        let content_type = sniff_format(&data)
            .map(|f| f.content_type())
            .unwrap_or("application/octet-stream");

        Ok((data, content_type))
    }

    /// The hosted URL clients store in profiles, hobbies and posts.
    pub fn public_url(&self, base_url: &str, id: Uuid) -> String {
        format!("{}/api/upload/image/{}", base_url.trim_end_matches('/'), id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    // Smallest sniffable PNG: just the signature plus filler.
    fn png_bytes() -> Vec<u8> {
        let mut data = vec![0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];
        data.extend_from_slice(&[0u8; 16]);
        data
    }

    async fn test_store() -> (ImageStore, TempDir) {
        let dir = TempDir::new().unwrap();
        let store = ImageStore::new(dir.path().to_path_buf(), 1024 * 1024)
            .await
            .unwrap();
        (store, dir)
    }

    #[tokio::test]
    async fn test_store_and_get() {
        let (store, _dir) = test_store().await;
        let data = png_bytes();

        let id = store.store_image(&data).await.unwrap();
        let (retrieved, content_type) = store.get_image(id).await.unwrap();
        assert_eq!(retrieved, data);
        assert_eq!(content_type, "image/png");
    }

    #[tokio::test]
    async fn test_rejects_non_image() {
        let (store, _dir) = test_store().await;
        assert!(store.store_image(b"just some text").await.is_err());
        assert!(store.store_image(b"").await.is_err());
    }

    #[tokio::test]
    async fn test_rejects_oversize() {
        let dir = TempDir::new().unwrap();
        let store = ImageStore::new(dir.path().to_path_buf(), 16).await.unwrap();
        assert!(store.store_image(&png_bytes()).await.is_err());
    }

    #[tokio::test]
    async fn test_not_found() {
        let (store, _dir) = test_store().await;
        assert!(store.get_image(Uuid::new_v4()).await.is_err());
    }

    #[test]
    fn test_sniffing() {
        assert_eq!(sniff_format(&[0xFF, 0xD8, 0xFF, 0xE0]), Some(ImageFormat::Jpeg));
        assert_eq!(sniff_format(b"GIF89a"), Some(ImageFormat::Gif));
        let mut webp = b"RIFF\x00\x00\x00\x00WEBP".to_vec();
        webp.extend_from_slice(&[0u8; 4]);
        assert_eq!(sniff_format(&webp), Some(ImageFormat::Webp));
        assert_eq!(sniff_format(b"plain text"), None);
    }

    #[test]
    fn test_public_url_trims_trailing_slash() {
        let store = ImageStore {
            base_path: PathBuf::from("/tmp"),
            max_size: 1,
        };
        let id = Uuid::new_v4();
        assert_eq!(
            store.public_url("http://example.com/", id),
            format!("http://example.com/api/upload/image/{id}")
        );
    }
}
