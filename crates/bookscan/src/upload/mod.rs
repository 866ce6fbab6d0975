//! Image-upload collaborator for rendered thumbnails.

pub mod cloudinary;

use std::path::Path;

use async_trait::async_trait;

use crate::error::UploadError;

pub use cloudinary::CloudinaryUploader;

#[async_trait]
pub trait ImageUploader: Send + Sync {
    /// Uploads the image at `image_path` under `folder/public_id` and
    /// returns its public HTTPS URL.
    async fn upload(
        &self,
        image_path: &Path,
        public_id: &str,
        folder: &str,
    ) -> Result<String, UploadError>;
}
