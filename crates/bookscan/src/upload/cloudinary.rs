use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use log::debug;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use sha2::{Digest, Sha256};

use super::ImageUploader;
use crate::config::CloudinaryCredentials;
use crate::error::UploadError;

const API_BASE: &str = "https://api.cloudinary.com/v1_1";
const SIGNATURE_ALGORITHM: &str = "sha256";
const UPLOAD_TIMEOUT: Duration = Duration::from_secs(120);

#[derive(Debug, Deserialize)]
struct UploadResponse {
    #[serde(default)]
    secure_url: Option<String>,
}

/// Signed image uploads to Cloudinary.
pub struct CloudinaryUploader {
    http: Client,
    cloud_name: String,
    api_key: String,
    api_secret: SecretString,
}

impl CloudinaryUploader {
    pub fn new(credentials: &CloudinaryCredentials) -> Result<Self, UploadError> {
        if credentials.cloud_name.trim().is_empty() {
            return Err(UploadError::MissingCredential("cloud_name"));
        }
        if credentials.api_key.trim().is_empty() {
            return Err(UploadError::MissingCredential("api_key"));
        }
        if credentials.api_secret.expose_secret().trim().is_empty() {
            return Err(UploadError::MissingCredential("api_secret"));
        }

        let http = Client::builder().timeout(UPLOAD_TIMEOUT).build()?;
        Ok(Self {
            http,
            cloud_name: credentials.cloud_name.clone(),
            api_key: credentials.api_key.clone(),
            api_secret: SecretString::from(credentials.api_secret.expose_secret().to_string()),
        })
    }

    fn upload_url(&self) -> String {
        format!("{}/{}/image/upload", API_BASE, self.cloud_name)
    }
}

/// Signs upload parameters: sorted `key=value` pairs joined with `&`,
/// followed by the API secret, hashed with SHA-256.
pub fn sign_params(params: &[(&str, &str)], api_secret: &str) -> String {
    let mut sorted: Vec<&(&str, &str)> = params.iter().filter(|(_, v)| !v.is_empty()).collect();
    sorted.sort_by(|a, b| a.0.cmp(b.0));

    let to_sign = sorted
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join("&");

    let mut hasher = Sha256::new();
    hasher.update(to_sign.as_bytes());
    hasher.update(api_secret.as_bytes());
    hex::encode(hasher.finalize())
}

#[async_trait]
impl ImageUploader for CloudinaryUploader {
    async fn upload(
        &self,
        image_path: &Path,
        public_id: &str,
        folder: &str,
    ) -> Result<String, UploadError> {
        let bytes = tokio::fs::read(image_path)
            .await
            .map_err(|e| UploadError::ReadImage {
                path: image_path.to_path_buf(),
                source: e,
            })?;

        let timestamp = chrono::Utc::now().timestamp().to_string();
        let signed = [
            ("folder", folder),
            ("overwrite", "true"),
            ("public_id", public_id),
            ("timestamp", timestamp.as_str()),
        ];
        let signature = sign_params(&signed, self.api_secret.expose_secret());

        let file_name = image_path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("thumbnail.png")
            .to_string();
        let mut form = Form::new()
            .part(
                "file",
                Part::bytes(bytes)
                    .file_name(file_name)
                    .mime_str("image/png")?,
            )
            .text("api_key", self.api_key.clone())
            .text("signature", signature)
            .text("signature_algorithm", SIGNATURE_ALGORITHM);
        for (key, value) in signed {
            if !value.is_empty() {
                form = form.text(key.to_string(), value.to_string());
            }
        }

        let response = self
            .http
            .post(self.upload_url())
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(UploadError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        let body: UploadResponse = response.json().await?;
        let url = body.secure_url.ok_or(UploadError::MissingUrl)?;
        debug!("Uploaded thumbnail {}/{} to {}", folder, public_id, url);
        Ok(url)
    }
}
