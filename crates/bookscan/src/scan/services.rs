use std::sync::Arc;

use async_trait::async_trait;
use secrecy::ExposeSecret;

use crate::config::ScanConfig;
use crate::drive::{GoogleDriveClient, StorageClient};
use crate::error::ScanError;
use crate::processor::{PageRenderer, PdftoppmRenderer};
use crate::upload::{CloudinaryUploader, ImageUploader};

/// The external collaborators a run talks to.
#[derive(Clone)]
pub struct ScanServices {
    pub storage: Arc<dyn StorageClient>,
    pub uploader: Arc<dyn ImageUploader>,
    pub renderer: Arc<dyn PageRenderer>,
}

/// Builds the collaborators for one run. Failing here aborts the run.
#[async_trait]
pub trait ServiceConnector: Send + Sync {
    async fn connect(&self, config: &ScanConfig) -> Result<ScanServices, ScanError>;
}

/// Connects to Google Drive and Cloudinary and renders with pdftoppm.
pub struct LiveConnector {
    page_size: u32,
    thumbnail_dpi: u32,
}

impl LiveConnector {
    pub fn new(page_size: u32, thumbnail_dpi: u32) -> Self {
        Self {
            page_size,
            thumbnail_dpi,
        }
    }
}

#[async_trait]
impl ServiceConnector for LiveConnector {
    async fn connect(&self, config: &ScanConfig) -> Result<ScanServices, ScanError> {
        let uploader = CloudinaryUploader::new(&config.cloudinary)?;
        let storage = GoogleDriveClient::connect(
            config.service_account_json.expose_secret(),
            self.page_size,
        )
        .await?;

        Ok(ScanServices {
            storage: Arc::new(storage),
            uploader: Arc::new(uploader),
            renderer: Arc::new(PdftoppmRenderer::new(self.thumbnail_dpi)),
        })
    }
}
