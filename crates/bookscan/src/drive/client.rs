use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use log::{debug, info};
use reqwest::Client;
use tokio::io::AsyncWriteExt;

use super::auth::{ServiceAccountAuth, ServiceAccountKey};
use super::{list_query, ListPage, MimeFilter, StorageClient};
use crate::error::DriveError;

const DRIVE_API_BASE: &str = "https://www.googleapis.com/drive/v3";
const LIST_FIELDS: &str = "nextPageToken, files(id, name)";

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Generous enough for large PDFs streamed over slow links.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(600);

fn create_http_client() -> Result<Client, DriveError> {
    Client::builder()
        .connect_timeout(CONNECT_TIMEOUT)
        .timeout(REQUEST_TIMEOUT)
        .build()
        .map_err(DriveError::Http)
}

/// Google Drive v3 client authenticated as a service account.
pub struct GoogleDriveClient {
    http: Client,
    auth: ServiceAccountAuth,
    base_url: String,
    page_size: u32,
}

impl GoogleDriveClient {
    /// Parses the key, authenticates once, and returns a ready client.
    ///
    /// Any failure here is fatal for the run that asked for the client.
    pub async fn connect(service_account_json: &str, page_size: u32) -> Result<Self, DriveError> {
        let key = ServiceAccountKey::from_json(service_account_json)?;
        let http = create_http_client()?;
        let auth = ServiceAccountAuth::new(key, http.clone());

        auth.access_token().await?;
        info!("Authenticated to Google Drive as {}", auth.client_email());

        Ok(Self {
            http,
            auth,
            base_url: DRIVE_API_BASE.to_string(),
            page_size,
        })
    }

    async fn check(response: reqwest::Response) -> Result<reqwest::Response, DriveError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(DriveError::Api {
            status: status.as_u16(),
            body,
        })
    }
}

#[async_trait]
impl StorageClient for GoogleDriveClient {
    async fn list(
        &self,
        parent_id: &str,
        filter: MimeFilter,
        page_token: Option<&str>,
    ) -> Result<ListPage, DriveError> {
        let token = self.auth.access_token().await?;
        let query = list_query(parent_id, filter);
        let page_size = self.page_size.to_string();

        let mut params = vec![
            ("q", query.as_str()),
            ("pageSize", page_size.as_str()),
            ("fields", LIST_FIELDS),
        ];
        if let Some(page_token) = page_token {
            params.push(("pageToken", page_token));
        }

        let response = self
            .http
            .get(format!("{}/files", self.base_url))
            .bearer_auth(token)
            .query(&params)
            .send()
            .await?;
        let page: ListPage = Self::check(response).await?.json().await?;

        debug!(
            "Listed {} {:?} item(s) under {}",
            page.files.len(),
            filter,
            parent_id
        );
        Ok(page)
    }

    async fn download(&self, file_id: &str, dest: &Path) -> Result<u64, DriveError> {
        let token = self.auth.access_token().await?;
        let response = self
            .http
            .get(format!("{}/files/{}", self.base_url, file_id))
            .bearer_auth(token)
            .query(&[("alt", "media")])
            .send()
            .await?;
        let mut response = Self::check(response).await?;

        let write_error = |e: std::io::Error| DriveError::WriteFile {
            path: dest.to_path_buf(),
            source: e,
        };
        let mut file = tokio::fs::File::create(dest).await.map_err(write_error)?;

        let mut written = 0u64;
        while let Some(chunk) = response.chunk().await? {
            file.write_all(&chunk).await.map_err(write_error)?;
            written += chunk.len() as u64;
        }
        file.flush().await.map_err(write_error)?;

        debug!("Downloaded {} ({} bytes)", file_id, written);
        Ok(written)
    }
}
