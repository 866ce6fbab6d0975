//! Remote file-storage collaborator.

pub mod auth;
pub mod client;

use std::path::Path;

use async_trait::async_trait;
use serde::Deserialize;

use crate::error::DriveError;

pub use auth::{ServiceAccountAuth, ServiceAccountKey};
pub use client::GoogleDriveClient;

pub const FOLDER_MIME_TYPE: &str = "application/vnd.google-apps.folder";
pub const PDF_MIME_TYPE: &str = "application/pdf";

/// Which kind of child a listing asks for. Trashed items are always excluded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MimeFilter {
    Folder,
    Pdf,
}

impl MimeFilter {
    pub fn mime_type(&self) -> &'static str {
        match self {
            MimeFilter::Folder => FOLDER_MIME_TYPE,
            MimeFilter::Pdf => PDF_MIME_TYPE,
        }
    }
}

/// A child entry returned by a listing.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DriveItem {
    pub id: String,
    pub name: String,
}

impl DriveItem {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// One page of a listing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListPage {
    #[serde(default)]
    pub files: Vec<DriveItem>,
    #[serde(default)]
    pub next_page_token: Option<String>,
}

#[async_trait]
pub trait StorageClient: Send + Sync {
    /// Lists the immediate children of `parent_id` matching `filter`.
    async fn list(
        &self,
        parent_id: &str,
        filter: MimeFilter,
        page_token: Option<&str>,
    ) -> Result<ListPage, DriveError>;

    /// Downloads `file_id` to `dest`, returning the number of bytes written.
    async fn download(&self, file_id: &str, dest: &Path) -> Result<u64, DriveError>;
}

/// Builds the Drive search expression for the children of `parent_id`.
pub fn list_query(parent_id: &str, filter: MimeFilter) -> String {
    let escaped = parent_id.replace('\\', "\\\\").replace('\'', "\\'");
    format!(
        "'{}' in parents and mimeType = '{}' and trashed = false",
        escaped,
        filter.mime_type()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_folder_query() {
        assert_eq!(
            list_query("abc123", MimeFilter::Folder),
            "'abc123' in parents and mimeType = 'application/vnd.google-apps.folder' and trashed = false"
        );
    }

    #[test]
    fn test_pdf_query() {
        assert_eq!(
            list_query("root", MimeFilter::Pdf),
            "'root' in parents and mimeType = 'application/pdf' and trashed = false"
        );
    }

    #[test]
    fn test_query_escapes_quotes() {
        assert!(list_query("it's", MimeFilter::Pdf).starts_with("'it\\'s' in parents"));
    }

    #[test]
    fn test_list_page_parses_drive_response() {
        let page: ListPage = serde_json::from_str(
            r#"{"nextPageToken": "tok", "files": [{"id": "1", "name": "A.pdf"}]}"#,
        )
        .unwrap();
        assert_eq!(page.next_page_token.as_deref(), Some("tok"));
        assert_eq!(page.files, vec![DriveItem::new("1", "A.pdf")]);

        let last: ListPage = serde_json::from_str(r#"{"files": []}"#).unwrap();
        assert!(last.next_page_token.is_none());
    }
}
