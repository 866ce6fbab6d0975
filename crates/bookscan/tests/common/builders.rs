//! Builders for test inputs: PDFs, run configurations and folder trees.

#![allow(dead_code)]

use lopdf::{dictionary, Document, Object, Stream};

use bookscan::config::{CredentialSources, ScanConfig, StartRequest};

use super::fakes::FakeDrive;

/// Builds a minimal valid PDF with `pages` pages.
pub fn pdf_bytes(pages: usize) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
    });

    let mut kids = Vec::new();
    for n in 0..pages {
        let content = format!("BT /F1 12 Tf 50 700 Td (Page {}) Tj ET", n + 1);
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.into_bytes()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
            "Resources" => dictionary! { "Font" => dictionary! { "F1" => font_id } },
            "Contents" => content_id,
        });
        kids.push(Object::from(page_id));
    }

    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => pages as i64,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).expect("Failed to serialize test PDF");
    bytes
}

/// Builder for the request a client would send to start a run.
pub struct ScanConfigBuilder {
    request: StartRequest,
}

impl ScanConfigBuilder {
    pub fn new() -> Self {
        Self {
            request: StartRequest {
                service_account_json: Some(r#"{"client_email": "scanner@test"}"#.to_string()),
                cloudinary_cloud_name: Some("demo".to_string()),
                cloudinary_api_key: Some("key".to_string()),
                cloudinary_api_secret: Some("secret".to_string()),
                ..StartRequest::default()
            },
        }
    }

    pub fn root(mut self, root_id: &str) -> Self {
        self.request.drive_root_id = Some(root_id.to_string());
        self
    }

    pub fn academic_year(mut self, label: &str) -> Self {
        self.request.academic_year_id = Some(label.to_string());
        self
    }

    pub fn term(mut self, label: &str) -> Self {
        self.request.term_id = Some(label.to_string());
        self
    }

    pub fn build(self) -> ScanConfig {
        ScanConfig::from_request(self.request, &CredentialSources::default())
            .expect("Failed to build scan config")
    }
}

/// One document under the five-level hierarchy.
pub struct TreeDocument {
    pub path: [&'static str; 5],
    pub id: &'static str,
    pub name: &'static str,
    pub pages: usize,
}

/// Adds each document under `root_id`, creating folders as needed.
pub fn build_tree(drive: &mut FakeDrive, root_id: &str, documents: &[TreeDocument]) {
    for doc in documents {
        let leaf = drive.add_path(root_id, &doc.path);
        drive.add_document(&leaf, doc.id, doc.name, pdf_bytes(doc.pages));
    }
}

/// A small library: two academic years inserted out of order, three books.
pub fn sample_library() -> Vec<TreeDocument> {
    vec![
        TreeDocument {
            path: ["2024-2025", "Term 1", "Math", "Student Book", "2024"],
            id: "doc-math",
            name: "Algebra.pdf",
            pages: 3,
        },
        TreeDocument {
            path: ["2023-2024", "Term 2", "Science", "Workbook", "2023"],
            id: "doc-science",
            name: "Biology.pdf",
            pages: 1,
        },
        TreeDocument {
            path: ["2024-2025", "Term 1", "Math", "Student Book", "2024"],
            id: "doc-geometry",
            name: "Geometry.pdf",
            pages: 2,
        },
    ]
}
