//! The fixed folder hierarchy walked by the scanner.

use crate::config::{FlatLabels, DIRECT_LABEL};
use crate::drive::MimeFilter;
use crate::processor::DocumentMetadata;
use crate::store::Record;

/// Role of a traversal depth. Depths 0 through 4 are folders, depth 5 holds documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    AcademicYear,
    Term,
    Subject,
    BookType,
    ReleaseYear,
    Document,
}

struct LevelDef {
    role: Role,
    label: &'static str,
}

const LEVELS: [LevelDef; 6] = [
    LevelDef {
        role: Role::AcademicYear,
        label: "Academic Year",
    },
    LevelDef {
        role: Role::Term,
        label: "Term",
    },
    LevelDef {
        role: Role::Subject,
        label: "Subject",
    },
    LevelDef {
        role: Role::BookType,
        label: "Book Type",
    },
    LevelDef {
        role: Role::ReleaseYear,
        label: "Release Year",
    },
    LevelDef {
        role: Role::Document,
        label: "Document",
    },
];

/// Number of folder levels above the documents.
pub const FOLDER_DEPTH: usize = 5;

impl Role {
    pub fn at_depth(depth: usize) -> Option<Role> {
        LEVELS.get(depth).map(|level| level.role)
    }

    pub fn depth(&self) -> usize {
        LEVELS
            .iter()
            .position(|level| level.role == *self)
            .unwrap_or(FOLDER_DEPTH)
    }

    /// Human-readable name used in "Entering ..." log lines.
    pub fn label(&self) -> &'static str {
        LEVELS[self.depth()].label
    }

    pub fn next(&self) -> Option<Role> {
        Role::at_depth(self.depth() + 1)
    }

    pub fn is_document(&self) -> bool {
        matches!(self, Role::Document)
    }

    pub fn listing_filter(&self) -> MimeFilter {
        if self.is_document() {
            MimeFilter::Pdf
        } else {
            MimeFilter::Folder
        }
    }
}

/// Folder names accumulated while descending, one slot per folder level.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HierarchyLabels {
    slots: [Option<String>; FOLDER_DEPTH],
}

impl HierarchyLabels {
    pub fn new() -> Self {
        Self::default()
    }

    /// Labels used for documents sitting directly under the root.
    pub fn flat(labels: &FlatLabels) -> Self {
        Self {
            slots: [
                Some(labels.academic_year_id.clone()),
                Some(labels.term_id.clone()),
                Some(labels.subject_id.clone()),
                Some(DIRECT_LABEL.to_string()),
                Some(labels.release_year.clone()),
            ],
        }
    }

    /// Returns a copy with `role` set to `name`. Documents carry no label.
    pub fn with(&self, role: Role, name: &str) -> Self {
        let mut next = self.clone();
        if let Some(slot) = next.slots.get_mut(role.depth()) {
            *slot = Some(name.to_string());
        }
        next
    }

    pub fn get(&self, role: Role) -> &str {
        self.slots
            .get(role.depth())
            .and_then(|slot| slot.as_deref())
            .unwrap_or(DIRECT_LABEL)
    }

    pub fn to_record(&self, name: &str, drive_file_id: &str, metadata: DocumentMetadata) -> Record {
        Record {
            name: name.to_string(),
            drive_file_id: drive_file_id.to_string(),
            academic_year_id: self.get(Role::AcademicYear).to_string(),
            term_id: self.get(Role::Term).to_string(),
            subject_id: self.get(Role::Subject).to_string(),
            book_type_id: self.get(Role::BookType).to_string(),
            release_year: self.get(Role::ReleaseYear).to_string(),
            page_count: metadata.page_count,
            file_size_mb: metadata.file_size_mb,
            image_url: metadata.image_url,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metadata() -> DocumentMetadata {
        DocumentMetadata {
            page_count: 12,
            file_size_mb: 3,
            image_url: "https://img.example/a.png".to_string(),
        }
    }

    #[test]
    fn test_levels_are_ordered() {
        let mut role = Role::AcademicYear;
        let mut seen = vec![role];
        while let Some(next) = role.next() {
            seen.push(next);
            role = next;
        }

        assert_eq!(
            seen,
            vec![
                Role::AcademicYear,
                Role::Term,
                Role::Subject,
                Role::BookType,
                Role::ReleaseYear,
                Role::Document,
            ]
        );
        assert_eq!(Role::Document.depth(), FOLDER_DEPTH);
        assert!(Role::at_depth(6).is_none());
    }

    #[test]
    fn test_listing_filters() {
        assert_eq!(Role::AcademicYear.listing_filter(), MimeFilter::Folder);
        assert_eq!(Role::ReleaseYear.listing_filter(), MimeFilter::Folder);
        assert_eq!(Role::Document.listing_filter(), MimeFilter::Pdf);
        assert_eq!(Role::BookType.label(), "Book Type");
    }

    #[test]
    fn test_context_builds_record() {
        let labels = HierarchyLabels::new()
            .with(Role::AcademicYear, "2024-2025")
            .with(Role::Term, "Term 1")
            .with(Role::Subject, "Math")
            .with(Role::BookType, "Student Book")
            .with(Role::ReleaseYear, "2024");

        let record = labels.to_record("Algebra.pdf", "f1", metadata());
        assert_eq!(record.academic_year_id, "2024-2025");
        assert_eq!(record.term_id, "Term 1");
        assert_eq!(record.subject_id, "Math");
        assert_eq!(record.book_type_id, "Student Book");
        assert_eq!(record.release_year, "2024");
        assert_eq!(record.page_count, 12);
        assert_eq!(record.drive_file_id, "f1");
    }

    #[test]
    fn test_with_does_not_mutate_parent_context() {
        let parent = HierarchyLabels::new().with(Role::AcademicYear, "2023");
        let _child = parent.with(Role::Term, "Term 2");
        assert_eq!(parent.get(Role::Term), DIRECT_LABEL);
    }

    #[test]
    fn test_flat_labels_force_direct_book_type() {
        let flat = FlatLabels {
            academic_year_id: "2024-2025".to_string(),
            ..FlatLabels::default()
        };

        let record = HierarchyLabels::flat(&flat).to_record("Loose.pdf", "f2", metadata());
        assert_eq!(record.academic_year_id, "2024-2025");
        assert_eq!(record.term_id, "Direct");
        assert_eq!(record.subject_id, "Direct");
        assert_eq!(record.book_type_id, "Direct");
        assert_eq!(record.release_year, "Direct");
    }
}
