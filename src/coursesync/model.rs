//! # Domain Model: Courses, Sections and Elements
//!
//! The structure tree of a course is three levels deep:
//!
//! ```text
//! Course
//! ├── Section 0 ── [element, element, ...]
//! ├── Section 1 ── [element, ...]
//! └── Section n ── []
//! ```
//!
//! Every element additionally points at a **kind instance** (a link, a file
//! resource or a folder record) that carries the kind-specific payload. The
//! element record is the generic, placeable part; the instance is what gets
//! rendered.
//!
//! ## Ordering Fields
//!
//! Order is stored twice, on purpose:
//! - The parent holds the authoritative ordered list (`Course::sections`,
//!   `Section::sequence`).
//! - The child caches its index (`Section::ordinal`, `Element::position`).
//!
//! The cached index must always equal the index in the parent's list. All
//! mutations go through [`crate::positioning`], which renumbers after every
//! change, and [`crate::commands::doctor`] verifies the invariant.
//!
//! ## Identifiers
//!
//! Records are addressed by numeric ids allocated by the store. Each record type
//! has its own newtype so a section id can never be passed where an element id
//! is expected. Instance ids are allocated per kind, mirroring per-kind tables.

use crate::error::{Result, SyncError};
use crate::visibility::Visibility;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

macro_rules! record_id {
    ($name:ident, $label:literal) => {
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub u64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = SyncError;

            fn from_str(s: &str) -> Result<Self> {
                s.trim().parse::<u64>().map($name).map_err(|_| {
                    SyncError::validation(format!("{} must be a non-negative integer, got '{}'", $label, s))
                })
            }
        }
    };
}

record_id!(CourseId, "course id");
record_id!(SectionId, "section id");
record_id!(ElementId, "element id");
record_id!(InstanceId, "instance id");
record_id!(DraftId, "upload reference");

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ElementKind {
    Link,
    FileResource,
    Folder,
}

impl ElementKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ElementKind::Link => "link",
            ElementKind::FileResource => "file_resource",
            ElementKind::Folder => "folder",
        }
    }
}

impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Course {
    pub id: CourseId,
    pub name: String,
    /// Section ids in ordinal order.
    pub sections: Vec<SectionId>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    pub id: SectionId,
    pub course: CourseId,
    pub ordinal: usize,
    pub name: Option<String>,
    /// Element ids in display order.
    pub sequence: Vec<ElementId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InstanceRef {
    pub kind: ElementKind,
    pub id: InstanceId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Element {
    pub id: ElementId,
    pub course: CourseId,
    pub section: SectionId,
    pub position: usize,
    pub name: String,
    pub instance: InstanceRef,
    pub visibility: Visibility,
    pub added_at: DateTime<Utc>,
}

impl Element {
    pub fn kind(&self) -> ElementKind {
        self.instance.kind
    }
}

/// A file committed into an instance's file area.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StoredFile {
    /// Path relative to the area root, always starting with `/`.
    pub path: String,
    pub size: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkInstance {
    pub id: InstanceId,
    pub course: CourseId,
    pub name: String,
    pub external_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceInstance {
    pub id: InstanceId,
    pub course: CourseId,
    pub name: String,
    pub files: Vec<StoredFile>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FolderInstance {
    pub id: InstanceId,
    pub course: CourseId,
    pub name: String,
    pub intro: String,
    pub files: Vec<StoredFile>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdCounters {
    pub course: u64,
    pub section: u64,
    pub element: u64,
    pub link: u64,
    pub resource: u64,
    pub folder: u64,
}

/// The complete persisted record set.
///
/// Transactions operate on a private copy of this value and the store commits
/// it as a whole, so a reader can only ever see a committed state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Structure {
    /// Bumped by the store on every commit.
    pub revision: u64,
    pub next_ids: IdCounters,
    pub courses: BTreeMap<CourseId, Course>,
    pub sections: BTreeMap<SectionId, Section>,
    pub elements: BTreeMap<ElementId, Element>,
    pub links: BTreeMap<InstanceId, LinkInstance>,
    pub resources: BTreeMap<InstanceId, ResourceInstance>,
    pub folders: BTreeMap<InstanceId, FolderInstance>,
}

impl Structure {
    pub fn course(&self, id: CourseId) -> Result<&Course> {
        self.courses
            .get(&id)
            .ok_or_else(|| SyncError::not_found(format!("course {}", id)))
    }

    pub fn section(&self, id: SectionId) -> Result<&Section> {
        self.sections
            .get(&id)
            .ok_or_else(|| SyncError::not_found(format!("section {}", id)))
    }

    pub fn element(&self, id: ElementId) -> Result<&Element> {
        self.elements
            .get(&id)
            .ok_or_else(|| SyncError::not_found(format!("element {}", id)))
    }

    /// Resolve a section by its ordinal within a course.
    pub fn section_at(&self, course: CourseId, ordinal: usize) -> Result<&Section> {
        let course = self.course(course)?;
        let id = course.sections.get(ordinal).ok_or_else(|| {
            SyncError::not_found(format!("section {} in course {}", ordinal, course.id))
        })?;
        self.section(*id)
    }

    /// Sections of a course in ordinal order.
    pub fn course_sections(&self, course: CourseId) -> Result<Vec<&Section>> {
        self.course(course)?
            .sections
            .iter()
            .map(|id| self.section(*id))
            .collect()
    }

    /// Elements of a section in display order.
    pub fn section_elements(&self, section: SectionId) -> Result<Vec<&Element>> {
        self.section(section)?
            .sequence
            .iter()
            .map(|id| self.element(*id))
            .collect()
    }

    pub fn instance_exists(&self, instance: InstanceRef) -> bool {
        match instance.kind {
            ElementKind::Link => self.links.contains_key(&instance.id),
            ElementKind::FileResource => self.resources.contains_key(&instance.id),
            ElementKind::Folder => self.folders.contains_key(&instance.id),
        }
    }

    pub fn allocate_course_id(&mut self) -> CourseId {
        self.next_ids.course += 1;
        CourseId(self.next_ids.course)
    }

    pub fn allocate_section_id(&mut self) -> SectionId {
        self.next_ids.section += 1;
        SectionId(self.next_ids.section)
    }

    pub fn allocate_element_id(&mut self) -> ElementId {
        self.next_ids.element += 1;
        ElementId(self.next_ids.element)
    }

    pub fn allocate_instance_id(&mut self, kind: ElementKind) -> InstanceId {
        let counter = match kind {
            ElementKind::Link => &mut self.next_ids.link,
            ElementKind::FileResource => &mut self.next_ids.resource,
            ElementKind::Folder => &mut self.next_ids.folder,
        };
        *counter += 1;
        InstanceId(*counter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_parse_from_transport_strings() {
        assert_eq!("42".parse::<CourseId>().unwrap(), CourseId(42));
        assert_eq!(" 7 ".parse::<ElementId>().unwrap(), ElementId(7));
    }

    #[test]
    fn malformed_ids_are_validation_errors() {
        let err = "-3".parse::<SectionId>().unwrap_err();
        assert!(matches!(err, SyncError::Validation(_)));
        assert!(err.to_string().contains("section id"));

        let err = "abc".parse::<DraftId>().unwrap_err();
        assert!(err.to_string().contains("upload reference"));
    }

    #[test]
    fn instance_ids_are_allocated_per_kind() {
        let mut structure = Structure::default();
        assert_eq!(structure.allocate_instance_id(ElementKind::Link), InstanceId(1));
        assert_eq!(structure.allocate_instance_id(ElementKind::Link), InstanceId(2));
        assert_eq!(structure.allocate_instance_id(ElementKind::Folder), InstanceId(1));
    }

    #[test]
    fn structure_survives_json_with_numeric_keys() {
        let mut structure = Structure::default();
        let id = structure.allocate_course_id();
        structure.courses.insert(
            id,
            Course {
                id,
                name: "Algebra".into(),
                sections: Vec::new(),
                created_at: Utc::now(),
            },
        );

        let json = serde_json::to_string(&structure).unwrap();
        let parsed: Structure = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, structure);
    }

    #[test]
    fn section_at_reports_missing_ordinal() {
        let structure = Structure::default();
        let err = structure.section_at(CourseId(1), 0).unwrap_err();
        assert!(matches!(err, SyncError::NotFound(_)));
    }
}
