//! Course records are owned by the external record store; these helpers exist
//! so a store can be seeded and inspected without one.

use crate::commands::helpers::display_name;
use crate::error::Result;
use crate::model::{Course, CourseId, Element, Section};
use crate::positioning::insert_section;
use crate::store::StructureStore;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use tracing::info;

/// Create a course holding one unnamed general section at ordinal 0.
pub fn create<S: StructureStore>(store: &S, name: &str) -> Result<Course> {
    let name = display_name(name)?;
    let course = store.transact(|s| {
        let id = s.allocate_course_id();
        s.courses.insert(
            id,
            Course {
                id,
                name,
                sections: Vec::new(),
                created_at: Utc::now(),
            },
        );
        let general = Section {
            id: s.allocate_section_id(),
            course: id,
            ordinal: 0,
            name: None,
            sequence: Vec::new(),
        };
        insert_section(s, general, 0)?;
        s.course(id).cloned()
    })?;
    info!(course = %course.id, name = %course.name, "course created");
    Ok(course)
}

/// An element as a viewer without editing rights would meet it.
#[derive(Debug, Clone, Serialize)]
pub struct ElementOutline {
    #[serde(flatten)]
    pub element: Element,
    pub listed: bool,
    pub available: bool,
    /// Date condition document for time-gated elements.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub availability: Option<Value>,
}

impl ElementOutline {
    fn at(element: &Element, now: DateTime<Utc>) -> Self {
        Self {
            listed: element.visibility.is_listed(),
            available: element.visibility.is_available_at(now),
            availability: element.visibility.availability_document(),
            element: element.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SectionOutline {
    pub section: Section,
    pub elements: Vec<ElementOutline>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CourseOutline {
    pub course: Course,
    pub sections: Vec<SectionOutline>,
}

/// Read a course and its sections and elements from one snapshot.
pub fn outline<S: StructureStore>(store: &S, course: CourseId) -> Result<CourseOutline> {
    outline_at(store, course, Utc::now())
}

/// [`outline`] with availability evaluated at `now`.
pub fn outline_at<S: StructureStore>(
    store: &S,
    course: CourseId,
    now: DateTime<Utc>,
) -> Result<CourseOutline> {
    let snapshot = store.snapshot()?;
    let sections = snapshot
        .course_sections(course)?
        .into_iter()
        .map(|section| {
            let elements = snapshot
                .section_elements(section.id)?
                .into_iter()
                .map(|element| ElementOutline::at(element, now))
                .collect();
            Ok(SectionOutline {
                section: section.clone(),
                elements,
            })
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(CourseOutline {
        course: snapshot.course(course)?.clone(),
        sections,
    })
}
