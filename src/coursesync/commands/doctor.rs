use crate::error::Result;
use crate::model::{ElementId, Structure};
use crate::store::StructureStore;
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IntegrityReport {
    pub courses: usize,
    pub sections: usize,
    pub elements: usize,
    pub problems: Vec<String>,
}

impl IntegrityReport {
    pub fn is_clean(&self) -> bool {
        self.problems.is_empty()
    }
}

/// Check every structural invariant over the latest snapshot. Read-only.
pub fn run<S: StructureStore>(store: &S) -> Result<IntegrityReport> {
    Ok(check(&store.snapshot()?))
}

pub fn check(s: &Structure) -> IntegrityReport {
    let mut problems = Vec::new();

    for course in s.courses.values() {
        for (index, section_id) in course.sections.iter().enumerate() {
            match s.sections.get(section_id) {
                None => problems.push(format!(
                    "course {} lists missing section {}",
                    course.id, section_id
                )),
                Some(section) => {
                    if section.course != course.id {
                        problems.push(format!(
                            "section {} is listed by course {} but belongs to course {}",
                            section.id, course.id, section.course
                        ));
                    }
                    if section.ordinal != index {
                        problems.push(format!(
                            "section {} has ordinal {} at index {} of course {}",
                            section.id, section.ordinal, index, course.id
                        ));
                    }
                }
            }
        }
    }

    for section in s.sections.values() {
        let listed = s
            .courses
            .get(&section.course)
            .map(|c| c.sections.iter().filter(|id| **id == section.id).count())
            .unwrap_or(0);
        if listed != 1 {
            problems.push(format!(
                "section {} is listed {} times by course {}",
                section.id, listed, section.course
            ));
        }
    }

    let mut occurrences: BTreeMap<ElementId, usize> = BTreeMap::new();
    for section in s.sections.values() {
        for (index, element_id) in section.sequence.iter().enumerate() {
            *occurrences.entry(*element_id).or_default() += 1;
            match s.elements.get(element_id) {
                None => problems.push(format!(
                    "section {} lists missing element {}",
                    section.id, element_id
                )),
                Some(element) => {
                    if element.section != section.id {
                        problems.push(format!(
                            "element {} is listed by section {} but points at section {}",
                            element.id, section.id, element.section
                        ));
                    }
                    if element.position != index {
                        problems.push(format!(
                            "element {} has position {} at index {} of section {}",
                            element.id, element.position, index, section.id
                        ));
                    }
                    if element.course != section.course {
                        problems.push(format!(
                            "element {} belongs to course {} but sits in section {} of course {}",
                            element.id, element.course, section.id, section.course
                        ));
                    }
                }
            }
        }
    }

    for element in s.elements.values() {
        let count = occurrences.get(&element.id).copied().unwrap_or(0);
        if count != 1 {
            problems.push(format!(
                "element {} appears in {} section sequences",
                element.id, count
            ));
        }
        if !s.instance_exists(element.instance) {
            problems.push(format!(
                "element {} references missing {} instance {}",
                element.id,
                element.kind(),
                element.instance.id
            ));
        }
    }

    IntegrityReport {
        courses: s.courses.len(),
        sections: s.sections.len(),
        elements: s.elements.len(),
        problems,
    }
}
