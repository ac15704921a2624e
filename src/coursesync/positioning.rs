//! # Ordered Positioning
//!
//! Placement rules for sections within a course and elements within a section.
//! Every function here works on a [`Structure`] that the caller obtained from a
//! store transaction, so intermediate states are never visible outside it.
//!
//! ## Sections
//!
//! Section ordinals are dense: `0..n` with no gaps. Inserting at `r` shifts
//! every section at or after `r` by one. A requested ordinal past the end is
//! clamped to `n` (append), it is not an error.
//!
//! ## Elements
//!
//! Element placement is driven by an optional "before" reference:
//! - `Some(y)`: the element lands immediately before `y`. `y` must be in the
//!   target section, otherwise the placement fails with `NotFound`.
//! - `None`: the element is appended.
//!
//! After any change to a list, [`renumber_section`] or [`renumber_course`]
//! refreshes the cached `position`/`ordinal` fields of the children.

use crate::error::{Result, SyncError};
use crate::model::{CourseId, ElementId, Section, SectionId, Structure};

/// Insert `section` into its course at `requested`, shifting later sections.
/// Returns the ordinal the section actually received.
pub fn insert_section(
    structure: &mut Structure,
    mut section: Section,
    requested: usize,
) -> Result<usize> {
    let course_id = section.course;
    let course = structure
        .courses
        .get_mut(&course_id)
        .ok_or_else(|| SyncError::not_found(format!("course {}", course_id)))?;

    let ordinal = requested.min(course.sections.len());
    course.sections.insert(ordinal, section.id);

    section.ordinal = ordinal;
    section.sequence.clear();
    structure.sections.insert(section.id, section);
    renumber_course(structure, course_id)?;
    Ok(ordinal)
}

/// Compute where an element goes in `sequence`.
pub fn element_insert_index(
    sequence: &[ElementId],
    section: SectionId,
    before: Option<ElementId>,
) -> Result<usize> {
    match before {
        None => Ok(sequence.len()),
        Some(before) => sequence
            .iter()
            .position(|id| *id == before)
            .ok_or_else(|| {
                SyncError::not_found(format!("element {} in section {}", before, section))
            }),
    }
}

/// Place an element that is currently in no section.
///
/// The element record must already exist in `structure.elements`; its
/// `section` and `position` fields are overwritten. Returns the new position.
pub fn place_element(
    structure: &mut Structure,
    element: ElementId,
    section: SectionId,
    before: Option<ElementId>,
) -> Result<usize> {
    let target = structure
        .sections
        .get_mut(&section)
        .ok_or_else(|| SyncError::not_found(format!("section {}", section)))?;
    let index = element_insert_index(&target.sequence, section, before)?;
    target.sequence.insert(index, element);

    let record = structure
        .elements
        .get_mut(&element)
        .ok_or_else(|| SyncError::not_found(format!("element {}", element)))?;
    record.section = section;
    renumber_section(structure, section)?;
    Ok(index)
}

/// Remove an element from its current section's list, closing the gap.
/// Returns the section it was removed from and the index it occupied.
pub fn detach_element(
    structure: &mut Structure,
    element: ElementId,
) -> Result<(SectionId, usize)> {
    let section_id = structure.element(element)?.section;
    let section = structure
        .sections
        .get_mut(&section_id)
        .ok_or_else(|| SyncError::not_found(format!("section {}", section_id)))?;
    let index = section
        .sequence
        .iter()
        .position(|id| *id == element)
        .ok_or_else(|| {
            SyncError::Store(format!(
                "element {} claims section {} but is not listed there",
                element, section_id
            ))
        })?;
    section.sequence.remove(index);
    renumber_section(structure, section_id)?;
    Ok((section_id, index))
}

pub fn renumber_section(structure: &mut Structure, section: SectionId) -> Result<()> {
    let sequence = structure.section(section)?.sequence.clone();
    for (position, id) in sequence.iter().enumerate() {
        let element = structure
            .elements
            .get_mut(id)
            .ok_or_else(|| SyncError::not_found(format!("element {}", id)))?;
        element.position = position;
        element.section = section;
    }
    Ok(())
}

pub fn renumber_course(structure: &mut Structure, course: CourseId) -> Result<()> {
    let sections = structure.course(course)?.sections.clone();
    for (ordinal, id) in sections.iter().enumerate() {
        let section = structure
            .sections
            .get_mut(id)
            .ok_or_else(|| SyncError::not_found(format!("section {}", id)))?;
        section.ordinal = ordinal;
    }
    Ok(())
}
