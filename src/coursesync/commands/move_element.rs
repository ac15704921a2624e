//! # Move Engine
//!
//! Relocates an existing element to a section of the same course, optionally
//! immediately before a sibling there. Removal from the old list and insertion
//! into the new one happen inside a single store transaction, so no reader can
//! see the element in zero or two sections.
//!
//! ## Rules
//!
//! - The element and the destination section must exist. A section of another
//!   course is reported as not found (cross-course moves are not supported).
//! - The before reference must be in the destination section. It is checked
//!   before anything is detached.
//! - Moving an element to the slot it already occupies (same section, before its
//!   current next sibling, or appended when it is already last, or "before
//!   itself") succeeds and changes nothing.

use crate::error::{Result, SyncError};
use crate::model::{ElementId, SectionId};
use crate::positioning::{detach_element, element_insert_index, place_element};
use crate::store::StructureStore;
use serde::Serialize;
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MoveOutcome {
    pub element_id: ElementId,
    pub from_section: SectionId,
    pub from_position: usize,
    pub to_section: SectionId,
    pub position: usize,
}

impl MoveOutcome {
    pub fn moved(&self) -> bool {
        self.from_section != self.to_section || self.from_position != self.position
    }
}

pub fn run<S: StructureStore>(
    store: &S,
    element: ElementId,
    destination: SectionId,
    before: Option<ElementId>,
) -> Result<MoveOutcome> {
    let outcome = store.transact(|s| {
        let current = s.element(element)?;
        let (course, from_section, from_position) =
            (current.course, current.section, current.position);

        let target = s.section(destination)?;
        if target.course != course {
            return Err(SyncError::not_found(format!(
                "section {} in course {}",
                destination, course
            )));
        }

        if before == Some(element) {
            if destination == from_section {
                return Ok(MoveOutcome {
                    element_id: element,
                    from_section,
                    from_position,
                    to_section: destination,
                    position: from_position,
                });
            }
            return Err(SyncError::not_found(format!(
                "element {} in section {}",
                element, destination
            )));
        }
        element_insert_index(&target.sequence, destination, before)?;

        detach_element(s, element)?;
        let position = place_element(s, element, destination, before)?;

        Ok(MoveOutcome {
            element_id: element,
            from_section,
            from_position,
            to_section: destination,
            position,
        })
    })?;

    info!(
        element = %element,
        from = %outcome.from_section,
        to = %outcome.to_section,
        position = outcome.position,
        moved = outcome.moved(),
        "element moved"
    );
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::fixtures;
    use crate::commands::{add_section, course};
    use crate::store::StructureStore;

    #[test]
    fn move_to_other_section_before_sibling() {
        let store = fixtures::store();
        let c = fixtures::course_with_sections(&store, 2);
        let a = fixtures::add_link(&store, c, 1, "A", None);
        let b = fixtures::add_link(&store, c, 1, "B", None);
        let x = fixtures::add_link(&store, c, 2, "X", None);
        let y = fixtures::add_link(&store, c, 2, "Y", None);
        let s1 = fixtures::section_id(&store, c, 1);
        let s2 = fixtures::section_id(&store, c, 2);

        let outcome = run(&store, a, s2, Some(y)).unwrap();

        assert!(outcome.moved());
        assert_eq!(outcome.to_section, s2);
        assert_eq!(outcome.position, 1);
        assert_eq!(fixtures::sequence(&store, s1), vec![b]);
        assert_eq!(fixtures::sequence(&store, s2), vec![x, a, y]);

        let snapshot = store.snapshot().unwrap();
        assert_eq!(snapshot.element(b).unwrap().position, 0);
        assert_eq!(snapshot.element(a).unwrap().section, s2);
        assert_eq!(snapshot.element(y).unwrap().position, 2);
    }

    #[test]
    fn move_without_before_appends() {
        let store = fixtures::store();
        let c = fixtures::course_with_sections(&store, 1);
        let a = fixtures::add_link(&store, c, 1, "A", None);
        let b = fixtures::add_link(&store, c, 1, "B", None);
        let c2 = fixtures::add_link(&store, c, 1, "C", None);
        let s1 = fixtures::section_id(&store, c, 1);

        run(&store, a, s1, None).unwrap();
        assert_eq!(fixtures::sequence(&store, s1), vec![b, c2, a]);
    }

    #[test]
    fn move_within_section_to_front() {
        let store = fixtures::store();
        let c = fixtures::course_with_sections(&store, 1);
        let a = fixtures::add_link(&store, c, 1, "A", None);
        let b = fixtures::add_link(&store, c, 1, "B", None);
        let c3 = fixtures::add_link(&store, c, 1, "C", None);
        let s1 = fixtures::section_id(&store, c, 1);

        let outcome = run(&store, c3, s1, Some(a)).unwrap();
        assert_eq!(outcome.position, 0);
        assert_eq!(fixtures::sequence(&store, s1), vec![c3, a, b]);
    }

    #[test]
    fn move_to_current_slot_is_a_no_op() {
        let store = fixtures::store();
        let c = fixtures::course_with_sections(&store, 1);
        let a = fixtures::add_link(&store, c, 1, "A", None);
        let b = fixtures::add_link(&store, c, 1, "B", None);
        let last = fixtures::add_link(&store, c, 1, "C", None);
        let s1 = fixtures::section_id(&store, c, 1);
        let original = fixtures::sequence(&store, s1);

        // before = next sibling
        let outcome = run(&store, a, s1, Some(b)).unwrap();
        assert!(!outcome.moved());
        assert_eq!(fixtures::sequence(&store, s1), original);

        // last element, before = none
        let outcome = run(&store, last, s1, None).unwrap();
        assert!(!outcome.moved());
        assert_eq!(fixtures::sequence(&store, s1), original);

        // before = itself
        let outcome = run(&store, b, s1, Some(b)).unwrap();
        assert!(!outcome.moved());
        assert_eq!(fixtures::sequence(&store, s1), original);
    }

    #[test]
    fn stale_before_reference_leaves_everything_in_place() {
        let store = fixtures::store();
        let c = fixtures::course_with_sections(&store, 2);
        let a = fixtures::add_link(&store, c, 1, "A", None);
        let other = fixtures::add_link(&store, c, 1, "Other", None);
        let s2 = fixtures::section_id(&store, c, 2);
        let before = store.snapshot().unwrap();

        let err = run(&store, a, s2, Some(other)).unwrap_err();

        assert!(matches!(err, SyncError::NotFound(_)));
        assert_eq!(store.snapshot().unwrap(), before);
    }

    #[test]
    fn missing_element_or_section_is_not_found() {
        let store = fixtures::store();
        let c = fixtures::course_with_sections(&store, 1);
        let a = fixtures::add_link(&store, c, 1, "A", None);
        let s1 = fixtures::section_id(&store, c, 1);

        assert!(matches!(
            run(&store, ElementId(999), s1, None),
            Err(SyncError::NotFound(_))
        ));
        assert!(matches!(
            run(&store, a, SectionId(999), None),
            Err(SyncError::NotFound(_))
        ));
    }

    #[test]
    fn section_of_another_course_is_not_found() {
        let store = fixtures::store();
        let c = fixtures::course_with_sections(&store, 1);
        let a = fixtures::add_link(&store, c, 1, "A", None);
        let other = course::create(&store, "Other").unwrap().id;
        let foreign = add_section::run(&store, other, "Foreign", 1)
            .unwrap()
            .section_id;

        let err = run(&store, a, foreign, None).unwrap_err();
        assert!(matches!(err, SyncError::NotFound(_)));
        assert!(fixtures::sequence(&store, foreign).is_empty());
    }

    #[test]
    fn concurrent_readers_never_see_element_in_zero_or_two_sections() {
        let store = fixtures::store();
        let c = fixtures::course_with_sections(&store, 2);
        let e = fixtures::add_link(&store, c, 1, "E", None);
        fixtures::add_link(&store, c, 2, "Anchor", None);
        let s1 = fixtures::section_id(&store, c, 1);
        let s2 = fixtures::section_id(&store, c, 2);

        std::thread::scope(|scope| {
            let mover = scope.spawn(|| {
                for i in 0..200 {
                    let target = if i % 2 == 0 { s2 } else { s1 };
                    run(&store, e, target, None).unwrap();
                }
            });

            let reader = scope.spawn(|| {
                for _ in 0..500 {
                    let snapshot = store.snapshot().unwrap();
                    let occurrences: usize = snapshot
                        .sections
                        .values()
                        .map(|s| s.sequence.iter().filter(|id| **id == e).count())
                        .sum();
                    assert_eq!(occurrences, 1);
                    let element = snapshot.element(e).unwrap();
                    let home = snapshot.section(element.section).unwrap();
                    assert_eq!(home.sequence[element.position], e);
                }
            });

            mover.join().unwrap();
            reader.join().unwrap();
        });
    }
}
