use crate::commands::helpers::section_name;
use crate::error::Result;
use crate::model::{CourseId, Section, SectionId};
use crate::positioning::insert_section;
use crate::store::StructureStore;
use serde::Serialize;
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SectionPlacement {
    pub section_id: SectionId,
    /// The ordinal actually assigned; smaller than the requested one when the
    /// request pointed past the end.
    pub ordinal: usize,
}

pub fn run<S: StructureStore>(
    store: &S,
    course: CourseId,
    name: &str,
    requested_ordinal: usize,
) -> Result<SectionPlacement> {
    let name = section_name(name)?;

    let placement = store.transact(|s| {
        s.course(course)?;
        let section = Section {
            id: s.allocate_section_id(),
            course,
            ordinal: requested_ordinal,
            name,
            sequence: Vec::new(),
        };
        let section_id = section.id;
        let ordinal = insert_section(s, section, requested_ordinal)?;
        Ok(SectionPlacement {
            section_id,
            ordinal,
        })
    })?;

    info!(
        course = %course,
        section = %placement.section_id,
        requested = requested_ordinal,
        ordinal = placement.ordinal,
        "section added"
    );
    Ok(placement)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::fixtures;
    use crate::error::SyncError;

    fn section_names(store: &fixtures::TestStore, course: CourseId) -> Vec<String> {
        store
            .snapshot()
            .unwrap()
            .course_sections(course)
            .unwrap()
            .iter()
            .map(|s| s.name.clone().unwrap_or_else(|| "-".into()))
            .collect()
    }

    fn ordinals(store: &fixtures::TestStore, course: CourseId) -> Vec<usize> {
        store
            .snapshot()
            .unwrap()
            .course_sections(course)
            .unwrap()
            .iter()
            .map(|s| s.ordinal)
            .collect()
    }

    #[test]
    fn inserting_in_the_middle_shifts_the_rest() {
        let store = fixtures::store();
        // ordinals: 0 (general), 1 (Week 1), 2 (Week 2)
        let course = fixtures::course_with_sections(&store, 2);
        let before = store.snapshot().unwrap().course(course).unwrap().sections.clone();

        let placement = run(&store, course, "S", 1).unwrap();

        assert_eq!(placement.ordinal, 1);
        assert_eq!(section_names(&store, course), vec!["-", "S", "Week 1", "Week 2"]);
        assert_eq!(ordinals(&store, course), vec![0, 1, 2, 3]);

        let after = store.snapshot().unwrap().course(course).unwrap().sections.clone();
        assert_eq!(after, vec![before[0], placement.section_id, before[1], before[2]]);
    }

    #[test]
    fn out_of_range_ordinal_appends() {
        let store = fixtures::store();
        let course = fixtures::course_with_sections(&store, 2);

        let placement = run(&store, course, "S", 99).unwrap();

        assert_eq!(placement.ordinal, 3);
        assert_eq!(section_names(&store, course).last().unwrap(), "S");
    }

    #[test]
    fn ordinals_remain_dense_after_any_sequence() {
        let store = fixtures::store();
        let course = fixtures::course_with_sections(&store, 0);
        for (i, requested) in [3, 0, 1, 7, 2, 2, 0].into_iter().enumerate() {
            run(&store, course, &format!("S{}", i), requested).unwrap();
            let ords = ordinals(&store, course);
            assert_eq!(ords, (0..ords.len()).collect::<Vec<_>>());
        }
    }

    #[test]
    fn unknown_course_is_not_found_and_writes_nothing() {
        let store = fixtures::store();
        let err = run(&store, CourseId(404), "S", 0).unwrap_err();
        assert!(matches!(err, SyncError::NotFound(_)));
        assert_eq!(store.snapshot().unwrap().revision, 0);
    }

    #[test]
    fn blank_name_is_stored_as_default() {
        let store = fixtures::store();
        let course = fixtures::course_with_sections(&store, 0);
        let placement = run(&store, course, "  ", 1).unwrap();
        let snapshot = store.snapshot().unwrap();
        assert_eq!(snapshot.section(placement.section_id).unwrap().name, None);
    }
}
