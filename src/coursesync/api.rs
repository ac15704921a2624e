//! # API Facade
//!
//! The API layer is a **thin facade** over the command layer and the single
//! entry point for course-structure operations, whatever transport is in front
//! of it (the `rpc` boundary, the CLI, or a test).
//!
//! ## Role and Responsibilities
//!
//! - **Authorizes** every mutating call before anything else happens
//! - **Dispatches** to the matching command function
//! - **Returns structured types**, never strings
//!
//! ## What the API Does NOT Do
//!
//! - **Business logic**: that belongs in `commands/*.rs`
//! - **Transport parsing**: `rpc` turns wire scalars into typed values
//! - **Presentation**: no stdout, stderr or formatting
//!
//! ## Authorization Scopes
//!
//! | Operation              | Capability     | Scope                         |
//! |------------------------|----------------|-------------------------------|
//! | `add_section`          | `section:add`  | course                        |
//! | `add_element` (link)   | `link:add`     | course                        |
//! | `add_element` (file)   | `resource:add` | course                        |
//! | `add_element` (folder) | `folder:add`   | course                        |
//! | `append_files_to_folder` | `folder:add` | course                        |
//! | `move_element`         | `element:move` | element, or site when unknown |
//!
//! An element that does not exist has no course to scope the check to, so it is
//! checked against the site. Course-level grants therefore cannot be used to
//! discover element ids.
//!
//! ## Generic Over Collaborators
//!
//! `SyncApi<S, C, A>` owns its store, content store and authorizer explicitly:
//! - Production: `SyncApi<CourseStore<FsBackend>, FsContentStore, GrantTable>`
//! - Testing: `SyncApi<CourseStore<MemBackend>, MemContentStore, GrantTable>`

use crate::auth::{AuthScope, Authorizer, Capability, Principal};
use crate::commands;
use crate::content::ContentStore;
use crate::error::Result;
use crate::model::{Course, CourseId, ElementId, ElementKind, SectionId};
use crate::store::StructureStore;
use tracing::{debug, warn};

pub struct SyncApi<S, C, A> {
    store: S,
    content: C,
    authorizer: A,
}

impl<S: StructureStore, C: ContentStore, A: Authorizer> SyncApi<S, C, A> {
    pub fn new(store: S, content: C, authorizer: A) -> Self {
        Self {
            store,
            content,
            authorizer,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn content(&self) -> &C {
        &self.content
    }

    pub fn authorize(
        &self,
        principal: &Principal,
        capability: Capability,
        scope: AuthScope,
    ) -> Result<()> {
        match self.authorizer.authorize(principal, capability, scope) {
            Ok(()) => {
                debug!(principal = %principal, capability = %capability, scope = %scope, "authorized");
                Ok(())
            }
            Err(e) => {
                warn!(principal = %principal, capability = %capability, scope = %scope, "authorization denied");
                Err(e)
            }
        }
    }

    /// The scope a move of `element` is checked against.
    pub fn element_scope(&self, element: ElementId) -> Result<AuthScope> {
        let snapshot = self.store.snapshot()?;
        Ok(match snapshot.elements.get(&element) {
            Some(found) => AuthScope::Element {
                course: found.course,
                element,
            },
            None => AuthScope::Site,
        })
    }

    pub fn add_section(
        &self,
        principal: &Principal,
        course: CourseId,
        name: &str,
        ordinal: usize,
    ) -> Result<commands::SectionPlacement> {
        self.authorize(principal, Capability::AddSection, AuthScope::Course(course))?;
        commands::add_section::run(&self.store, course, name, ordinal)
    }

    pub fn add_element(
        &self,
        principal: &Principal,
        request: commands::NewElement,
    ) -> Result<commands::ElementPlacement> {
        let capability = match request.payload.kind() {
            ElementKind::Link => Capability::AddLink,
            ElementKind::FileResource => Capability::AddResource,
            ElementKind::Folder => Capability::AddFolder,
        };
        self.authorize(principal, capability, AuthScope::Course(request.course))?;
        commands::add_element::run(&self.store, &self.content, request)
    }

    pub fn move_element(
        &self,
        principal: &Principal,
        element: ElementId,
        destination: SectionId,
        before: Option<ElementId>,
    ) -> Result<commands::MoveOutcome> {
        let scope = self.element_scope(element)?;
        self.authorize(principal, Capability::MoveElement, scope)?;
        commands::move_element::run(&self.store, element, destination, before)
    }

    pub fn append_files_to_folder(
        &self,
        principal: &Principal,
        request: commands::FolderAppend,
    ) -> Result<commands::FolderUpdate> {
        self.authorize(principal, Capability::AddFolder, AuthScope::Course(request.course))?;
        commands::append_files::run(&self.store, &self.content, request)
    }

    // Administrative operations below run locally and are not capability gated.

    pub fn create_course(&self, name: &str) -> Result<Course> {
        commands::course::create(&self.store, name)
    }

    pub fn outline(&self, course: CourseId) -> Result<commands::CourseOutline> {
        commands::course::outline(&self.store, course)
    }

    pub fn doctor(&self) -> Result<commands::IntegrityReport> {
        commands::doctor::run(&self.store)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{Grant, GrantTable};
    use crate::commands::{ElementPayload, NewElement};
    use crate::content::memory::MemContentStore;
    use crate::error::SyncError;
    use crate::model::DraftId;
    use crate::store::mem_backend::MemBackend;
    use crate::store::CourseStore;
    use crate::visibility::Visibility;

    type TestApi = SyncApi<CourseStore<MemBackend>, MemContentStore, GrantTable>;

    fn api(grants: Vec<Grant>) -> TestApi {
        SyncApi::new(
            CourseStore::with_backend(MemBackend::new()),
            MemContentStore::new(),
            GrantTable::new(grants),
        )
    }

    fn admin() -> Principal {
        Principal::new("admin")
    }

    fn instructor() -> Principal {
        Principal::new("instructor")
    }

    fn link(course: CourseId, ordinal: usize) -> NewElement {
        NewElement {
            course,
            section_ordinal: ordinal,
            name: "Link".into(),
            payload: ElementPayload::link("https://example.org/").unwrap(),
            visibility: Visibility::Always,
            before: None,
        }
    }

    #[test]
    fn authorized_calls_reach_the_commands() {
        let api = api(vec![Grant::everything("admin")]);
        let course = api.create_course("Algebra").unwrap().id;

        let section = api.add_section(&admin(), course, "Week 1", 1).unwrap();
        let placed = api.add_element(&admin(), link(course, 1)).unwrap();
        assert_eq!(placed.section_id, section.section_id);

        let general = api.outline(course).unwrap().sections[0].section.id;
        let moved = api
            .move_element(&admin(), placed.element_id, general, None)
            .unwrap();
        assert!(moved.moved());
        assert!(api.doctor().unwrap().is_clean());
    }

    #[test]
    fn missing_capability_wins_over_bad_inputs() {
        let api = api(vec![Grant::site("instructor", Capability::AddSection)]);

        // Unknown course and unknown section ordinal.
        let err = api.add_element(&instructor(), link(CourseId(404), 9)).unwrap_err();
        assert!(matches!(err, SyncError::Authorization { .. }));

        // Unknown upload reference.
        let err = api
            .add_element(
                &instructor(),
                NewElement {
                    payload: ElementPayload::Folder { upload: DraftId(99) },
                    ..link(CourseId(404), 0)
                },
            )
            .unwrap_err();
        assert!(matches!(err, SyncError::Authorization { .. }));

        // Unknown element and unknown section.
        let err = api
            .move_element(&instructor(), ElementId(1), SectionId(1), Some(ElementId(2)))
            .unwrap_err();
        assert!(matches!(err, SyncError::Authorization { .. }));
    }

    #[test]
    fn capability_follows_the_payload_kind() {
        let api = api(vec![Grant::site("instructor", Capability::AddLink)]);
        let course = api.create_course("Algebra").unwrap().id;
        api.content().create_draft(DraftId(1));

        assert!(api.add_element(&instructor(), link(course, 0)).is_ok());
        let err = api
            .add_element(
                &instructor(),
                NewElement {
                    payload: ElementPayload::Folder { upload: DraftId(1) },
                    ..link(course, 0)
                },
            )
            .unwrap_err();
        assert!(err.to_string().contains("folder:add"));
    }

    #[test]
    fn course_grant_cannot_discover_unknown_elements() {
        let api = api(vec![Grant::course("instructor", Capability::MoveElement, CourseId(1))]);
        let course = api.create_course("Algebra").unwrap().id;
        assert_eq!(course, CourseId(1));
        let general = api.outline(course).unwrap().sections[0].section.id;

        let err = api
            .move_element(&instructor(), ElementId(77), general, None)
            .unwrap_err();
        assert!(matches!(err, SyncError::Authorization { .. }));

        let site_admin = api_with_site_move();
        let err = site_admin
            .move_element(&admin(), ElementId(77), SectionId(1), None)
            .unwrap_err();
        assert!(matches!(err, SyncError::NotFound(_)));
    }

    fn api_with_site_move() -> TestApi {
        let api = api(vec![Grant::site("admin", Capability::MoveElement)]);
        api.create_course("Other").unwrap();
        api
    }

    #[test]
    fn course_grant_is_scoped_to_its_course() {
        let api = api(vec![Grant::course("instructor", Capability::AddSection, CourseId(2))]);
        let first = api.create_course("First").unwrap().id;
        let second = api.create_course("Second").unwrap().id;

        assert!(api.add_section(&instructor(), second, "Mine", 1).is_ok());
        let err = api.add_section(&instructor(), first, "Theirs", 1).unwrap_err();
        assert!(matches!(err, SyncError::Authorization { .. }));
        assert_eq!(api.outline(first).unwrap().sections.len(), 1);
    }
}
