//! # Element Factory
//!
//! Creates a typed element from a [`NewElement`] request:
//!
//! 1. Validate the payload shape for its kind (URL for links, an existing
//!    upload area for files and folders).
//! 2. Inside one store transaction: resolve the target section by ordinal,
//!    resolve the before reference, allocate the kind instance, allocate the
//!    generic element record, and place it.
//!
//! File resources and folders stage their upload area for the new instance from
//! within the transaction; the staged copy becomes the instance's file area only
//! once the transaction has committed. Otherwise it is abandoned, and whatever
//! area already carries that instance id stays as it is.

use crate::commands::helpers::{display_name, escape_html};
use crate::content::{ContentStore, FileArea, StagedArea};
use crate::error::{Result, SyncError};
use crate::model::{
    CourseId, DraftId, Element, ElementId, ElementKind, FolderInstance, InstanceId, InstanceRef,
    LinkInstance, ResourceInstance, SectionId, StoredFile, Structure,
};
use crate::positioning::{element_insert_index, place_element};
use crate::store::StructureStore;
use crate::visibility::Visibility;
use chrono::Utc;
use serde::Serialize;
use std::cell::RefCell;
use tracing::{debug, info, warn};
use url::Url;

/// Kind-specific creation payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ElementPayload {
    Link { url: Url },
    FileResource { upload: DraftId },
    Folder { upload: DraftId },
}

impl ElementPayload {
    /// Parse a link target. Only absolute URLs with a host are accepted.
    pub fn link(raw: &str) -> Result<Self> {
        let url = Url::parse(raw.trim())
            .map_err(|e| SyncError::validation(format!("'{}' is not a valid URL: {}", raw, e)))?;
        let payload = ElementPayload::Link { url };
        payload.validate()?;
        Ok(payload)
    }

    pub fn kind(&self) -> ElementKind {
        match self {
            ElementPayload::Link { .. } => ElementKind::Link,
            ElementPayload::FileResource { .. } => ElementKind::FileResource,
            ElementPayload::Folder { .. } => ElementKind::Folder,
        }
    }

    fn upload(&self) -> Option<DraftId> {
        match self {
            ElementPayload::Link { .. } => None,
            ElementPayload::FileResource { upload } | ElementPayload::Folder { upload } => {
                Some(*upload)
            }
        }
    }

    fn validate(&self) -> Result<()> {
        if let ElementPayload::Link { url } = self {
            if !url.has_host() {
                return Err(SyncError::validation(format!(
                    "URL '{}' has no host",
                    url
                )));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct NewElement {
    pub course: CourseId,
    pub section_ordinal: usize,
    pub name: String,
    pub payload: ElementPayload,
    pub visibility: Visibility,
    pub before: Option<ElementId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ElementPlacement {
    pub element_id: ElementId,
    pub instance: InstanceRef,
    pub section_id: SectionId,
    pub position: usize,
}

pub fn run<S: StructureStore, C: ContentStore>(
    store: &S,
    content: &C,
    request: NewElement,
) -> Result<ElementPlacement> {
    let name = display_name(&request.name)?;
    request.payload.validate()?;

    let kind = request.payload.kind();
    if let Some(draft) = request.payload.upload() {
        let upload = content.draft_files(draft)?;
        if kind == ElementKind::FileResource && upload.is_empty() {
            return Err(SyncError::validation(format!(
                "upload area {} holds no files",
                draft
            )));
        }
        debug!(draft = %draft, files = upload.len(), "upload area resolved");
    }

    let staged: RefCell<Option<StagedArea>> = RefCell::new(None);
    let outcome = store.transact_then(
        |s| {
            let section = s.section_at(request.course, request.section_ordinal)?;
            let section_id = section.id;
            element_insert_index(&section.sequence, section_id, request.before)?;

            let instance = instantiate(s, content, &request, &name, &staged)?;

            let element_id = s.allocate_element_id();
            s.elements.insert(
                element_id,
                Element {
                    id: element_id,
                    course: request.course,
                    section: section_id,
                    position: 0,
                    name: name.clone(),
                    instance,
                    visibility: request.visibility,
                    added_at: Utc::now(),
                },
            );
            let position = place_element(s, element_id, section_id, request.before)?;

            Ok(ElementPlacement {
                element_id,
                instance,
                section_id,
                position,
            })
        },
        |_| match staged.borrow().as_ref() {
            Some(area) => content.publish(area),
            None => Ok(()),
        },
    );

    match outcome {
        Ok(placement) => {
            info!(
                course = %request.course,
                element = %placement.element_id,
                kind = %kind,
                section = %placement.section_id,
                position = placement.position,
                "element added"
            );
            Ok(placement)
        }
        Err(e) => {
            if let Some(area) = staged.into_inner() {
                if let Err(cleanup) = content.abandon(&area) {
                    warn!(area = %area.area, error = %cleanup, "could not drop staged file area");
                }
            }
            Err(e)
        }
    }
}

/// Allocate the kind-specific instance record.
fn instantiate<C: ContentStore>(
    s: &mut Structure,
    content: &C,
    request: &NewElement,
    name: &str,
    staged: &RefCell<Option<StagedArea>>,
) -> Result<InstanceRef> {
    let kind = request.payload.kind();
    let id: InstanceId = s.allocate_instance_id(kind);

    match &request.payload {
        ElementPayload::Link { url } => {
            s.links.insert(
                id,
                LinkInstance {
                    id,
                    course: request.course,
                    name: name.to_string(),
                    external_url: url.to_string(),
                },
            );
        }
        ElementPayload::FileResource { upload } => {
            let files = stage(content, *upload, FileArea::new(kind, id), staged)?;
            s.resources.insert(
                id,
                ResourceInstance {
                    id,
                    course: request.course,
                    name: name.to_string(),
                    files,
                },
            );
        }
        ElementPayload::Folder { upload } => {
            let files = stage(content, *upload, FileArea::new(kind, id), staged)?;
            s.folders.insert(
                id,
                FolderInstance {
                    id,
                    course: request.course,
                    name: name.to_string(),
                    intro: format!("<p>{}</p>", escape_html(name)),
                    files,
                },
            );
        }
    }

    Ok(InstanceRef { kind, id })
}

fn stage<C: ContentStore>(
    content: &C,
    upload: DraftId,
    area: FileArea,
    staged: &RefCell<Option<StagedArea>>,
) -> Result<Vec<StoredFile>> {
    let copy = content.stage_area(upload, area)?;
    debug!(area = %area, token = %copy.token, "file area staged");
    let files = copy.files.clone();
    *staged.borrow_mut() = Some(copy);
    Ok(files)
}
