//! Merge an upload area into an existing folder.
//!
//! The folder is addressed twice, by its element id and by its instance id, and
//! both must agree. Files from the draft are copied into the folder's file area;
//! a file with the same path replaces the one already there. The display name
//! renames both the folder instance and its element.
//!
//! The merge is staged next to the live area and swapped in only after the
//! records commit. A failed append leaves both the folder's files and its
//! records as they were.

use crate::commands::helpers::{display_name, escape_html};
use crate::content::{ContentStore, FileArea, StagedArea};
use crate::error::{Result, SyncError};
use crate::model::{CourseId, DraftId, ElementId, ElementKind, InstanceId, StoredFile};
use crate::store::StructureStore;
use serde::Serialize;
use std::cell::RefCell;
use tracing::{debug, info, warn};

#[derive(Debug, Clone)]
pub struct FolderAppend {
    pub course: CourseId,
    pub element: ElementId,
    pub upload: DraftId,
    pub name: String,
    pub instance: InstanceId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FolderUpdate {
    pub element_id: ElementId,
    pub instance_id: InstanceId,
    pub files: Vec<StoredFile>,
}

pub fn run<S: StructureStore, C: ContentStore>(
    store: &S,
    content: &C,
    request: FolderAppend,
) -> Result<FolderUpdate> {
    let name = display_name(&request.name)?;
    let upload = content.draft_files(request.upload)?;
    debug!(draft = %request.upload, files = upload.len(), "upload area resolved");

    let staged: RefCell<Option<StagedArea>> = RefCell::new(None);
    let outcome = store.transact_then(
        |s| {
            let element = s.element(request.element)?;
            if element.course != request.course {
                return Err(SyncError::not_found(format!(
                    "element {} in course {}",
                    request.element, request.course
                )));
            }
            if element.kind() != ElementKind::Folder {
                return Err(SyncError::validation(format!(
                    "element {} is a {}, not a folder",
                    request.element,
                    element.kind()
                )));
            }
            if element.instance.id != request.instance
                || !s.folders.contains_key(&request.instance)
            {
                return Err(SyncError::not_found(format!(
                    "folder {} for element {}",
                    request.instance, request.element
                )));
            }

            let copy = content.stage_area(
                request.upload,
                FileArea::new(ElementKind::Folder, request.instance),
            )?;
            let files = copy.files.clone();
            *staged.borrow_mut() = Some(copy);

            if let Some(folder) = s.folders.get_mut(&request.instance) {
                folder.name = name.clone();
                folder.intro = format!("<p>{}</p>", escape_html(&name));
                folder.files = files.clone();
            }
            if let Some(element) = s.elements.get_mut(&request.element) {
                element.name = name.clone();
            }

            Ok(FolderUpdate {
                element_id: request.element,
                instance_id: request.instance,
                files,
            })
        },
        |_| match staged.borrow().as_ref() {
            Some(copy) => content.publish(copy),
            None => Ok(()),
        },
    );

    let update = match outcome {
        Ok(update) => update,
        Err(e) => {
            if let Some(copy) = staged.into_inner() {
                if let Err(cleanup) = content.abandon(&copy) {
                    warn!(area = %copy.area, error = %cleanup, "could not drop staged file area");
                }
            }
            return Err(e);
        }
    };

    info!(
        course = %request.course,
        element = %update.element_id,
        folder = %update.instance_id,
        files = update.files.len(),
        "files appended to folder"
    );
    Ok(update)
}
