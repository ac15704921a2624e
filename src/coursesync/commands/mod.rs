//! # Command Layer
//!
//! This module contains the **core business logic** of coursesync. Each operation
//! lives in its own submodule as plain functions over the store traits.
//!
//! ## Role and Responsibilities
//!
//! Commands are where the real work happens:
//! - Validate typed inputs (names, payload shapes)
//! - Resolve references inside a store transaction and fail with `NotFound`
//!   before mutating anything
//! - Delegate ordering to [`crate::positioning`]
//! - Return structured outcomes (ids, final positions), never strings
//!
//! ## What Commands Do NOT Do
//!
//! - **Authorization**: the API facade checks capabilities first
//! - **Transport parsing**: the `rpc` boundary turns strings into typed values
//! - **Any terminal I/O**
//!
//! ## Testing Strategy
//!
//! **This is where the lion's share of testing lives.** Command tests run
//! against `CourseStore<MemBackend>` and `MemContentStore`.
//!
//! ## Command Modules
//!
//! - [`course`]: Create courses and read their outline
//! - [`add_section`]: Shift-and-insert a new section
//! - [`add_element`]: Element factory for links, file resources and folders
//! - [`move_element`]: Move engine
//! - [`append_files`]: Merge uploaded files into an existing folder
//! - [`doctor`]: Verify structural invariants
//! - [`helpers`]: Shared input validation

pub mod add_element;
pub mod add_section;
pub mod append_files;
pub mod course;
pub mod doctor;
pub mod helpers;
pub mod move_element;

pub use add_element::{ElementPayload, ElementPlacement, NewElement};
pub use add_section::SectionPlacement;
pub use append_files::{FolderAppend, FolderUpdate};
pub use course::{CourseOutline, ElementOutline, SectionOutline};
pub use doctor::IntegrityReport;
pub use move_element::MoveOutcome;
