//! # Coursesync Architecture
//!
//! Coursesync is a **library of course-structure operations** that happens to
//! ship a binary. Remote callers add sections, links, file resources and
//! folders to a course and reposition existing elements; the library keeps the
//! ordering of sections and elements total and dense while doing so.
//!
//! ## The Layers
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  CLI Layer (cli/, wired by main.rs)                         │
//! │  - Parses arguments, prints results, owns exit codes        │
//! │  - Installs logging, loads configuration                    │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Transport Boundary (rpc.rs)                                │
//! │  - Function registry, wire scalars → typed values           │
//! │  - Line-delimited JSON request/reply                        │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  API Layer (api.rs)                                         │
//! │  - Authorizes, then dispatches to commands                  │
//! │  - Generic over store, content store and authorizer         │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Command Layer (commands/*.rs)                              │
//! │  - Element factory, section insert, move engine, folders    │
//! │  - Ordering rules live in positioning.rs                    │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Storage Layer (store/, content/)                           │
//! │  - StructureStore: snapshot + atomic transactions           │
//! │  - ContentStore: upload drafts and instance file areas      │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Key Principle: Check Before You Touch
//!
//! Every mutating operation follows the same order:
//!
//! 1. Authorize the principal for the operation's capability.
//! 2. Parse and validate inputs.
//! 3. Inside one store transaction, resolve every reference (course, section,
//!    before-element) and fail with `NotFound` before mutating.
//! 4. Mutate the private copy and commit it atomically.
//!
//! A failure at any step leaves the stored structure exactly as it was.
//!
//! ## Testing Strategy
//!
//! 1. **Commands** (`commands/*.rs`): thorough unit tests against in-memory
//!    stores. This is where most tests live.
//! 2. **API and rpc**: authorization ordering and wire decoding.
//! 3. **Integration** (`tests/`): the filesystem backends and the binary.
//!
//! ## Module Overview
//!
//! - [`api`]: The API facade
//! - [`rpc`]: Function registry and wire decoding
//! - [`commands`]: Business logic per operation
//! - [`positioning`]: Section shift-and-insert and element placement
//! - [`visibility`]: Availability/visibility encoding
//! - [`auth`]: Principals, capabilities, grants
//! - [`model`]: Courses, sections, elements and kind instances
//! - [`store`]: Structure store abstraction and backends
//! - [`content`]: Upload drafts and file areas
//! - [`config`]: Configuration loading
//! - [`error`]: Error taxonomy
//! - `cli`: Argument parsing and printing for the binary (not part of the lib API)

pub mod api;
pub mod auth;
pub mod commands;
pub mod config;
pub mod content;
pub mod error;
pub mod model;
pub mod positioning;
pub mod rpc;
pub mod store;
pub mod visibility;
