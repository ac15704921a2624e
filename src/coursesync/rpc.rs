//! # Transport Boundary
//!
//! Remote callers address operations by function name and pass parameters as
//! loose JSON scalars. This module owns that boundary:
//!
//! 1. Look the function up in the [`FUNCTIONS`] registry.
//! 2. Parse the **scope id** (course or element) first. If it is malformed,
//!    the call is authorized against the site before the parse error is
//!    reported.
//! 3. Parse every other field into typed values.
//! 4. Hand off to [`SyncApi`], which authorizes against the real scope and runs
//!    the command.
//!
//! Strings, numbers and booleans are all accepted for any field; JSON `null`
//! and a missing key both mean "absent".
//!
//! ## Line Protocol
//!
//! [`handle_line`] implements one request/reply exchange of the `serve`
//! transport:
//!
//! ```text
//! > {"function":"add_section","principal":"bot","params":{"course_id":3,"section_name":"Week 4","section_ordinal":4}}
//! < {"ok":{"status":"success"}}
//! > {"function":"move_element","principal":"bot","params":{"element_id":"x"}}
//! < {"error":{"kind":"authorization","message":"Access denied: bot lacks 'element:move' on site"}}
//! ```

use crate::api::SyncApi;
use crate::auth::{AuthScope, Authorizer, Capability, Principal};
use crate::commands::{ElementPayload, FolderAppend, NewElement};
use crate::content::ContentStore;
use crate::error::{ErrorKind, Result, SyncError};
use crate::model::{CourseId, DraftId, ElementId, InstanceId, SectionId};
use crate::store::StructureStore;
use crate::visibility::{self, Visibility};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::str::FromStr;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WriteType {
    Read,
    Write,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct FunctionDescriptor {
    pub name: &'static str,
    pub description: &'static str,
    pub capability: Capability,
    pub write_type: WriteType,
    pub params: &'static [&'static str],
}

pub const FUNCTIONS: &[FunctionDescriptor] = &[
    FunctionDescriptor {
        name: "add_section",
        description: "Add a section at an ordinal, shifting later sections down",
        capability: Capability::AddSection,
        write_type: WriteType::Write,
        params: &["course_id", "section_name", "section_ordinal"],
    },
    FunctionDescriptor {
        name: "add_link_element",
        description: "Add a URL link to a section",
        capability: Capability::AddLink,
        write_type: WriteType::Write,
        params: &[
            "course_id",
            "section_ordinal",
            "display_name",
            "url",
            "time?",
            "visible",
            "before_element_id?",
        ],
    },
    FunctionDescriptor {
        name: "add_file_resource_element",
        description: "Add a file resource from an upload area to a section",
        capability: Capability::AddResource,
        write_type: WriteType::Write,
        params: &[
            "course_id",
            "section_ordinal",
            "upload_ref",
            "display_name",
            "time?",
            "visible",
            "before_element_id?",
        ],
    },
    FunctionDescriptor {
        name: "add_folder_element",
        description: "Add a folder from an upload area to a section",
        capability: Capability::AddFolder,
        write_type: WriteType::Write,
        params: &[
            "course_id",
            "section_ordinal",
            "upload_ref",
            "display_name",
            "time?",
            "before_element_id?",
        ],
    },
    FunctionDescriptor {
        name: "move_element",
        description: "Move an element to a section, optionally before a sibling",
        capability: Capability::MoveElement,
        write_type: WriteType::Write,
        params: &["element_id", "destination_section_id", "before_element_id?"],
    },
    FunctionDescriptor {
        name: "append_files_to_folder",
        description: "Merge files from an upload area into an existing folder",
        capability: Capability::AddFolder,
        write_type: WriteType::Write,
        params: &[
            "course_id",
            "element_id",
            "upload_ref",
            "display_name",
            "folder_instance_id",
        ],
    },
];

pub fn descriptor(name: &str) -> Result<&'static FunctionDescriptor> {
    FUNCTIONS
        .iter()
        .find(|f| f.name == name)
        .ok_or_else(|| SyncError::validation(format!("unknown function '{}'", name)))
}

/// Named call parameters as received from the transport.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(transparent)]
pub struct Params(BTreeMap<String, Value>);

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.0.insert(key.to_string(), value.into());
        self
    }

    /// Parse `key=value` pairs as given on a command line.
    pub fn from_pairs<I, T>(pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = T>,
        T: AsRef<str>,
    {
        let mut params = Params::new();
        for pair in pairs {
            let pair = pair.as_ref();
            let (key, value) = pair.split_once('=').ok_or_else(|| {
                SyncError::validation(format!("expected key=value, got '{}'", pair))
            })?;
            params = params.with(key.trim(), value);
        }
        Ok(params)
    }

    /// The field as a string, or `None` when absent.
    pub fn optional_str(&self, key: &str) -> Result<Option<String>> {
        match self.0.get(key) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::String(s)) => Ok(Some(s.clone())),
            Some(Value::Number(n)) => Ok(Some(n.to_string())),
            Some(Value::Bool(b)) => Ok(Some(b.to_string())),
            Some(_) => Err(SyncError::validation(format!(
                "parameter '{}' must be a scalar",
                key
            ))),
        }
    }

    pub fn required_str(&self, key: &str) -> Result<String> {
        self.optional_str(key)?
            .ok_or_else(|| SyncError::validation(format!("missing parameter '{}'", key)))
    }

    pub fn optional<T>(&self, key: &str) -> Result<Option<T>>
    where
        T: FromStr<Err = SyncError>,
    {
        self.optional_str(key)?.map(|raw| raw.parse()).transpose()
    }

    pub fn required<T>(&self, key: &str) -> Result<T>
    where
        T: FromStr<Err = SyncError>,
    {
        self.required_str(key)?.parse()
    }

    pub fn ordinal(&self, key: &str) -> Result<usize> {
        let raw = self.required_str(key)?;
        raw.trim().parse().map_err(|_| {
            SyncError::validation(format!(
                "{} must be a non-negative integer, got '{}'",
                key, raw
            ))
        })
    }

    pub fn flag(&self, key: &str) -> Result<bool> {
        visibility::parse_flag(&self.required_str(key)?)
    }

    pub fn time(&self, key: &str) -> Result<Option<DateTime<Utc>>> {
        self.optional_str(key)?
            .map(|raw| visibility::parse_time(&raw))
            .transpose()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RpcRequest {
    pub function: String,
    #[serde(default)]
    pub principal: Option<String>,
    #[serde(default)]
    pub params: Params,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RpcResponse {
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub element_id: Option<String>,
}

impl RpcResponse {
    fn success() -> Self {
        RpcResponse {
            status: "success",
            element_id: None,
        }
    }

    fn created(element: ElementId) -> Self {
        RpcResponse {
            status: "success",
            element_id: Some(element.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RpcFailure {
    pub kind: ErrorKind,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RpcReply {
    Ok(RpcResponse),
    Error(RpcFailure),
}

impl From<Result<RpcResponse>> for RpcReply {
    fn from(result: Result<RpcResponse>) -> Self {
        match result {
            Ok(response) => RpcReply::Ok(response),
            Err(e) => RpcReply::Error(RpcFailure {
                kind: e.kind(),
                message: e.to_string(),
            }),
        }
    }
}

/// Run one named function with transport parameters.
pub fn dispatch<S, C, A>(
    api: &SyncApi<S, C, A>,
    principal: &Principal,
    function: &str,
    params: &Params,
) -> Result<RpcResponse>
where
    S: StructureStore,
    C: ContentStore,
    A: Authorizer,
{
    let descriptor = descriptor(function)?;
    debug!(function = descriptor.name, principal = %principal, "dispatching call");

    match descriptor.name {
        "add_section" => {
            let course = course_scope(api, principal, descriptor.capability, params)?;
            let name = params.optional_str("section_name")?.unwrap_or_default();
            let ordinal = params.ordinal("section_ordinal")?;
            api.add_section(principal, course, &name, ordinal)?;
            Ok(RpcResponse::success())
        }
        "add_link_element" => {
            let course = course_scope(api, principal, descriptor.capability, params)?;
            let payload = ElementPayload::link(&params.required_str("url")?)?;
            let visibility = visibility::encode(params.time("time")?, params.flag("visible")?);
            let request = new_element(course, params, payload, visibility)?;
            let placement = api.add_element(principal, request)?;
            Ok(RpcResponse::created(placement.element_id))
        }
        "add_file_resource_element" => {
            let course = course_scope(api, principal, descriptor.capability, params)?;
            let payload = ElementPayload::FileResource {
                upload: params.required::<DraftId>("upload_ref")?,
            };
            let visibility = visibility::encode(params.time("time")?, params.flag("visible")?);
            let request = new_element(course, params, payload, visibility)?;
            let placement = api.add_element(principal, request)?;
            Ok(RpcResponse::created(placement.element_id))
        }
        "add_folder_element" => {
            let course = course_scope(api, principal, descriptor.capability, params)?;
            let payload = ElementPayload::Folder {
                upload: params.required::<DraftId>("upload_ref")?,
            };
            // Folders carry no visibility flag of their own.
            let visibility = visibility::encode(params.time("time")?, true);
            let request = new_element(course, params, payload, visibility)?;
            let placement = api.add_element(principal, request)?;
            Ok(RpcResponse::created(placement.element_id))
        }
        "move_element" => {
            let element = gate(
                api,
                principal,
                descriptor.capability,
                params.required::<ElementId>("element_id"),
            )?;
            // The facade authorizes the element scope; bad targets only surface after that.
            let target = params
                .required::<SectionId>("destination_section_id")
                .and_then(|destination| {
                    let before = params.optional::<ElementId>("before_element_id")?;
                    Ok((destination, before))
                });
            match target {
                Ok((destination, before)) => {
                    api.move_element(principal, element, destination, before)?;
                }
                Err(e) => {
                    api.authorize(principal, descriptor.capability, api.element_scope(element)?)?;
                    return Err(e);
                }
            }
            Ok(RpcResponse::success())
        }
        "append_files_to_folder" => {
            let course = course_scope(api, principal, descriptor.capability, params)?;
            let request = FolderAppend {
                course,
                element: params.required::<ElementId>("element_id")?,
                upload: params.required::<DraftId>("upload_ref")?,
                name: params.required_str("display_name")?,
                instance: params.required::<InstanceId>("folder_instance_id")?,
            };
            api.append_files_to_folder(principal, request)?;
            Ok(RpcResponse::success())
        }
        other => Err(SyncError::validation(format!(
            "function '{}' has no handler",
            other
        ))),
    }
}

/// Parse and decode one request line, run it, and build the reply.
///
/// `fallback` is used when the request names no principal.
pub fn handle_line<S, C, A>(
    api: &SyncApi<S, C, A>,
    line: &str,
    fallback: Option<&Principal>,
) -> RpcReply
where
    S: StructureStore,
    C: ContentStore,
    A: Authorizer,
{
    let result = serde_json::from_str::<RpcRequest>(line)
        .map_err(|e| SyncError::validation(format!("malformed request: {}", e)))
        .and_then(|request| {
            let principal = match (request.principal, fallback) {
                (Some(name), _) => Principal::new(name),
                (None, Some(fallback)) => fallback.clone(),
                (None, None) => {
                    return Err(SyncError::validation("request names no principal"));
                }
            };
            dispatch(api, &principal, &request.function, &request.params)
        });
    result.into()
}

/// Run the authorization check against the site when the scope id itself
/// could not be parsed, then report the parse failure.
fn gate<S, C, A, T>(
    api: &SyncApi<S, C, A>,
    principal: &Principal,
    capability: Capability,
    parsed: Result<T>,
) -> Result<T>
where
    S: StructureStore,
    C: ContentStore,
    A: Authorizer,
{
    match parsed {
        Ok(value) => Ok(value),
        Err(e) => {
            api.authorize(principal, capability, AuthScope::Site)?;
            Err(e)
        }
    }
}

/// Parse `course_id` and authorize the course before any other field is read.
fn course_scope<S, C, A>(
    api: &SyncApi<S, C, A>,
    principal: &Principal,
    capability: Capability,
    params: &Params,
) -> Result<CourseId>
where
    S: StructureStore,
    C: ContentStore,
    A: Authorizer,
{
    let course = gate(api, principal, capability, params.required::<CourseId>("course_id"))?;
    api.authorize(principal, capability, AuthScope::Course(course))?;
    Ok(course)
}

fn new_element(
    course: CourseId,
    params: &Params,
    payload: ElementPayload,
    visibility: Visibility,
) -> Result<NewElement> {
    Ok(NewElement {
        course,
        section_ordinal: params.ordinal("section_ordinal")?,
        name: params.required_str("display_name")?,
        payload,
        visibility,
        before: params.optional::<ElementId>("before_element_id")?,
    })
}
