//! # Authorization
//!
//! Every mutating operation names exactly one [`Capability`] and a scope.
//! The API facade calls [`Authorizer::authorize`] before it touches anything
//! else, so a caller without the capability gets `Authorization` no matter how
//! broken the rest of the request is.
//!
//! Deciding *who* holds *what* is an external concern. The crate ships one
//! implementation, [`GrantTable`], which evaluates static grants loaded from
//! configuration:
//!
//! ```toml
//! [[grants]]
//! principal = "sync-bot"
//! capability = "*"          # every capability
//! course = 12               # only in course 12; omit for site-wide
//! ```

use crate::error::{Result, SyncError};
use crate::model::{CourseId, ElementId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The identity on whose behalf a call runs.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Principal(pub String);

impl Principal {
    pub fn new(name: impl Into<String>) -> Self {
        Principal(name.into())
    }
}

impl fmt::Display for Principal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Capability {
    #[serde(rename = "section:add")]
    AddSection,
    #[serde(rename = "link:add")]
    AddLink,
    #[serde(rename = "resource:add")]
    AddResource,
    #[serde(rename = "folder:add")]
    AddFolder,
    #[serde(rename = "element:move")]
    MoveElement,
}

impl Capability {
    pub const ALL: [Capability; 5] = [
        Capability::AddSection,
        Capability::AddLink,
        Capability::AddResource,
        Capability::AddFolder,
        Capability::MoveElement,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Capability::AddSection => "section:add",
            Capability::AddLink => "link:add",
            Capability::AddResource => "resource:add",
            Capability::AddFolder => "folder:add",
            Capability::MoveElement => "element:move",
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a capability is being exercised.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthScope {
    /// Used when the target cannot be resolved (malformed or unknown id).
    /// Only site-wide grants match.
    Site,
    Course(CourseId),
    Element {
        course: CourseId,
        element: ElementId,
    },
}

impl AuthScope {
    pub fn course(&self) -> Option<CourseId> {
        match self {
            AuthScope::Site => None,
            AuthScope::Course(course) | AuthScope::Element { course, .. } => Some(*course),
        }
    }
}

impl fmt::Display for AuthScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthScope::Site => f.write_str("site"),
            AuthScope::Course(course) => write!(f, "course {}", course),
            AuthScope::Element { course, element } => {
                write!(f, "element {} in course {}", element, course)
            }
        }
    }
}

pub trait Authorizer {
    fn authorize(
        &self,
        principal: &Principal,
        capability: Capability,
        scope: AuthScope,
    ) -> Result<()>;
}

/// Which capabilities a grant covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum GrantedCapability {
    One(Capability),
    All(AllCapabilities),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AllCapabilities {
    #[serde(rename = "*")]
    All,
}

impl GrantedCapability {
    fn covers(&self, capability: Capability) -> bool {
        match self {
            GrantedCapability::One(granted) => *granted == capability,
            GrantedCapability::All(_) => true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grant {
    pub principal: String,
    pub capability: GrantedCapability,
    /// Restrict the grant to one course; `None` grants site-wide.
    #[serde(default)]
    pub course: Option<CourseId>,
}

impl Grant {
    pub fn site(principal: impl Into<String>, capability: Capability) -> Self {
        Grant {
            principal: principal.into(),
            capability: GrantedCapability::One(capability),
            course: None,
        }
    }

    pub fn course(principal: impl Into<String>, capability: Capability, course: CourseId) -> Self {
        Grant {
            principal: principal.into(),
            capability: GrantedCapability::One(capability),
            course: Some(course),
        }
    }

    pub fn everything(principal: impl Into<String>) -> Self {
        Grant {
            principal: principal.into(),
            capability: GrantedCapability::All(AllCapabilities::All),
            course: None,
        }
    }

    fn matches(&self, principal: &Principal, capability: Capability, scope: AuthScope) -> bool {
        if self.principal != principal.0 || !self.capability.covers(capability) {
            return false;
        }
        match self.course {
            None => true,
            Some(granted) => scope.course() == Some(granted),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct GrantTable {
    grants: Vec<Grant>,
}

impl GrantTable {
    pub fn new(grants: Vec<Grant>) -> Self {
        Self { grants }
    }

    pub fn grants(&self) -> &[Grant] {
        &self.grants
    }
}

impl Authorizer for GrantTable {
    fn authorize(
        &self,
        principal: &Principal,
        capability: Capability,
        scope: AuthScope,
    ) -> Result<()> {
        if self
            .grants
            .iter()
            .any(|grant| grant.matches(principal, capability, scope))
        {
            return Ok(());
        }
        Err(SyncError::Authorization {
            principal: principal.to_string(),
            capability: capability.to_string(),
            scope: scope.to_string(),
        })
    }
}
