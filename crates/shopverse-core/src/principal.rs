// Authenticated identity and request-scoped security context

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Ordered role set attached to a principal
pub type Roles = BTreeSet<String>;

/// An authenticated actor and its role set
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    /// Login id of the member
    pub id: String,
    /// Roles granted to the member
    pub roles: Roles,
}

impl Principal {
    pub fn new<I, S>(id: impl Into<String>, roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            id: id.into(),
            roles: roles.into_iter().map(Into::into).collect(),
        }
    }

    /// Check if principal has a specific role
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.contains(role)
    }
}

/// Per-request authentication state populated by the gate
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SecurityContext {
    /// No bearer credential was presented
    #[default]
    Anonymous,
    /// A valid access token was presented and roles were re-resolved
    Authenticated(Principal),
}

impl SecurityContext {
    pub fn principal(&self) -> Option<&Principal> {
        match self {
            SecurityContext::Anonymous => None,
            SecurityContext::Authenticated(p) => Some(p),
        }
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, SecurityContext::Authenticated(_))
    }
}
