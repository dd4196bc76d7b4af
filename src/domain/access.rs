//! Route and operation gating over a typed session.
//!
//! Identity itself comes from an external session provider; this module only
//! decides what an already-established session may reach.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Customer,
    Kitchen,
    Admin,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub user_id: String,
    pub role: Role,
}

impl Session {
    pub fn new(user_id: impl Into<String>, role: Role) -> Self {
        Self {
            user_id: user_id.into(),
            role,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    CancelPendingOrder,
    UpdateOrderStatus,
}

impl Role {
    pub fn can(self, capability: Capability) -> bool {
        match capability {
            Capability::CancelPendingOrder => true,
            Capability::UpdateOrderStatus => matches!(self, Role::Kitchen | Role::Admin),
        }
    }
}

/// Section of the application a route belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Area {
    Public,
    Kitchen,
    Admin,
}

impl Area {
    pub fn for_path(path: &str) -> Area {
        let under = |prefix: &str| {
            path == prefix
                || path
                    .strip_prefix(prefix)
                    .is_some_and(|rest| rest.starts_with('/'))
        };

        if under("/admin") || under("/menu/management") {
            Area::Admin
        } else if under("/kitchen") {
            Area::Kitchen
        } else {
            Area::Public
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AccessError {
    #[error("Authentication required")]
    Unauthenticated,
    #[error("Permission denied: {0}")]
    Forbidden(String),
}

/// The single authorization check, called once per route boundary.
pub fn authorize(session: Option<&Session>, area: Area) -> Result<(), AccessError> {
    if area == Area::Public {
        return Ok(());
    }
    let session = session.ok_or(AccessError::Unauthenticated)?;
    let allowed = match area {
        Area::Public => true,
        Area::Kitchen => matches!(session.role, Role::Kitchen | Role::Admin),
        Area::Admin => session.role == Role::Admin,
    };
    if allowed {
        Ok(())
    } else {
        log::warn!("Denied {:?} access to user {}", area, session.user_id);
        Err(AccessError::Forbidden(format!("{:?} area", area).to_lowercase()))
    }
}

/// Operation-level counterpart of [`authorize`].
pub fn require(session: &Session, capability: Capability) -> Result<(), AccessError> {
    if session.role.can(capability) {
        Ok(())
    } else {
        log::warn!("User {} lacks {:?}", session.user_id, capability);
        Err(AccessError::Forbidden(format!("{:?}", capability)))
    }
}
