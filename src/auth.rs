//! Caller identity. The engine itself is role-agnostic; front ends use
//! [`require_admin`] to decide who may drive it.

use derive_more::Display;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum Role {
    #[display("admin")]
    Admin,
    #[display("staff")]
    Staff,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentUser {
    pub id: String,
    pub role: Role,
}

pub trait AuthContext {
    fn current_user(&self) -> Option<CurrentUser>;
}

/// A fixed identity, e.g. the operator running a batch journal.
#[derive(Debug, Clone)]
pub struct StaticAuth(pub Option<CurrentUser>);

impl AuthContext for StaticAuth {
    fn current_user(&self) -> Option<CurrentUser> {
        self.0.clone()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AccessError {
    #[error("no authenticated user")]
    Unauthenticated,
    #[error("user `{id}` with role {role} may not modify the ledger")]
    Forbidden { id: String, role: Role },
}

pub fn require_admin(auth: &dyn AuthContext) -> Result<CurrentUser, AccessError> {
    let user = auth.current_user().ok_or(AccessError::Unauthenticated)?;
    match user.role {
        Role::Admin => Ok(user),
        Role::Staff => Err(AccessError::Forbidden {
            id: user.id,
            role: user.role,
        }),
    }
}
