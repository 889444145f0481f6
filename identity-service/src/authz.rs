/// Authorization policy shared by both transport adapters
///
/// Every protected operation goes through [`can_perform`] so the REST and
/// gRPC surfaces cannot drift apart. Adapters call [`require`] before
/// invoking the service layer; the service itself carries no authorization
/// logic.
use crate::error::{IdentityError, Result};
use crate::models::{PublicUser, Role};
use uuid::Uuid;

/// The authenticated caller, resolved from a validated bearer token
#[derive(Debug, Clone)]
pub struct Actor {
    pub id: Uuid,
    pub role: Role,
}

impl From<&PublicUser> for Actor {
    fn from(user: &PublicUser) -> Self {
        Self {
            id: user.id,
            role: user.role,
        }
    }
}

/// A logical operation on the identity service.
///
/// `target` is `None` when the requested id is structurally invalid: no
/// account owns it, so only admins proceed (to a not-found outcome).
#[derive(Debug, Clone)]
pub enum Operation {
    ListUsers,
    ReadUser { target: Option<Uuid> },
    ReadUserByUsername,
    Register,
    UpdateUser { target: Option<Uuid>, changes_role: bool },
    DeleteUser { target: Option<Uuid> },
    Authenticate,
}

/// The authorization matrix:
///
/// | Operation            | Allowed callers                              |
/// |----------------------|----------------------------------------------|
/// | list accounts        | admin only                                   |
/// | read account by id   | admin, or the account's own owner            |
/// | read by username     | anyone (public)                              |
/// | register             | anyone (public)                              |
/// | update account       | admin, or owner; only admin may change role  |
/// | delete account       | admin, or owner                              |
/// | authenticate (login) | anyone (public)                              |
pub fn can_perform(actor: Option<&Actor>, operation: &Operation) -> bool {
    let is_admin = matches!(actor, Some(a) if a.role == Role::Admin);
    let owns = |target: &Option<Uuid>| match (actor, target) {
        (Some(a), Some(t)) => a.id == *t,
        _ => false,
    };

    match operation {
        Operation::ReadUserByUsername | Operation::Register | Operation::Authenticate => true,
        Operation::ListUsers => is_admin,
        Operation::ReadUser { target } | Operation::DeleteUser { target } => {
            is_admin || owns(target)
        }
        Operation::UpdateUser {
            target,
            changes_role,
        } => is_admin || (owns(target) && !changes_role),
    }
}

/// Enforce the matrix, mapping a denial to the caller-visible error:
/// no credentials at all is `Unauthenticated`, insufficient role or
/// ownership is `Forbidden`.
pub fn require(actor: Option<&Actor>, operation: &Operation) -> Result<()> {
    if can_perform(actor, operation) {
        Ok(())
    } else if actor.is_none() {
        Err(IdentityError::Unauthenticated)
    } else {
        Err(IdentityError::Forbidden)
    }
}
