//! Authentication user types.

use crate::db::Role;
use crate::jwt::AccessClaims;

/// Caller identity decoded from a verified access token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub id: i64,
    pub role: Role,
    pub name: String,
    pub email: String,
}

impl From<AccessClaims> for Identity {
    fn from(claims: AccessClaims) -> Self {
        Self {
            id: claims.id,
            role: claims.role,
            name: claims.name,
            email: claims.email,
        }
    }
}

/// Set of roles allowed through a role guard. Empty admits any authenticated caller.
#[derive(Debug, Clone, Copy)]
pub struct AllowedRoles(pub &'static [Role]);

impl AllowedRoles {
    pub fn permits(&self, role: Role) -> bool {
        self.0.is_empty() || self.0.contains(&role)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allowed_roles() {
        let admin_only = AllowedRoles(&[Role::Admin]);
        assert!(admin_only.permits(Role::Admin));
        assert!(!admin_only.permits(Role::Foreman));

        let anyone = AllowedRoles(&[]);
        for role in Role::ALL {
            assert!(anyone.permits(role));
        }
    }
}
