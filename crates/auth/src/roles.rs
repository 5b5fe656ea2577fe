use core::str::FromStr;

use serde::{Deserialize, Serialize};

use estatecrm_core::DomainError;

/// Role of a user within the agency.
///
/// The set is closed: role names coming from storage or sessions are parsed
/// with `FromStr`, and anything outside it is an `InvalidRole` error.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Staff,
    Manager,
    Admin,
}

impl Role {
    pub const ALL: [Role; 3] = [Role::Staff, Role::Manager, Role::Admin];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Staff => "staff",
            Role::Manager => "manager",
            Role::Admin => "admin",
        }
    }

    /// Managers and admins see and act on every record.
    pub fn sees_everything(&self) -> bool {
        matches!(self, Role::Manager | Role::Admin)
    }

    pub fn description(&self) -> &'static str {
        match self {
            Role::Staff => "Agent working their own clients, listings and deals",
            Role::Manager => "Manager with access to every agent's records",
            Role::Admin => "Administrator with full access, including staff accounts",
        }
    }
}

impl FromStr for Role {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "staff" => Ok(Role::Staff),
            "manager" => Ok(Role::Manager),
            "admin" => Ok(Role::Admin),
            _ => Err(DomainError::invalid_role(s)),
        }
    }
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}
