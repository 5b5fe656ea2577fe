use core::str::FromStr;

use serde::{Deserialize, Serialize};

use estatecrm_core::DomainError;

/// Action an actor attempts on a record.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    View,
    Create,
    Edit,
    Delete,
    /// Creating, editing, deactivating or deleting user accounts.
    ManageStaff,
}

impl Action {
    pub const ALL: [Action; 5] = [
        Action::View,
        Action::Create,
        Action::Edit,
        Action::Delete,
        Action::ManageStaff,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Action::View => "view",
            Action::Create => "create",
            Action::Edit => "edit",
            Action::Delete => "delete",
            Action::ManageStaff => "manage_staff",
        }
    }

    /// Record-level actions staff may perform on records they own.
    pub fn is_record_action(&self) -> bool {
        !matches!(self, Action::ManageStaff)
    }
}

impl FromStr for Action {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Action::ALL
            .into_iter()
            .find(|a| a.as_str() == s.trim())
            .ok_or_else(|| DomainError::validation(format!("unknown action '{s}'")))
    }
}

impl core::fmt::Display for Action {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}
