//! User accounts (agents, managers, administrators).
//!
//! Accounts are created by an administrator, or bootstrapped on first run.
//! They are deactivated rather than deleted once they own records. Every
//! operation takes the acting user explicitly and returns a new value.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use estatecrm_core::{DomainError, DomainResult, Entity, UserId};

use crate::{Actor, Role, authorize_staff_management};

// ─────────────────────────────────────────────────────────────────────────────
// User Status
// ─────────────────────────────────────────────────────────────────────────────

/// User account status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum UserStatus {
    /// User can sign in and act.
    #[default]
    Active,
    /// User is deactivated: cannot act, but still owns their records.
    Inactive,
}

impl core::fmt::Display for UserStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            UserStatus::Active => write!(f, "active"),
            UserStatus::Inactive => write!(f, "inactive"),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// User
// ─────────────────────────────────────────────────────────────────────────────

/// A user account.
///
/// # Invariants
/// - `username` is non-empty and contains no whitespace.
/// - `email` is trimmed, lowercased and contains an `@`.
/// - Username and email uniqueness (case-insensitive) is enforced by the store.
/// - Users cannot change their own role, deactivate or delete themselves.
/// - Only admins grant the admin role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub email: String,
    #[serde(flatten)]
    pub profile: Profile,
    pub role: Role,
    pub status: UserStatus,
    pub created_by: Option<UserId>,
    pub created_at: DateTime<Utc>,
}

/// Personal details a user may edit on their own account.
///
/// Blank values are stored as `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
}

impl Profile {
    fn normalized(self) -> Self {
        Self {
            first_name: non_blank(self.first_name),
            last_name: non_blank(self.last_name),
            phone: non_blank(self.phone),
        }
    }

    /// "First Last", or `None` when neither is set.
    pub fn full_name(&self) -> Option<String> {
        let parts: Vec<&str> = [&self.first_name, &self.last_name]
            .into_iter()
            .flatten()
            .map(String::as_str)
            .collect();
        (!parts.is_empty()).then(|| parts.join(" "))
    }
}

/// Input for creating a user account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub role: Role,
    #[serde(default)]
    pub profile: Profile,
}

impl User {
    /// First-run administrator, created without an acting user.
    pub fn bootstrap_admin(id: UserId, username: &str, email: &str, now: DateTime<Utc>) -> DomainResult<Self> {
        Ok(Self {
            id,
            username: normalize_username(username)?,
            email: normalize_email(email)?,
            profile: Profile::default(),
            role: Role::Admin,
            status: UserStatus::Active,
            created_by: None,
            created_at: now,
        })
    }

    /// Create an account on behalf of `actor`.
    pub fn create(actor: &Actor, id: UserId, new: NewUser, now: DateTime<Utc>) -> DomainResult<Self> {
        authorize_staff_management(actor)?;
        ensure_may_grant(actor, new.role)?;

        Ok(Self {
            id,
            username: normalize_username(&new.username)?,
            email: normalize_email(&new.email)?,
            profile: new.profile.normalized(),
            role: new.role,
            status: UserStatus::Active,
            created_by: Some(actor.id),
            created_at: now,
        })
    }

    pub fn is_active(&self) -> bool {
        self.status == UserStatus::Active
    }

    /// The actor this account acts as. Deactivated accounts cannot act.
    pub fn actor(&self) -> DomainResult<Actor> {
        if !self.is_active() {
            return Err(DomainError::forbidden(format!(
                "user '{}' is deactivated",
                self.username
            )));
        }
        Ok(Actor::new(self.id, self.role))
    }

    pub fn rename(&self, actor: &Actor, username: &str) -> DomainResult<Self> {
        authorize_staff_management(actor)?;
        Ok(Self {
            username: normalize_username(username)?,
            ..self.clone()
        })
    }

    pub fn change_email(&self, actor: &Actor, email: &str) -> DomainResult<Self> {
        authorize_staff_management(actor)?;
        Ok(Self {
            email: normalize_email(email)?,
            ..self.clone()
        })
    }

    /// Replace the personal details. Users edit their own profile; staff
    /// managers may edit anyone's.
    pub fn update_profile(&self, actor: &Actor, profile: Profile) -> DomainResult<Self> {
        if actor.id != self.id {
            authorize_staff_management(actor)?;
        }
        Ok(Self {
            profile: profile.normalized(),
            ..self.clone()
        })
    }

    pub fn change_role(&self, actor: &Actor, role: Role) -> DomainResult<Self> {
        authorize_staff_management(actor)?;
        self.ensure_not_self(actor, "change your own role")?;
        ensure_may_grant(actor, role)?;
        if self.role == Role::Admin && actor.role != Role::Admin {
            return Err(DomainError::forbidden("only admins may change an admin's role"));
        }

        Ok(Self {
            role,
            ..self.clone()
        })
    }

    pub fn deactivate(&self, actor: &Actor) -> DomainResult<Self> {
        authorize_staff_management(actor)?;
        self.ensure_not_self(actor, "deactivate your own account")?;
        if !self.is_active() {
            return Err(DomainError::invariant("user already inactive"));
        }

        Ok(Self {
            status: UserStatus::Inactive,
            ..self.clone()
        })
    }

    pub fn activate(&self, actor: &Actor) -> DomainResult<Self> {
        authorize_staff_management(actor)?;
        if self.is_active() {
            return Err(DomainError::invariant("user already active"));
        }

        Ok(Self {
            status: UserStatus::Active,
            ..self.clone()
        })
    }

    /// Check that `actor` may hard-delete this account.
    ///
    /// Accounts that still own records (clients, listings, deals, tasks) must
    /// be deactivated instead.
    pub fn ensure_deletable(&self, actor: &Actor, owns_records: bool) -> DomainResult<()> {
        authorize_staff_management(actor)?;
        self.ensure_not_self(actor, "delete your own account")?;
        if owns_records {
            return Err(DomainError::conflict(format!(
                "user '{}' still owns records; deactivate instead",
                self.username
            )));
        }
        Ok(())
    }

    fn ensure_not_self(&self, actor: &Actor, what: &str) -> DomainResult<()> {
        if actor.id == self.id {
            return Err(DomainError::invariant(format!("you cannot {what}")));
        }
        Ok(())
    }
}

impl Entity for User {
    type Id = UserId;

    fn id(&self) -> Self::Id {
        self.id
    }
}

/// Privilege escalation check: only admins grant the admin role.
fn ensure_may_grant(actor: &Actor, role: Role) -> DomainResult<()> {
    if role == Role::Admin && actor.role != Role::Admin {
        return Err(DomainError::forbidden("only admins may grant the admin role"));
    }
    Ok(())
}

fn normalize_username(username: &str) -> DomainResult<String> {
    let username = username.trim();
    if username.is_empty() {
        return Err(DomainError::validation("username cannot be empty"));
    }
    if username.chars().any(char::is_whitespace) {
        return Err(DomainError::validation("username cannot contain whitespace"));
    }
    Ok(username.to_string())
}

/// Trimmed, lowercased address with exactly one `@` between non-empty parts.
pub fn normalize_email(email: &str) -> DomainResult<String> {
    let email = email.trim().to_lowercase();
    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty() && !domain.is_empty() && !domain.contains('@') && !email.contains(char::is_whitespace)
        }
        None => false,
    };
    if !valid {
        return Err(DomainError::validation(format!("invalid email address '{email}'")));
    }
    Ok(email)
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

/// Staff list filter: exact status/role plus a case-insensitive search over
/// username, first name, last name and email.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StaffFilter {
    pub status: Option<UserStatus>,
    pub role: Option<Role>,
    pub search: Option<String>,
}

impl StaffFilter {
    pub fn matches(&self, user: &User) -> bool {
        self.status.is_none_or(|s| s == user.status)
            && self.role.is_none_or(|r| r == user.role)
            && match self.search.as_deref().map(str::trim) {
                None | Some("") => true,
                Some(needle) => {
                    let needle = needle.to_lowercase();
                    [
                        Some(&user.username),
                        user.profile.first_name.as_ref(),
                        user.profile.last_name.as_ref(),
                        Some(&user.email),
                    ]
                    .into_iter()
                    .flatten()
                    .any(|field| field.to_lowercase().contains(&needle))
                }
            }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
