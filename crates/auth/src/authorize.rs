use serde::Serialize;
use thiserror::Error;

use estatecrm_core::{DomainError, DomainResult, UserId};

use crate::{Action, Role};

/// The authenticated user an operation runs on behalf of.
///
/// Passed explicitly into every access decision; there is no ambient
/// "current user".
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Actor {
    pub id: UserId,
    pub role: Role,
}

impl Actor {
    pub fn new(id: UserId, role: Role) -> Self {
        Self { id, role }
    }

    /// Build an actor from a stored role name, failing on unknown roles.
    pub fn parse(id: UserId, role_name: &str) -> DomainResult<Self> {
        Ok(Self::new(id, role_name.parse()?))
    }

    pub fn can(&self, action: Action, resource_owner_id: UserId) -> bool {
        can_access(self.role, self.id, resource_owner_id, action)
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthzError {
    #[error("{role} {actor_id} may not {action} a record owned by {owner_id}")]
    Forbidden {
        actor_id: UserId,
        role: Role,
        action: Action,
        owner_id: UserId,
    },

    #[error("{role} {actor_id} may not manage staff accounts")]
    StaffManagementDenied { actor_id: UserId, role: Role },
}

impl From<AuthzError> for DomainError {
    fn from(value: AuthzError) -> Self {
        DomainError::forbidden(value.to_string())
    }
}

/// The access policy.
///
/// - `admin`, `manager`: every action on every record.
/// - `staff`: record actions only on records they own; never staff management.
///
/// No IO, no panics, total over its inputs.
pub fn can_access(
    actor_role: Role,
    actor_id: UserId,
    resource_owner_id: UserId,
    action: Action,
) -> bool {
    match actor_role {
        Role::Admin | Role::Manager => true,
        Role::Staff => action.is_record_action() && actor_id == resource_owner_id,
    }
}

/// [`can_access`] for a role name as stored or carried in a session.
///
/// An unknown role is an `InvalidRole` error, not a deny.
pub fn check_access(
    actor_role: &str,
    actor_id: UserId,
    resource_owner_id: UserId,
    action: Action,
) -> DomainResult<bool> {
    let role: Role = actor_role.parse()?;
    Ok(can_access(role, actor_id, resource_owner_id, action))
}

/// Authorize an action on a record owned by `resource_owner_id`.
pub fn authorize(actor: &Actor, resource_owner_id: UserId, action: Action) -> Result<(), AuthzError> {
    if action == Action::ManageStaff {
        return authorize_staff_management(actor);
    }
    if actor.can(action, resource_owner_id) {
        Ok(())
    } else {
        tracing::warn!(
            actor_id = %actor.id,
            role = %actor.role,
            action = %action,
            owner_id = %resource_owner_id,
            "access denied"
        );
        Err(AuthzError::Forbidden {
            actor_id: actor.id,
            role: actor.role,
            action,
            owner_id: resource_owner_id,
        })
    }
}

/// Authorize a staff-management action (user accounts have no owner).
pub fn authorize_staff_management(actor: &Actor) -> Result<(), AuthzError> {
    if actor.can(Action::ManageStaff, actor.id) {
        Ok(())
    } else {
        tracing::warn!(actor_id = %actor.id, role = %actor.role, "staff management denied");
        Err(AuthzError::StaffManagementDenied {
            actor_id: actor.id,
            role: actor.role,
        })
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Access Explanation
// ─────────────────────────────────────────────────────────────────────────────

/// Why an access decision came out the way it did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccessExplanation {
    pub actor_id: UserId,
    pub role: Role,
    pub action: Action,
    pub resource_owner_id: UserId,
    pub granted: bool,
    pub reason: String,
}

pub fn explain_access(actor: &Actor, resource_owner_id: UserId, action: Action) -> AccessExplanation {
    let granted = actor.can(action, resource_owner_id);
    let reason = match (actor.role, granted) {
        (Role::Admin | Role::Manager, _) => {
            format!("role '{}' grants every action on every record", actor.role)
        }
        (Role::Staff, true) => format!("staff member owns the record and may {action} it"),
        (Role::Staff, false) if !action.is_record_action() => {
            "staff members may not manage staff accounts".to_string()
        }
        (Role::Staff, false) => format!(
            "record is owned by user {resource_owner_id}; staff may only {action} their own records"
        ),
    };

    AccessExplanation {
        actor_id: actor.id,
        role: actor.role,
        action,
        resource_owner_id,
        granted,
        reason,
    }
}

/// Role with the actions it grants (for staff forms and audits).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoleDefinition {
    pub role: Role,
    pub description: &'static str,
    pub own_record_actions: Vec<Action>,
    pub any_record_actions: Vec<Action>,
}

/// Catalog of every role and what it is granted, derived from the policy.
pub fn role_catalog() -> Vec<RoleDefinition> {
    // Two distinct ids stand in for "own" and "someone else's" records.
    let me = UserId::new(1);
    let other = UserId::new(2);

    Role::ALL
        .into_iter()
        .map(|role| RoleDefinition {
            role,
            description: role.description(),
            own_record_actions: Action::ALL
                .into_iter()
                .filter(|a| can_access(role, me, me, *a))
                .collect(),
            any_record_actions: Action::ALL
                .into_iter()
                .filter(|a| can_access(role, me, other, *a))
                .collect(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn uid(n: u64) -> UserId {
        UserId::new(n)
    }

    #[test]
    fn staff_is_denied_on_someone_elses_record() {
        for action in Action::ALL {
            assert!(!can_access(Role::Staff, uid(1), uid(2), action));
        }
    }

    #[test]
    fn admin_is_allowed_regardless_of_owner() {
        for action in Action::ALL {
            assert!(can_access(Role::Admin, uid(1), uid(2), action));
            assert!(can_access(Role::Admin, uid(1), uid(1), action));
        }
    }

    #[test]
    fn manager_is_allowed_everything() {
        for action in Action::ALL {
            assert!(can_access(Role::Manager, uid(9), uid(4), action));
        }
    }

    #[test]
    fn staff_owner_gets_record_actions_but_not_staff_management() {
        assert!(can_access(Role::Staff, uid(3), uid(3), Action::View));
        assert!(can_access(Role::Staff, uid(3), uid(3), Action::Edit));
        assert!(can_access(Role::Staff, uid(3), uid(3), Action::Delete));
        assert!(can_access(Role::Staff, uid(3), uid(3), Action::Create));
        assert!(!can_access(Role::Staff, uid(3), uid(3), Action::ManageStaff));
    }

    #[test]
    fn check_access_rejects_unknown_roles() {
        let err = check_access("superuser", uid(1), uid(1), Action::View).unwrap_err();
        assert_eq!(err, DomainError::InvalidRole("superuser".to_string()));
        assert_eq!(check_access("manager", uid(1), uid(2), Action::Delete), Ok(true));
    }

    #[test]
    fn authorize_maps_to_forbidden() {
        let staff = Actor::new(uid(1), Role::Staff);
        let err = authorize(&staff, uid(2), Action::Edit).unwrap_err();
        assert!(matches!(err, AuthzError::Forbidden { action: Action::Edit, .. }));

        let domain: DomainError = err.into();
        assert!(matches!(domain, DomainError::Forbidden(msg) if msg.contains("edit")));

        let err = authorize(&staff, uid(1), Action::ManageStaff).unwrap_err();
        assert!(matches!(err, AuthzError::StaffManagementDenied { .. }));
    }

    #[test]
    fn explanation_matches_decision() {
        let staff = Actor::new(uid(1), Role::Staff);
        let denied = explain_access(&staff, uid(2), Action::View);
        assert!(!denied.granted);
        assert!(denied.reason.contains("owned by user 2"));

        let admin = Actor::new(uid(7), Role::Admin);
        let granted = explain_access(&admin, uid(2), Action::Delete);
        assert!(granted.granted);
    }

    #[test]
    fn catalog_reflects_policy() {
        let catalog = role_catalog();
        assert_eq!(catalog.len(), 3);

        let staff = catalog.iter().find(|d| d.role == Role::Staff).unwrap();
        assert_eq!(staff.own_record_actions.len(), 4);
        assert!(staff.any_record_actions.is_empty());

        let admin = catalog.iter().find(|d| d.role == Role::Admin).unwrap();
        assert_eq!(admin.any_record_actions, Action::ALL.to_vec());
    }

    fn any_role() -> impl Strategy<Value = Role> {
        prop_oneof![Just(Role::Staff), Just(Role::Manager), Just(Role::Admin)]
    }

    fn any_action() -> impl Strategy<Value = Action> {
        prop::sample::select(Action::ALL.to_vec())
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 256,
            ..ProptestConfig::default()
        })]

        /// Property: staff access on a record implies ownership of it.
        #[test]
        fn staff_access_implies_ownership(
            actor in 0u64..20,
            owner in 0u64..20,
            action in any_action(),
        ) {
            if can_access(Role::Staff, uid(actor), uid(owner), action) {
                prop_assert_eq!(actor, owner);
                prop_assert!(action.is_record_action());
            }
        }

        /// Property: `authorize` agrees with `can_access`.
        #[test]
        fn authorize_agrees_with_policy(
            role in any_role(),
            actor in 0u64..5,
            owner in 0u64..5,
            action in any_action(),
        ) {
            let a = Actor::new(uid(actor), role);
            let allowed = if action == Action::ManageStaff {
                can_access(role, uid(actor), uid(actor), action)
            } else {
                can_access(role, uid(actor), uid(owner), action)
            };
            prop_assert_eq!(authorize(&a, uid(owner), action).is_ok(), allowed);
        }
    }
}
