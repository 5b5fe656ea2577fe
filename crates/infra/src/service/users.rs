use estatecrm_auth::{NewUser, Profile, Role, StaffFilter, User, authorize_staff_management};
use estatecrm_core::{Clock, DomainError, DomainResult, UserId};
use estatecrm_reporting::{StaffSummary, summarize_staff};

use super::{CrmService, acting};
use crate::store::{CrmStore, Tables};

fn ensure_username_free(tables: &Tables, username: &str, except: Option<UserId>) -> DomainResult<()> {
    match tables.user_by_name(username) {
        Some(existing) if Some(existing.id) != except => Err(DomainError::conflict(format!(
            "username '{}' is already taken",
            existing.username
        ))),
        _ => Ok(()),
    }
}

fn ensure_email_free(tables: &Tables, email: &str, except: Option<UserId>) -> DomainResult<()> {
    match tables.user_by_email(email) {
        Some(existing) if Some(existing.id) != except => Err(DomainError::conflict(format!(
            "email '{}' is already registered",
            existing.email
        ))),
        _ => Ok(()),
    }
}

impl<S, C> CrmService<S, C>
where
    S: CrmStore,
    C: Clock,
{
    /// Create the first administrator. Only allowed while no user exists.
    pub fn bootstrap_admin(&self, username: &str, email: &str) -> DomainResult<User> {
        let now = self.clock.now();
        self.store.write(|t| {
            if !t.users.is_empty() {
                return Err(DomainError::conflict("an administrator already exists"));
            }
            let id = t.next_user_id();
            let admin = User::bootstrap_admin(id, username, email, now)?;
            t.users.insert(id, admin.clone());
            tracing::info!(user_id = %id, username = %admin.username, "bootstrapped administrator");
            Ok(admin)
        })
    }

    pub fn create_user(&self, actor_id: UserId, new: NewUser) -> DomainResult<User> {
        let now = self.clock.now();
        self.store.write(|t| {
            let actor = acting(t, actor_id)?;
            authorize_staff_management(&actor)?;
            ensure_username_free(t, &new.username, None)?;
            ensure_email_free(t, &new.email, None)?;

            let id = t.next_user_id();
            let user = User::create(&actor, id, new, now)?;
            t.users.insert(id, user.clone());
            tracing::info!(actor_id = %actor_id, user_id = %id, role = %user.role, "user created");
            Ok(user)
        })
    }

    /// A user's own account, or any account for staff managers.
    pub fn get_user(&self, actor_id: UserId, user_id: UserId) -> DomainResult<User> {
        self.store.read(|t| {
            let actor = acting(t, actor_id)?;
            let user = t.user(user_id)?;
            if user_id != actor_id {
                authorize_staff_management(&actor)?;
            }
            Ok(user.clone())
        })
    }

    /// Other staff members matching `filter`, newest first.
    pub fn list_staff(&self, actor_id: UserId, filter: &StaffFilter) -> DomainResult<Vec<User>> {
        self.store.read(|t| {
            let actor = acting(t, actor_id)?;
            authorize_staff_management(&actor)?;

            let mut staff: Vec<User> = t
                .users
                .values()
                .filter(|u| u.id != actor_id && filter.matches(u))
                .cloned()
                .collect();
            staff.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
            tracing::debug!(actor_id = %actor_id, count = staff.len(), "listed staff");
            Ok(staff)
        })
    }

    pub fn rename_user(&self, actor_id: UserId, user_id: UserId, username: &str) -> DomainResult<User> {
        self.store.write(|t| {
            let actor = acting(t, actor_id)?;
            authorize_staff_management(&actor)?;
            ensure_username_free(t, username, Some(user_id))?;
            let renamed = t.user(user_id)?.rename(&actor, username)?;
            t.users.insert(user_id, renamed.clone());
            tracing::info!(actor_id = %actor_id, user_id = %user_id, "user renamed");
            Ok(renamed)
        })
    }

    pub fn change_user_email(&self, actor_id: UserId, user_id: UserId, email: &str) -> DomainResult<User> {
        self.store.write(|t| {
            let actor = acting(t, actor_id)?;
            authorize_staff_management(&actor)?;
            ensure_email_free(t, email, Some(user_id))?;
            let updated = t.user(user_id)?.change_email(&actor, email)?;
            t.users.insert(user_id, updated.clone());
            tracing::info!(actor_id = %actor_id, user_id = %user_id, "user email changed");
            Ok(updated)
        })
    }

    /// The acting user's own name and phone.
    pub fn update_profile(&self, actor_id: UserId, profile: Profile) -> DomainResult<User> {
        self.store.write(|t| {
            let actor = acting(t, actor_id)?;
            let updated = t.user(actor_id)?.update_profile(&actor, profile)?;
            t.users.insert(actor_id, updated.clone());
            tracing::info!(actor_id = %actor_id, "profile updated");
            Ok(updated)
        })
    }

    pub fn change_user_role(&self, actor_id: UserId, user_id: UserId, role: Role) -> DomainResult<User> {
        self.store.write(|t| {
            let actor = acting(t, actor_id)?;
            let updated = t.user(user_id)?.change_role(&actor, role)?;
            t.users.insert(user_id, updated.clone());
            tracing::info!(actor_id = %actor_id, user_id = %user_id, role = %role, "user role changed");
            Ok(updated)
        })
    }

    pub fn deactivate_user(&self, actor_id: UserId, user_id: UserId) -> DomainResult<User> {
        self.store.write(|t| {
            let actor = acting(t, actor_id)?;
            let updated = t.user(user_id)?.deactivate(&actor)?;
            t.users.insert(user_id, updated.clone());
            tracing::info!(actor_id = %actor_id, user_id = %user_id, "user deactivated");
            Ok(updated)
        })
    }

    pub fn activate_user(&self, actor_id: UserId, user_id: UserId) -> DomainResult<User> {
        self.store.write(|t| {
            let actor = acting(t, actor_id)?;
            let updated = t.user(user_id)?.activate(&actor)?;
            t.users.insert(user_id, updated.clone());
            tracing::info!(actor_id = %actor_id, user_id = %user_id, "user activated");
            Ok(updated)
        })
    }

    /// Hard-delete an account that owns nothing.
    pub fn delete_user(&self, actor_id: UserId, user_id: UserId) -> DomainResult<()> {
        self.store.write(|t| {
            let actor = acting(t, actor_id)?;
            t.user(user_id)?.ensure_deletable(&actor, t.owns_records(user_id))?;
            t.users.remove(&user_id);
            tracing::info!(actor_id = %actor_id, user_id = %user_id, "user deleted");
            Ok(())
        })
    }

    pub fn staff_summary(&self, actor_id: UserId, user_id: UserId) -> DomainResult<StaffSummary> {
        self.store.read(|t| {
            let actor = acting(t, actor_id)?;
            let user = t.user(user_id)?;
            if user_id != actor_id {
                authorize_staff_management(&actor)?;
            }
            Ok(summarize_staff(user, t.deals.values(), t.clients.values(), t.properties.values()))
        })
    }

    /// Summaries for every staff member matching `filter`, newest first.
    pub fn staff_summaries(&self, actor_id: UserId, filter: &StaffFilter) -> DomainResult<Vec<StaffSummary>> {
        let staff = self.list_staff(actor_id, filter)?;
        Ok(self.store.read(|t| {
            staff
                .iter()
                .map(|u| summarize_staff(u, t.deals.values(), t.clients.values(), t.properties.values()))
                .collect()
        }))
    }
}
