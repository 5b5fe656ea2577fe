//! `estatecrm-auth`: role-based access policy and record visibility.
//!
//! Pure decision functions; no HTTP, no storage, no ambient current user.

pub mod authorize;
pub mod permissions;
pub mod roles;
pub mod user;
pub mod visibility;

pub use authorize::{
    AccessExplanation, Actor, AuthzError, RoleDefinition, authorize, authorize_staff_management,
    can_access, check_access, explain_access, role_catalog,
};
pub use permissions::Action;
pub use roles::Role;
pub use user::{NewUser, Profile, StaffFilter, User, UserStatus, normalize_email};
pub use visibility::filter_visible;
