//! Entity traits: identity and ownership.

use crate::id::UserId;

/// Entity marker + minimal interface.
pub trait Entity {
    /// Strongly-typed entity identifier.
    type Id: Copy + Eq + Ord + core::hash::Hash + core::fmt::Debug;

    /// Returns the entity identifier.
    fn id(&self) -> Self::Id;
}

/// A record owned by exactly one user.
///
/// The owner is what the access policy compares against the acting user.
/// Records without an owner of their own (client interactions) do not
/// implement this and inherit visibility from their parent instead.
pub trait Owned {
    fn owner_id(&self) -> UserId;
}

impl<T: Owned + ?Sized> Owned for &T {
    fn owner_id(&self) -> UserId {
        (**self).owner_id()
    }
}
