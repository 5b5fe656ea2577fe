//! Record visibility filter: the access policy applied to list/detail queries.

use estatecrm_core::{Owned, UserId};

use crate::{Action, Actor, Role, can_access};

/// Keep the records `actor_role`/`actor_id` may view, in their original order.
///
/// Managers and admins get every record back; staff only the ones they own.
pub fn filter_visible<T, I>(records: I, actor_role: Role, actor_id: UserId) -> Vec<T>
where
    I: IntoIterator<Item = T>,
    T: Owned,
{
    records
        .into_iter()
        .filter(|r| can_access(actor_role, actor_id, r.owner_id(), Action::View))
        .collect()
}

impl Actor {
    /// [`filter_visible`] for this actor.
    pub fn visible<T, I>(&self, records: I) -> Vec<T>
    where
        I: IntoIterator<Item = T>,
        T: Owned,
    {
        filter_visible(records, self.role, self.id)
    }

    /// Whether a single record is visible to this actor.
    pub fn sees<T: Owned + ?Sized>(&self, record: &T) -> bool {
        self.can(Action::View, record.owner_id())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[derive(Debug, Clone, PartialEq, Eq)]
    struct Rec {
        tag: u32,
        owner: UserId,
    }

    impl Owned for Rec {
        fn owner_id(&self) -> UserId {
            self.owner
        }
    }

    fn recs(owners: &[u64]) -> Vec<Rec> {
        owners
            .iter()
            .enumerate()
            .map(|(i, o)| Rec {
                tag: i as u32,
                owner: UserId::new(*o),
            })
            .collect()
    }

    #[test]
    fn staff_sees_only_own_records_in_order() {
        let records = recs(&[3, 5, 5, 7]);
        let visible = filter_visible(records.clone(), Role::Staff, UserId::new(5));
        assert_eq!(visible, vec![records[1].clone(), records[2].clone()]);
    }

    #[test]
    fn managers_and_admins_see_everything_unchanged() {
        let records = recs(&[3, 5, 5, 7]);
        for role in [Role::Manager, Role::Admin] {
            assert_eq!(filter_visible(records.clone(), role, UserId::new(99)), records);
        }
    }

    #[test]
    fn empty_input_yields_empty_output() {
        let visible: Vec<Rec> = filter_visible(Vec::new(), Role::Staff, UserId::new(1));
        assert!(visible.is_empty());
    }

    #[test]
    fn works_over_borrowed_records() {
        let records = recs(&[1, 2, 1]);
        let actor = Actor::new(UserId::new(1), Role::Staff);
        let visible: Vec<&Rec> = actor.visible(&records);
        assert_eq!(visible.len(), 2);
        assert!(actor.sees(&records[0]));
        assert!(!actor.sees(&records[1]));
    }

    proptest! {
        /// Property: the staff view is exactly the owned subsequence.
        #[test]
        fn staff_view_is_owned_subsequence(
            owners in prop::collection::vec(0u64..6, 0..40),
            me in 0u64..6,
        ) {
            let records = recs(&owners);
            let visible = filter_visible(records.clone(), Role::Staff, UserId::new(me));
            let expected: Vec<Rec> = records.into_iter().filter(|r| r.owner.get() == me).collect();
            prop_assert_eq!(visible, expected);
        }
    }
}
