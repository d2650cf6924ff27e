//! Permission predicates evaluated against an [`Actor`].
//!
//! A predicate is a tree: leaves test one attribute of the actor, `AllOf` and
//! `AnyOf` own their children. Evaluation is synchronous and pure. A leaf that
//! needs an attribute the actor does not carry (no guild, no roles) is false.

use crate::domain::entities::{Actor, Capability};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Permission {
    /// No restriction
    #[default]
    Public,
    /// Actor holds the capability through one of its roles
    Capability(Capability),
    /// Actor is the configured bot owner
    Owner(String),
    /// Actor has a role with this name
    Role(String),
    /// Actor belongs to this context (guild id)
    Context(String),
    /// Every child allows
    AllOf(Vec<Permission>),
    /// At least one child allows
    AnyOf(Vec<Permission>),
}

impl Permission {
    pub fn owner(owner_id: impl Into<String>) -> Self {
        Permission::Owner(owner_id.into())
    }

    pub fn all_of(children: impl IntoIterator<Item = Permission>) -> Self {
        Permission::AllOf(children.into_iter().collect())
    }

    pub fn any_of(children: impl IntoIterator<Item = Permission>) -> Self {
        Permission::AnyOf(children.into_iter().collect())
    }

    pub fn allows(&self, actor: &Actor) -> bool {
        match self {
            Permission::Public => true,
            Permission::Capability(cap) => actor.guild_id.is_some() && actor.has_capability(*cap),
            Permission::Owner(id) => !id.is_empty() && actor.id == *id,
            Permission::Role(name) => actor.guild_id.is_some() && actor.has_role(name),
            Permission::Context(guild) => actor.guild_id.as_deref() == Some(guild.as_str()),
            Permission::AllOf(children) => children.iter().all(|p| p.allows(actor)),
            Permission::AnyOf(children) => children.iter().any(|p| p.allows(actor)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::Role;

    fn moderator() -> Actor {
        Actor::new("10", "mod")
            .with_guild("g1")
            .with_role(Role::new("r1", "mods").with_capability(Capability::ManageMessages))
    }

    fn stranger() -> Actor {
        Actor::new("20", "someone")
    }

    #[test]
    fn public_allows_everyone() {
        assert!(Permission::Public.allows(&stranger()));
        assert!(Permission::default().allows(&moderator()));
    }

    #[test]
    fn leaves_are_false_when_attributes_are_missing() {
        let actor = stranger();
        assert!(!Permission::Capability(Capability::ManageMessages).allows(&actor));
        assert!(!Permission::Role("mods".into()).allows(&actor));
        assert!(!Permission::Context("g1".into()).allows(&actor));
    }

    #[test]
    fn owner_matches_id_only() {
        assert!(Permission::owner("20").allows(&stranger()));
        assert!(!Permission::owner("10").allows(&stranger()));
        assert!(!Permission::owner("").allows(&Actor::new("", "blank")));
    }

    #[test]
    fn any_of_is_true_iff_one_child_is_true() {
        let leaves = [
            Permission::owner("99"),
            Permission::Capability(Capability::ManageMessages),
            Permission::Context("other".into()),
        ];
        let any = Permission::any_of(leaves.clone());
        let actor = moderator();
        assert_eq!(any.allows(&actor), leaves.iter().any(|p| p.allows(&actor)));
        assert!(any.allows(&actor));
        assert!(!any.allows(&stranger()));
        assert!(!Permission::any_of([]).allows(&actor));
    }

    #[test]
    fn all_of_is_true_iff_every_child_is_true() {
        let actor = moderator();
        let both = Permission::all_of([
            Permission::Context("g1".into()),
            Permission::Capability(Capability::ManageMessages),
        ]);
        assert!(both.allows(&actor));

        let one_false = Permission::all_of([
            Permission::Context("g1".into()),
            Permission::Capability(Capability::BanMembers),
        ]);
        assert!(!one_false.allows(&actor));
        assert!(Permission::all_of([]).allows(&actor));
    }

    #[test]
    fn nested_groups() {
        let perm = Permission::any_of([
            Permission::owner("20"),
            Permission::all_of([Permission::Role("mods".into()), Permission::Context("g1".into())]),
        ]);
        assert!(perm.allows(&moderator()));
        assert!(perm.allows(&stranger()));
        assert!(!perm.allows(&Actor::new("30", "other").with_guild("g1")));
    }
}
