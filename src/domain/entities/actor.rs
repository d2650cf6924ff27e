use serde::{Deserialize, Serialize};
use std::fmt;

/// A capability an actor can hold through one of its roles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Capability {
    Administrator,
    ManageGuild,
    ManageRoles,
    ManageChannels,
    ManageMessages,
    KickMembers,
    BanMembers,
    MentionEveryone,
    SendMessages,
}

impl Capability {
    pub fn as_str(&self) -> &str {
        match self {
            Capability::Administrator => "administrator",
            Capability::ManageGuild => "manage-guild",
            Capability::ManageRoles => "manage-roles",
            Capability::ManageChannels => "manage-channels",
            Capability::ManageMessages => "manage-messages",
            Capability::KickMembers => "kick-members",
            Capability::BanMembers => "ban-members",
            Capability::MentionEveryone => "mention-everyone",
            Capability::SendMessages => "send-messages",
        }
    }
}

/// A named role inside a context (guild)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Role {
    pub id: String,
    pub name: String,
    pub capabilities: Vec<Capability>,
}

impl Role {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            capabilities: Vec::new(),
        }
    }

    pub fn with_capability(mut self, capability: Capability) -> Self {
        self.capabilities.push(capability);
        self
    }
}

/// The entity a permission is evaluated against.
///
/// Guild membership and roles are optional: an actor seen in a private
/// channel carries neither.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    pub id: String,
    pub name: String,
    pub guild_id: Option<String>,
    pub roles: Vec<Role>,
}

impl Actor {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            guild_id: None,
            roles: Vec::new(),
        }
    }

    pub fn with_guild(mut self, guild_id: impl Into<String>) -> Self {
        self.guild_id = Some(guild_id.into());
        self
    }

    pub fn with_role(mut self, role: Role) -> Self {
        self.roles.push(role);
        self
    }


    /// Administrator grants every other capability, as on the gateway side.
    pub fn has_capability(&self, capability: Capability) -> bool {
        self.roles.iter().any(|role| {
            role.capabilities
                .iter()
                .any(|c| *c == capability || *c == Capability::Administrator)
        })
    }

    pub fn has_role(&self, name: &str) -> bool {
        self.roles.iter().any(|r| r.name == name)
    }
}

impl fmt::Display for Actor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn administrator_implies_other_capabilities() {
        let admin = Actor::new("1", "root")
            .with_guild("g")
            .with_role(Role::new("r", "admins").with_capability(Capability::Administrator));
        assert!(admin.has_capability(Capability::ManageRoles));
        assert!(admin.has_capability(Capability::BanMembers));
    }

    #[test]
    fn actor_without_roles_holds_nothing() {
        let user = Actor::new("2", "guest");
        assert!(!user.has_capability(Capability::SendMessages));
        assert!(!user.has_role("admins"));
    }
}
