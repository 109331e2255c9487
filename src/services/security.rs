use std::{fmt, str::FromStr};

use serde_with::{DeserializeFromStr, SerializeDisplay};

/// Capability level of the user performing a request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, SerializeDisplay, DeserializeFromStr)]
pub enum Role {
    #[default]
    User,
    Moderator,
    Admin,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Role::User => "user",
            Role::Moderator => "moderator",
            Role::Admin => "admin",
        })
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "user" => Ok(Role::User),
            "moderator" | "mod" => Ok(Role::Moderator),
            "admin" => Ok(Role::Admin),
            other => Err(format!("unknown role `{other}`")),
        }
    }
}

/// Authenticated user on whose behalf an operation runs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Actor {
    pub name: Option<String>,
    pub role: Role,
}

impl Actor {
    /// Named actor holding `role`.
    pub fn new(name: impl Into<String>, role: Role) -> Self {
        Self {
            name: Some(name.into()),
            role,
        }
    }

    /// Unnamed visitor with the user role.
    pub fn anonymous() -> Self {
        Self::default()
    }
}

/// Admins inherit the moderator capability.
pub fn is_moderator(actor: &Actor) -> bool {
    actor.role >= Role::Moderator
}

pub fn is_admin(actor: &Actor) -> bool {
    actor.role == Role::Admin
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capabilities_follow_role_order() {
        let user = Actor::new("ann", Role::User);
        let moderator = Actor::new("bob", "Moderator".parse().unwrap());
        let admin = Actor::new("cid", Role::Admin);

        assert!(!is_moderator(&user));
        assert!(is_moderator(&moderator) && !is_admin(&moderator));
        assert!(is_moderator(&admin) && is_admin(&admin));
        assert!(!is_moderator(&Actor::anonymous()));
    }

    #[test]
    fn unknown_role_is_rejected() {
        assert!("root".parse::<Role>().is_err());
    }
}
