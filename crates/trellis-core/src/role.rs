//! User roles
//!
//! A role selects which realtime channel, endpoint, and event scope a view
//! operates under.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The three user roles of the platform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Publisher,
    Advertiser,
}

impl Role {
    /// All roles, in a fixed order
    pub const ALL: [Role; 3] = [Role::Admin, Role::Publisher, Role::Advertiser];

    /// Lowercase wire name of the role
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Publisher => "publisher",
            Role::Advertiser => "advertiser",
        }
    }

    /// Endpoint path suffix for this role's realtime channel
    pub fn ws_path(&self) -> &'static str {
        match self {
            Role::Admin => "/ws/admin",
            Role::Publisher => "/ws/publisher",
            Role::Advertiser => "/ws/advertiser",
        }
    }

    /// Room identifier for a user under this role, e.g. `"admin:42"`
    pub fn room(&self, user_id: &str) -> String {
        format!("{}:{}", self.as_str(), user_id)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown role name
#[derive(Debug, thiserror::Error)]
#[error("Unknown role: {0}")]
pub struct RoleParseError(pub String);

impl FromStr for Role {
    type Err = RoleParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Role::Admin),
            "publisher" => Ok(Role::Publisher),
            "advertiser" => Ok(Role::Advertiser),
            other => Err(RoleParseError(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_round_trip() {
        for role in Role::ALL {
            assert_eq!(role.as_str().parse::<Role>().unwrap(), role);
        }
    }

    #[test]
    fn test_unknown_role_rejected() {
        assert!("moderator".parse::<Role>().is_err());
    }

    #[test]
    fn test_ws_path_table() {
        assert_eq!(Role::Admin.ws_path(), "/ws/admin");
        assert_eq!(Role::Publisher.ws_path(), "/ws/publisher");
        assert_eq!(Role::Advertiser.ws_path(), "/ws/advertiser");
    }

    #[test]
    fn test_room_format() {
        assert_eq!(Role::Advertiser.room("42"), "advertiser:42");
    }
}
