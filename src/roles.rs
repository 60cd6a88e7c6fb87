use std::fmt;
use std::str::FromStr;

use anyhow::{bail, Error, Result};
use serde::de::{self, Deserializer};
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};

/// A role held by a user. The set is closed; role names coming from the
/// outside (tokens, database, requests) are matched case-insensitively.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    Admin,
    Customer,
    User,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "Admin",
            Role::Customer => "Customer",
            Role::User => "User",
        }
    }
}

impl FromStr for Role {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "admin" => Ok(Role::Admin),
            "customer" => Ok(Role::Customer),
            "user" => Ok(Role::User),
            _ => bail!("unknown role '{s}'"),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl Serialize for Role {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Role {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(de::Error::custom)
    }
}

/// Parses a comma separated role list, the storage format used by the user
/// table. An empty string yields an error, users always hold at least one
/// role.
pub fn parse_roles(s: &str) -> Result<Vec<Role>> {
    let mut roles = Vec::new();
    for field in s.split(',') {
        let field = field.trim();
        if field.is_empty() {
            continue;
        }
        let role: Role = field.parse()?;
        if !roles.contains(&role) {
            roles.push(role);
        }
    }
    if roles.is_empty() {
        bail!("empty role list");
    }
    Ok(roles)
}

pub fn join_roles(roles: &[Role]) -> String {
    roles
        .iter()
        .map(|r| r.as_str())
        .collect::<Vec<_>>()
        .join(",")
}

/// Any-of membership check used by the authorization guard. Passes when the
/// held set intersects the allowed set.
pub fn contains_any(held: &[Role], allowed: &[Role]) -> bool {
    held.iter().any(|r| allowed.contains(r))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_case_insensitive() {
        assert_eq!("admin".parse::<Role>().unwrap(), Role::Admin);
        assert_eq!("ADMIN".parse::<Role>().unwrap(), Role::Admin);
        assert_eq!("Customer".parse::<Role>().unwrap(), Role::Customer);
        assert_eq!("uSeR".parse::<Role>().unwrap(), Role::User);
        assert!("root".parse::<Role>().is_err());
        assert!("".parse::<Role>().is_err());
    }

    #[test]
    fn test_roundtrip() {
        let roles = vec![Role::Admin, Role::User];
        let joined = join_roles(&roles);
        assert_eq!(joined, "Admin,User");
        assert_eq!(parse_roles(&joined).unwrap(), roles);

        assert_eq!(parse_roles("user, ADMIN").unwrap(), vec![Role::User, Role::Admin]);
        assert_eq!(parse_roles("User,User").unwrap(), vec![Role::User]);
        assert!(parse_roles("").is_err());
        assert!(parse_roles("User,root").is_err());
    }

    #[test]
    fn test_contains_any() {
        let held = vec![Role::User];
        assert!(contains_any(&held, &[Role::User, Role::Admin]));
        assert!(!contains_any(&held, &[Role::Admin]));
        assert!(!contains_any(&held, &[]));
        assert!(!contains_any(&[], &[Role::User, Role::Admin]));

        let multi = vec![Role::Customer, Role::User];
        assert!(contains_any(&multi, &[Role::User]));
        assert!(contains_any(&multi, &[Role::Customer, Role::Admin]));
        assert!(!contains_any(&multi, &[Role::Admin]));
    }
}
