//! Role normalization and the two canonical authorization tiers.
//!
//! Storage holds roles as plain text that historically mixed enum-style and
//! free-form casing ("Administrator", "ADMINISTRATOR", "administrator").
//! Everything is normalized here, at the boundary, into one canonical
//! lower-case form; business logic only ever compares [`Role`] values.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    SystemAdmin,
    Developer,
    Administrator,
    Support,
    Editor,
    Customer,
    Guest,
}

/// Roles allowed through admin-gated endpoints.
pub const ADMIN_TIER: &[Role] = &[Role::SystemAdmin, Role::Developer, Role::Administrator];

/// Roles allowed through system-level endpoints.
pub const SYSTEM_TIER: &[Role] = &[Role::SystemAdmin, Role::Developer];

impl Role {
    /// Parse a stored representation, tolerant of casing. Unknown values
    /// fall back to the least-privileged role rather than failing the
    /// request.
    #[must_use]
    pub fn parse(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "system_admin" => Self::SystemAdmin,
            "developer" => Self::Developer,
            "administrator" => Self::Administrator,
            "support" => Self::Support,
            "editor" => Self::Editor,
            "customer" => Self::Customer,
            _ => Self::Guest,
        }
    }

    /// Canonical lower-case storage/claims form.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::SystemAdmin => "system_admin",
            Self::Developer => "developer",
            Self::Administrator => "administrator",
            Self::Support => "support",
            Self::Editor => "editor",
            Self::Customer => "customer",
            Self::Guest => "guest",
        }
    }

    #[must_use]
    pub fn is_in(self, allowed: &[Role]) -> bool {
        allowed.contains(&self)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::{ADMIN_TIER, Role, SYSTEM_TIER};

    #[test]
    fn parse_is_case_insensitive() {
        assert_eq!(Role::parse("Administrator"), Role::Administrator);
        assert_eq!(Role::parse("SYSTEM_ADMIN"), Role::SystemAdmin);
        assert_eq!(Role::parse("  developer "), Role::Developer);
    }

    #[test]
    fn unknown_roles_degrade_to_guest() {
        assert_eq!(Role::parse("moderator"), Role::Guest);
        assert_eq!(Role::parse(""), Role::Guest);
    }

    #[test]
    fn admin_tier_membership() {
        assert!(Role::parse("Administrator").is_in(ADMIN_TIER));
        assert!(Role::parse("developer").is_in(ADMIN_TIER));
        assert!(!Role::parse("moderator").is_in(ADMIN_TIER));
        assert!(!Role::Customer.is_in(ADMIN_TIER));
    }

    #[test]
    fn system_tier_excludes_plain_administrator() {
        assert!(Role::SystemAdmin.is_in(SYSTEM_TIER));
        assert!(Role::Developer.is_in(SYSTEM_TIER));
        assert!(!Role::Administrator.is_in(SYSTEM_TIER));
    }

    #[test]
    fn display_matches_storage_form() {
        assert_eq!(Role::SystemAdmin.to_string(), "system_admin");
        assert_eq!(Role::Guest.to_string(), "guest");
    }
}
