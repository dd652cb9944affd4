//! Session and identity.
//!
//! The authenticated user (or none) drives which cart and wishlist rows
//! are visible and whether the admin surface is available. Sessions are
//! plain data here; how they are minted (OAuth, magic link) belongs to
//! the auth boundary, not this crate.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crafty_spinx_core::{Email, UserId};

/// What a session is allowed to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// May mutate the catalog.
    Admin,
    /// Browse, cart, and wishlist only.
    Shopper,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Admin => write!(f, "admin"),
            Self::Shopper => write!(f, "shopper"),
        }
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Self::Admin),
            "shopper" => Ok(Self::Shopper),
            _ => Err(format!("invalid role: {s}")),
        }
    }
}

/// An authenticated user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub user_id: UserId,
    pub email: Email,
    pub role: Role,
    /// When the backend expires this session, if it told us.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
}

impl Session {
    /// A session without a known expiry.
    #[must_use]
    pub const fn new(user_id: UserId, email: Email, role: Role) -> Self {
        Self {
            user_id,
            email,
            role,
            expires_at: None,
        }
    }

    #[must_use]
    pub const fn is_admin(&self) -> bool {
        matches!(self.role, Role::Admin)
    }

    /// Whether the backend-provided expiry has passed. Sessions without
    /// an expiry never expire locally.
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|expires_at| expires_at <= now)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Duration;

    use super::*;

    fn session(role: Role) -> Session {
        Session::new(
            UserId::random(),
            Email::parse("user@craftyspinx.shop").unwrap(),
            role,
        )
    }

    #[test]
    fn test_role_display_fromstr() {
        for role in [Role::Admin, Role::Shopper] {
            let parsed: Role = role.to_string().parse().unwrap();
            assert_eq!(parsed, role);
        }
        assert!("root".parse::<Role>().is_err());
    }

    #[test]
    fn test_is_admin() {
        assert!(session(Role::Admin).is_admin());
        assert!(!session(Role::Shopper).is_admin());
    }

    #[test]
    fn test_expiry() {
        let now = Utc::now();
        let mut current = session(Role::Shopper);
        assert!(!current.is_expired(now), "no expiry means never expired");

        current.expires_at = Some(now - Duration::minutes(1));
        assert!(current.is_expired(now));

        current.expires_at = Some(now + Duration::minutes(1));
        assert!(!current.is_expired(now));
    }
}
