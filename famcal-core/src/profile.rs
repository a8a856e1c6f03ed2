//! User profile with password-expiry state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Per-user profile row, linked one-to-one with the external auth identity.
///
/// Created lazily on the first profile upsert after sign-up. The expiry
/// timestamp is reset to "now + 15 days" whenever the password is changed.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: String,
    /// Identity at the external auth provider.
    pub user_id: String,
    /// Denormalized copy of the provider email.
    pub email: String,
    pub password_expires_at: DateTime<Utc>,
    pub password_change_required: bool,
}

impl UserProfile {
    pub fn is_password_expired(&self, now: DateTime<Utc>) -> bool {
        self.password_expires_at <= now
    }

    /// Whether the access gate should force the user to the password-change
    /// flow: either the stored flag is set or the expiry window has passed.
    pub fn needs_password_change(&self, now: DateTime<Utc>) -> bool {
        self.password_change_required || self.is_password_expired(now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn profile(expires_at: DateTime<Utc>, change_required: bool) -> UserProfile {
        UserProfile {
            id: "p1".to_string(),
            user_id: "u1".to_string(),
            email: "user@example.com".to_string(),
            password_expires_at: expires_at,
            password_change_required: change_required,
        }
    }

    #[test]
    fn expiry_is_inclusive_of_the_deadline() {
        let now = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
        assert!(profile(now, false).is_password_expired(now));
        assert!(profile(now - chrono::Duration::seconds(1), false).is_password_expired(now));
        assert!(!profile(now + chrono::Duration::seconds(1), false).is_password_expired(now));
    }

    #[test]
    fn forced_change_flag_overrides_a_valid_expiry() {
        let now = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
        let p = profile(now + chrono::Duration::days(10), true);
        assert!(!p.is_password_expired(now));
        assert!(p.needs_password_change(now));
    }
}
