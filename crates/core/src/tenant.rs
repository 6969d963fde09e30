//! Tenant entity and its subscription/lifecycle invariants.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::id::TenantId;

/// An isolated organizational customer.
///
/// # Invariants
/// - Every tenant-owned record carries this id and is never visible outside
///   requests authenticated for it.
/// - Tenants are only ever soft-deleted (`is_deleted`), never removed.
/// - A subscription is valid only when the flag is set **and** the end date
///   (when present) has not passed; the flag alone is not trusted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tenant {
    pub id: TenantId,
    /// Unique short code (used in URLs/context, not for lookups by id).
    pub code: String,
    pub name: String,
    pub is_active: bool,
    pub is_deleted: bool,
    /// Independently mutable subscription flag (manual-suspension override).
    pub subscription_valid: bool,
    /// Absolute end of the subscription; `None` means open-ended.
    pub subscription_ends_at: Option<DateTime<Utc>>,
    /// Comma-separated list of enabled module names.
    pub enabled_modules: String,
    /// Seat limit; 0 or negative means unlimited.
    pub max_users: i32,
    pub user_count: i32,
}

impl Tenant {
    /// Active and not soft-deleted.
    pub fn is_usable(&self) -> bool {
        self.is_active && !self.is_deleted
    }

    /// Subscription check: both the flag and the date window must hold.
    ///
    /// An expired end date wins over a stale `subscription_valid = true`.
    pub fn subscription_is_valid(&self, now: DateTime<Utc>) -> bool {
        if !self.subscription_valid {
            return false;
        }
        match self.subscription_ends_at {
            None => true,
            Some(ends_at) => ends_at >= now,
        }
    }

    /// Parsed view of `enabled_modules` (trimmed, empty segments dropped).
    pub fn enabled_module_names(&self) -> Vec<&str> {
        self.enabled_modules
            .split(',')
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .collect()
    }

    pub fn has_user_capacity(&self) -> bool {
        self.max_users <= 0 || self.user_count < self.max_users
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn tenant() -> Tenant {
        Tenant {
            id: TenantId::new(1),
            code: "acme".to_string(),
            name: "Acme Corp".to_string(),
            is_active: true,
            is_deleted: false,
            subscription_valid: true,
            subscription_ends_at: None,
            enabled_modules: String::new(),
            max_users: 0,
            user_count: 0,
        }
    }

    #[test]
    fn open_ended_subscription_is_valid() {
        assert!(tenant().subscription_is_valid(Utc::now()));
    }

    #[test]
    fn expired_end_date_beats_stale_valid_flag() {
        let mut t = tenant();
        t.subscription_valid = true;
        t.subscription_ends_at = Some(Utc::now() - Duration::days(1));
        assert!(!t.subscription_is_valid(Utc::now()));
    }

    #[test]
    fn cleared_flag_invalidates_even_with_future_end_date() {
        let mut t = tenant();
        t.subscription_valid = false;
        t.subscription_ends_at = Some(Utc::now() + Duration::days(30));
        assert!(!t.subscription_is_valid(Utc::now()));
    }

    #[test]
    fn end_date_on_the_boundary_is_still_valid() {
        let now = Utc::now();
        let mut t = tenant();
        t.subscription_ends_at = Some(now);
        assert!(t.subscription_is_valid(now));
    }

    #[test]
    fn soft_deleted_tenant_is_not_usable() {
        let mut t = tenant();
        t.is_deleted = true;
        assert!(!t.is_usable());
    }

    #[test]
    fn enabled_modules_parse_trims_and_drops_empties() {
        let mut t = tenant();
        t.enabled_modules = "sales, inventory ,,accounting,".to_string();
        assert_eq!(
            t.enabled_module_names(),
            vec!["sales", "inventory", "accounting"]
        );
        t.enabled_modules = String::new();
        assert!(t.enabled_module_names().is_empty());
    }

    #[test]
    fn user_capacity_respects_unlimited_sentinel() {
        let mut t = tenant();
        t.max_users = 0;
        t.user_count = 1_000;
        assert!(t.has_user_capacity());
        t.max_users = 5;
        t.user_count = 5;
        assert!(!t.has_user_capacity());
    }
}
