//! Well-known role name constants.
//!
//! These must match the check constraint on `users.role` in
//! `20260301000002_create_users_table.sql`.

pub const ROLE_ADMIN: &str = "admin";
pub const ROLE_STAFF: &str = "staff";

/// All valid role values.
pub const VALID_ROLES: &[&str] = &[ROLE_ADMIN, ROLE_STAFF];
