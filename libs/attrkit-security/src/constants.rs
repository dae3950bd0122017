/// Role name that grants cross-project access.
pub const ADMIN_ROLE: &str = "admin";

/// Roles treated as trusted services when none are configured.
pub const DEFAULT_SERVICE_ROLES: &[&str] = &["advsvc", "service"];
