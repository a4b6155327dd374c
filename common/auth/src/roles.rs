pub const ROLE_ADMIN: &str = "ADMIN";
pub const ROLE_USER: &str = "USER";

pub const KNOWN_ROLES: &[&str] = &[ROLE_ADMIN, ROLE_USER];
