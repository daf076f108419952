use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use voyage_shared::Masked;

closed_enum! {
    pub enum Role ("role") {
        User => "user",
        Admin => "admin",
        Staff => "staff",
    }
}

impl Default for Role {
    fn default() -> Self {
        Role::User
    }
}

/// Identity record mirrored from the identity provider into `users`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: Masked<String>,
    pub role: Role,
    pub avatar: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_role_is_a_closed_set() {
        assert_eq!(Role::from_str("Admin").unwrap(), Role::Admin);
        assert_eq!(Role::default(), Role::User);
        let err = Role::from_str("superuser").unwrap_err();
        assert!(err.to_string().contains("user|admin|staff"));
    }
}
