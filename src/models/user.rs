use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Dietitian,
    #[default]
    Staff,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Admin => write!(f, "admin"),
            Role::Dietitian => write!(f, "dietitian"),
            Role::Staff => write!(f, "staff"),
        }
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "admin" => Ok(Role::Admin),
            "dietitian" => Ok(Role::Dietitian),
            "staff" => Ok(Role::Staff),
            _ => Err(format!(
                "Invalid role '{}'. Valid options: admin, dietitian, staff",
                s
            )),
        }
    }
}

/// A staff account. Password material stays in the database layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub full_name: String,
    pub role: Role,
    pub must_change_password: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn display_name(&self) -> &str {
        if self.full_name.is_empty() {
            &self.username
        } else {
            &self.full_name
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_roundtrip_through_display() {
        for role in [Role::Admin, Role::Dietitian, Role::Staff] {
            assert_eq!(Role::from_str(&role.to_string()).unwrap(), role);
        }
        assert!(Role::from_str("nurse").is_err());
    }

    #[test]
    fn test_display_name_falls_back_to_username() {
        let now = Utc::now();
        let mut user = User {
            id: Uuid::new_v4(),
            username: "jdoe".into(),
            full_name: String::new(),
            role: Role::Staff,
            must_change_password: false,
            created_at: now,
            updated_at: now,
        };
        assert_eq!(user.display_name(), "jdoe");
        user.full_name = "Jane Doe".into();
        assert_eq!(user.display_name(), "Jane Doe");
    }
}
