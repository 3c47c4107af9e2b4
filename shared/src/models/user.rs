//! User Model

use serde::{Deserialize, Serialize};

/// User role
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    #[default]
    Customer,
    Rider,
    Admin,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Customer => "customer",
            Role::Rider => "rider",
            Role::Admin => "admin",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "customer" => Ok(Role::Customer),
            "rider" => Ok(Role::Rider),
            "admin" => Ok(Role::Admin),
            other => Err(format!("unknown role: {}", other)),
        }
    }
}

/// Lifetime delivery counters, updated only on final order completion
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct RiderStats {
    /// Earnings in minor units (centavos)
    pub lifetime_earnings: i64,
    pub total_deliveries: i64,
}

/// User entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// User reference (String ID)
    pub user_id: String,
    pub name: String,
    pub role: Role,
    /// Present for riders only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rider_stats: Option<RiderStats>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_round_trip() {
        for role in [Role::Customer, Role::Rider, Role::Admin] {
            let parsed: Role = role.as_str().parse().unwrap();
            assert_eq!(parsed, role);
        }
        assert!("manager".parse::<Role>().is_err());
    }

    #[test]
    fn test_role_serde() {
        assert_eq!(serde_json::to_string(&Role::Rider).unwrap(), "\"rider\"");
        let parsed: Role = serde_json::from_str("\"admin\"").unwrap();
        assert_eq!(parsed, Role::Admin);
    }
}
