use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Portal a user signs into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Patient,
    Doctor,
    #[serde(alias = "frontline", alias = "frontline-worker", alias = "frontlineWorker")]
    FrontlineWorker,
    Admin,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Patient => write!(f, "patient"),
            Role::Doctor => write!(f, "doctor"),
            Role::FrontlineWorker => write!(f, "frontline_worker"),
            Role::Admin => write!(f, "admin"),
        }
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().replace('-', "_").as_str() {
            "patient" => Ok(Role::Patient),
            "doctor" => Ok(Role::Doctor),
            "frontline_worker" | "frontline" | "frontlineworker" => Ok(Role::FrontlineWorker),
            "admin" => Ok(Role::Admin),
            _ => Err(format!("Unknown role: '{}'", value)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: String,
    pub name: Option<String>,
    pub role: Role,
}

/// Authenticated context handed to whatever needs to act on a user's behalf.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub token: String,
    pub user: User,
    pub created_at: DateTime<Utc>,
}

impl Session {
    pub fn new(token: impl Into<String>, user: User) -> Self {
        Self {
            token: token.into(),
            user,
            created_at: Utc::now(),
        }
    }

    pub fn has_role(&self, role: Role) -> bool {
        self.user.role == role
    }
}

/// Login response returned by the backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: User,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_parses_loosely() {
        assert_eq!("Frontline-Worker".parse::<Role>().unwrap(), Role::FrontlineWorker);
        assert_eq!(" ADMIN ".parse::<Role>().unwrap(), Role::Admin);
        assert!("nurse".parse::<Role>().is_err());
    }

    #[test]
    fn role_serde_uses_snake_case() {
        let json = serde_json::to_string(&Role::FrontlineWorker).unwrap();
        assert_eq!(json, "\"frontline_worker\"");
        let parsed: Role = serde_json::from_str("\"frontlineWorker\"").unwrap();
        assert_eq!(parsed, Role::FrontlineWorker);
    }
}
