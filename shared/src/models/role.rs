//! Role Model

use serde::{Deserialize, Serialize};

/// Caller role carried in the identity claim.
///
/// Any value the identity provider sends that is not recognised becomes
/// [`Role::Unknown`], which sees nothing and may write nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    Manager,
    Accountant,
    Staff,
    Viewer,
    #[serde(other)]
    Unknown,
}

impl Role {
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "admin" => Self::Admin,
            "manager" => Self::Manager,
            "accountant" => Self::Accountant,
            "staff" => Self::Staff,
            "viewer" => Self::Viewer,
            _ => Self::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Manager => "manager",
            Self::Accountant => "accountant",
            Self::Staff => "staff",
            Self::Viewer => "viewer",
            Self::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
