use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Explorer,
    Vendor,
    Admin,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Role::Explorer => "explorer",
            Role::Vendor => "vendor",
            Role::Admin => "admin",
        };
        f.write_str(s)
    }
}

/// The authenticated caller of an operation.
#[derive(Debug, Clone)]
pub struct Principal {
    pub id: Uuid,
    pub email: String,
    pub role: Role,
}

impl Principal {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// Admins may act on any record; everyone else only on their own.
    pub fn can_access(&self, owner_id: Uuid) -> bool {
        self.is_admin() || self.id == owner_id
    }
}
