use serde::{Deserialize, Serialize};

/// Staff role stored on the user profile.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    #[serde(rename = "kasir")]
    Cashier,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Cashier => "kasir",
        }
    }

    /// Label shown next to the user's name.
    pub fn label(&self) -> &'static str {
        match self {
            Role::Admin => "Admin",
            Role::Cashier => "Kasir",
        }
    }
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}
