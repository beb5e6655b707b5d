//! Identity records stored in the session.

use serde::{Deserialize, Serialize};

/// Role granted to an account
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Authority {
    pub id: u32,
    pub name: String,
}

/// The signed-in account, the application's session identity
///
/// The password hash never leaves the server: it is skipped when the account
/// is serialized into the session and reads back empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub id: u32,
    pub name: String,
    #[serde(skip)]
    pub password: String,
    pub authority: Authority,
}

impl Account {
    pub fn new(id: u32, name: impl Into<String>, authority: Authority) -> Self {
        Self {
            id,
            name: name.into(),
            password: String::new(),
            authority,
        }
    }

    pub fn with_password(mut self, password_hash: impl Into<String>) -> Self {
        self.password = password_hash.into();
        self
    }

    pub fn is_admin(&self) -> bool {
        self.authority.name == "Admin"
    }
}
