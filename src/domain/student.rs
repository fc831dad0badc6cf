use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::id::StudentId;

/// A library member.
///
/// Students are created by self-registration and start unapproved; only an
/// admin can approve, block, flag, or unflag them. Student records are never
/// deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Student {
    /// Unique member id, e.g. `STU-A1B2C3`.
    pub id: StudentId,
    /// Display name.
    pub name: String,
    /// Login email; unique across the membership.
    pub email: String,
    /// SHA-256 hex digest of the password. Never the plaintext.
    password: String,
    /// Whether an admin has approved the account.
    #[serde(default)]
    pub approved: bool,
    /// Sticky late-return penalty flag. Set on any late return; cleared
    /// only by explicit admin action, never by good behaviour.
    #[serde(default)]
    pub flagged: bool,
    /// When the account was registered.
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

impl Student {
    pub(crate) fn new(name: String, email: String, password: &str) -> Self {
        Self {
            id: StudentId::generate(),
            name,
            email,
            password: hash_password(password),
            approved: false,
            flagged: false,
            created_at: Utc::now(),
        }
    }

    /// Checks a plaintext password against the stored digest.
    #[must_use]
    pub fn verify_password(&self, password: &str) -> bool {
        self.password == hash_password(password)
    }
}

fn hash_password(password: &str) -> String {
    let hash = Sha256::digest(password.as_bytes());
    format!("{hash:x}")
}
