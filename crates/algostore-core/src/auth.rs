//! Authorization context consumed from the authentication layer
//!
//! The store itself holds no user catalog; the surrounding resource layer
//! resolves the acting user and hands the lifecycle services a `Principal`
//! carrying identity and the reviewer capability.

use serde::{Deserialize, Serialize};

use algostore_state::PrincipalId;

/// An authenticated principal as presented by the authorization middleware.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub id: PrincipalId,
    reviewer: bool,
}

impl Principal {
    /// A principal without the reviewer capability.
    pub fn new(id: &str) -> Self {
        Principal {
            id: PrincipalId(id.to_string()),
            reviewer: false,
        }
    }

    /// A principal holding the reviewer capability.
    pub fn reviewer(id: &str) -> Self {
        Principal {
            id: PrincipalId(id.to_string()),
            reviewer: true,
        }
    }

    /// Whether this principal is allowed to review algorithms.
    pub fn is_reviewer(&self) -> bool {
        self.reviewer
    }
}
