//! Store behavior configuration

use serde::{Deserialize, Serialize};

/// Policy configuration for the review lifecycle.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Allow developers to be assigned as reviewers of their own
    /// algorithms. Off by default; intended for development setups only.
    pub review_own_algorithm: bool,
}

impl StoreConfig {
    /// Create a config from environment variables.
    pub fn from_env() -> Self {
        StoreConfig {
            review_own_algorithm: std::env::var("ALGOSTORE_REVIEW_OWN_ALGORITHM")
                .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
                .unwrap_or(false),
        }
    }

    /// Enable or disable the anti-self-review guard override.
    pub fn with_review_own_algorithm(mut self, allow: bool) -> Self {
        self.review_own_algorithm = allow;
        self
    }
}
