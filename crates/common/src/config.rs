use serde::{Deserialize, Serialize};

use crate::crypto::DEFAULT_DERIVATION_PATH;

/// Namehash suffix every username is registered under
pub const DEFAULT_NAME_SUFFIX: &str = "fds";
/// Compare-and-swap attempts before a commit gives up
pub const DEFAULT_MAX_COMMIT_ATTEMPTS: u32 = 3;

/// Protocol parameters.
///
/// Two clients only see each other's accounts when they agree on all of
/// these.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub name_suffix: String,
    pub max_commit_attempts: u32,
    pub derivation_path: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            name_suffix: DEFAULT_NAME_SUFFIX.to_string(),
            max_commit_attempts: DEFAULT_MAX_COMMIT_ATTEMPTS,
            derivation_path: DEFAULT_DERIVATION_PATH.to_string(),
        }
    }
}
