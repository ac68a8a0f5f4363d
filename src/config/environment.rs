//! Runtime profile selection
//!
//! The `ENVIRONMENT` variable picks the profile. `dev` (or `development`)
//! selects the local development profile, everything else is production.

use std::path::PathBuf;

use strum::{AsRefStr, Display};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, AsRefStr, Display)]
#[strum(serialize_all = "lowercase")]
pub enum Environment {
    Development,
    #[default]
    Production,
}

impl Environment {
    pub const VAR: &'static str = "ENVIRONMENT";

    /// Read the profile from the process environment
    pub fn from_env() -> Self {
        Self::from_value(std::env::var(Self::VAR).ok().as_deref())
    }

    pub fn from_value(value: Option<&str>) -> Self {
        match value.map(|v| v.trim().to_ascii_lowercase()) {
            Some(v) if v == "dev" || v == "development" => Self::Development,
            _ => Self::Production,
        }
    }

    pub fn is_development(self) -> bool {
        self == Self::Development
    }
}

/// Load `.env` from the working directory, development profile only
///
/// Returns the path of the loaded file, if any.
pub fn load_dotenv(env: Environment) -> Option<PathBuf> {
    if !env.is_development() {
        return None;
    }
    dotenvy::dotenv().ok()
}
