use std::sync::{Arc, OnceLock};

use arc_swap::ArcSwap;

use super::{Environment, StaticConfig};

static CONFIG: OnceLock<ArcSwap<StaticConfig>> = OnceLock::new();
static ENVIRONMENT: OnceLock<Environment> = OnceLock::new();

/// Default configuration file, relative to the working directory
pub const DEFAULT_CONFIG_PATH: &str = "config.toml";

/// Get the global configuration instance
///
/// Returns an Arc pointer to the configuration, which is cheap to clone
/// and doesn't hold any locks.
pub fn get_config() -> Arc<StaticConfig> {
    CONFIG
        .get()
        .expect("Config not initialized. Call init_config() first.")
        .load_full()
}

/// Runtime profile, read from `ENVIRONMENT` on first use
pub fn environment() -> Environment {
    *ENVIRONMENT.get_or_init(Environment::from_env)
}

/// Initialize the global configuration from `config.toml`
///
/// If the file doesn't exist, uses in-memory defaults plus environment
/// overrides.
///
/// # Examples
/// ```no_run
/// use newsdigest::config::init_config;
/// init_config();
/// ```
pub fn init_config() {
    init_config_from(DEFAULT_CONFIG_PATH);
}

/// Initialize the global configuration from the given TOML file
///
/// In the development profile `.env` is loaded first so that its values
/// take part in the environment overrides. Only the first call has effect.
pub fn init_config_from(path: &str) {
    CONFIG.get_or_init(|| {
        let env = environment();
        if let Some(dotenv_path) = super::load_dotenv(env) {
            eprintln!("[INFO] Loaded environment from: {}", dotenv_path.display());
        }
        ArcSwap::from_pointee(StaticConfig::load_from(path))
    });
}
