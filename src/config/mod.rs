mod environment;
mod r#impl;
mod structs;

pub use environment::{Environment, load_dotenv};
pub use r#impl::{DEFAULT_CONFIG_PATH, environment, get_config, init_config, init_config_from};
pub use structs::*;
