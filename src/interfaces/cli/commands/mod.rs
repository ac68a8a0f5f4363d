mod config_gen;
mod import;
mod summarize;

pub use config_gen::config_generate;
pub use import::{import_articles, read_articles_file};
pub use summarize::summarize_day;
