mod builder;
mod defaults;
mod file;
mod models;

pub use builder::{build_epitopes_config, build_rank_config};
pub use file::FileConfig;
pub use models::{BindingSource, EpitopeSourcePath, resolved_config_path};
