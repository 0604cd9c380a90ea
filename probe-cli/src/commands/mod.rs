//! CLI command implementations

pub mod config;
pub mod load;
pub mod preflight;
pub mod run;

pub use config::{handle_config_generate, handle_config_show, handle_config_validate};
pub use load::handle_load;
pub use preflight::handle_preflight;
pub use run::handle_run;

use std::path::{Path, PathBuf};

/// Directory a JSON report goes to, if one should be written at all
fn report_dir(config: &probe_config::ReportConfig, output: Option<&Path>) -> Option<PathBuf> {
    match output {
        Some(dir) => Some(dir.to_path_buf()),
        None if config.write_json => Some(config.output_dir.clone()),
        None => None,
    }
}
