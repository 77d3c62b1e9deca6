use std::path::Path;

use anyhow::Result;

use telar_core::AppConfig;

pub fn run(config: &AppConfig, explicit: Option<&Path>) -> Result<()> {
    let path = explicit
        .map(Path::to_path_buf)
        .unwrap_or_else(AppConfig::config_path);
    let state = if path.exists() { "" } else { " (not found, using defaults)" };

    println!("# {}{}", path.display(), state);
    print!("{}", config.to_toml()?);
    Ok(())
}
