use lazyload_core::config::AppConfig;
use std::path::Path;

pub fn run(config_path: &Path, name: &str) -> anyhow::Result<()> {
    if AppConfig::init(config_path, name)? {
        println!("Created {}", config_path.display());
    } else {
        println!("{} already exists; left unchanged", config_path.display());
    }
    Ok(())
}
