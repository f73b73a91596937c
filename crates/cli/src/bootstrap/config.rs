use dns_relay_domain::{CliOverrides, Config};
use tracing::info;

/// Load, override and validate the configuration.
///
/// Runs before logging is installed, so the source is logged once the
/// subscriber exists.
pub fn load_config(path: Option<&str>, overrides: CliOverrides) -> anyhow::Result<Config> {
    let config = Config::load(path, overrides)?;
    config.validate()?;
    Ok(config)
}

pub fn log_config_source(path: Option<&str>) {
    match path.map(str::to_string).or_else(Config::get_config_path) {
        Some(path) => info!(path = %path, "Configuration loaded"),
        None => info!("No configuration file found, using defaults"),
    }
}
