//! Site catalog loading.

use std::fs;
use std::path::Path;

use chatcast_protocols::SiteHandlersConfig;
use once_cell::sync::OnceCell;
use tracing::debug;

use crate::error::ConfigError;
use crate::loader::ConfigLoader;

/// The catalog shipped with chatcast.
pub const BUILTIN_SITES_JSON: &str = include_str!("../../../config/site-handlers.json");

static BUILTIN: OnceCell<SiteHandlersConfig> = OnceCell::new();

/// The built-in catalog, parsed once.
pub fn builtin_sites() -> Result<&'static SiteHandlersConfig, ConfigError> {
    BUILTIN.get_or_try_init(|| Ok(SiteHandlersConfig::from_json(BUILTIN_SITES_JSON)?))
}

/// Load the catalog at `path`, or the built-in one when no path is configured.
pub fn load_sites(path: Option<&str>) -> Result<SiteHandlersConfig, ConfigError> {
    let Some(path) = path else {
        return builtin_sites().cloned();
    };
    let expanded = ConfigLoader::expand_path(path);
    let path = Path::new(&expanded);
    if !path.exists() {
        return Err(ConfigError::NotFound(path.display().to_string()));
    }
    let catalog = SiteHandlersConfig::from_json(&fs::read_to_string(path)?)?;
    debug!(sites = catalog.sites.len(), "loaded site catalog from {:?}", path);
    Ok(catalog)
}
