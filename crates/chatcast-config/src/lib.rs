//! # chatcast config
//!
//! Runtime configuration (`config/default.toml`) and the site catalog
//! (`config/site-handlers.json`).

mod error;
mod loader;
mod schema;
mod sites;
mod validator;

pub use error::ConfigError;
pub use loader::ConfigLoader;
pub use schema::*;
pub use sites::{builtin_sites, load_sites, BUILTIN_SITES_JSON};
pub use validator::{ConfigValidator, ValidationError, ValidationResult, ValidationWarning};
