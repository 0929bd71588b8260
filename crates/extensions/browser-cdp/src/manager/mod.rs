//! Browser instance manager.
//!
//! Attaches to a browser on the debug port, or launches one with a persistent
//! profile so site logins survive between runs, and opens the batch tab.

mod manager_batch;
mod manager_core;
mod manager_types;

pub use manager_batch::{BatchTab, OpenMode};
pub use manager_core::BrowserManager;
pub use manager_types::{BrowserError, BrowserManagerConfig};

#[cfg(test)]
#[path = "manager_tests.rs"]
mod tests;
