//! Classy - Browse the class hierarchies of a Python framework
//!
//! Imports a Python source tree into a catalog of modules, classes,
//! attributes and methods, then presents each class with its resolution
//! order, inherited attributes and namesake methods, as a static site or
//! over HTTP.

pub mod catalog;
pub mod cli;
pub mod config;
pub mod error;
pub mod highlight;
pub mod importer;
pub mod logging;
pub mod output;
pub mod parser;
pub mod routing;
pub mod server;
pub mod views;

// Re-export main types
pub use catalog::Catalog;
pub use config::Config;
pub use error::{Error, Result};
