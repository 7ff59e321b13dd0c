pub mod app;
pub mod config;
pub mod error;
pub mod logging;
pub mod prompt;
pub mod reconcile;
pub mod scaffold;
pub mod store;

pub use error::{Error, Result};
