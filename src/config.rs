//! Settings for a pipeline run.
//!
//! The schema lives in [`schema`]; [`Settings::load`] reads it from an optional
//! TOML file and the environment.

mod load;
mod schema;

pub use load::{default_config_path, resolve_config_path};
pub use schema::*;
