use std::{env, path::Path, path::PathBuf};

use super::schema::Settings;
use crate::error::{Error, Result};
use crate::hull::MIN_HULL_MEMBERS;
use tracing::warn;

/// Configuration loading helpers.
///
/// `Settings::load` reads an optional config file, then environment variables
/// (prefix `TRACKSPACE__`), and falls back to struct defaults.
impl Settings {
    /// Load settings from the resolved config path and the environment.
    pub fn load() -> Result<Self> {
        Self::load_from(resolve_config_path().as_deref())
    }

    /// Load settings from `path` (if it exists) and the environment.
    pub fn load_from(path: Option<&Path>) -> Result<Self> {
        let mut builder = ::config::Config::builder();

        if let Some(path) = path {
            builder = builder.add_source(::config::File::from(path).required(false));
        }

        builder = builder.add_source(
            ::config::Environment::with_prefix("TRACKSPACE")
                .separator("__")
                .try_parsing(true),
        );

        let cfg = builder.build()?;
        let settings: Settings = cfg.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    /// Like [`Settings::load`], but a missing or invalid configuration falls
    /// back to defaults.
    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_else(|e| {
            warn!(error = %e, "failed to load settings, using defaults");
            Self::default()
        })
    }

    /// Perform basic validation checks on loaded settings.
    pub fn validate(&self) -> Result<()> {
        if self.clustering.clusters == 0 {
            return Err(Error::InvalidParameter {
                name: "clustering.clusters",
                message: "must be at least 1",
            });
        }
        if self.clustering.max_iter == 0 {
            return Err(Error::InvalidParameter {
                name: "clustering.max_iter",
                message: "must be at least 1",
            });
        }
        if !(self.display.radius.is_finite() && self.display.radius > 0.0) {
            return Err(Error::InvalidParameter {
                name: "display.radius",
                message: "must be a positive number",
            });
        }
        if !(self.hull.padding.is_finite() && self.hull.padding >= 0.0) {
            return Err(Error::InvalidParameter {
                name: "hull.padding",
                message: "must be a non-negative number",
            });
        }
        if self.hull.min_members < MIN_HULL_MEMBERS {
            return Err(Error::InvalidParameter {
                name: "hull.min_members",
                message: "must be at least 4",
            });
        }
        Ok(())
    }
}

/// Resolve the config path from `TRACKSPACE_CONFIG_PATH` or XDG defaults.
pub fn resolve_config_path() -> Option<PathBuf> {
    if let Some(p) = env::var_os("TRACKSPACE_CONFIG_PATH") {
        return Some(PathBuf::from(p));
    }
    default_config_path()
}

/// Compute the default config path under `$XDG_CONFIG_HOME/trackspace/config.toml`
/// or `~/.config/trackspace/config.toml` when `XDG_CONFIG_HOME` is not set.
pub fn default_config_path() -> Option<PathBuf> {
    let config_home = if let Some(xdg) = env::var_os("XDG_CONFIG_HOME") {
        Some(PathBuf::from(xdg))
    } else {
        env::var_os("HOME").map(|home| PathBuf::from(home).join(".config"))
    };

    config_home.map(|d| d.join("trackspace").join("config.toml"))
}
