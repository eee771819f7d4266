//! # Router Configuration
//!
//! Dispatch behaviour that is fixed when a [`Router`](crate::router::Router)
//! is built.
//!
//! ## Sources
//!
//! - Code: `RouterConfig { strict: false, ..RouterConfig::default() }`
//! - TOML: the `[router]` table of a route file (see
//!   [`routes_file`](crate::routes_file))
//! - Environment, via [`RouterConfig::from_env`]:
//!
//! | Variable                          | Field                 | Default |
//! |-----------------------------------|-----------------------|---------|
//! | `CHAINROUTE_STRICT`               | `strict`              | `true`  |
//! | `CHAINROUTE_REDIRECT_FIXED_PATH`  | `redirect_fixed_path` | `true`  |
//!
//! Boolean variables accept `1/0`, `true/false`, `yes/no` and `on/off`.
//! Unparseable values fall back to the default.
//!
//! ```rust
//! use chainroute::config::RouterConfig;
//!
//! let config = RouterConfig::from_env();
//! println!("strict trailing slashes: {}", config.strict);
//! ```

use serde::Deserialize;
use std::env;

pub const ENV_STRICT: &str = "CHAINROUTE_STRICT";
pub const ENV_REDIRECT_FIXED_PATH: &str = "CHAINROUTE_REDIRECT_FIXED_PATH";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RouterConfig {
    /// Treat a trailing-slash mismatch as not found instead of redirecting.
    pub strict: bool,
    /// Redirect non-canonical paths (`//`, `.`, `..`) to their cleaned form.
    /// When off, the cleaned path is matched directly.
    pub redirect_fixed_path: bool,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            strict: true,
            redirect_fixed_path: true,
        }
    }
}

impl RouterConfig {
    /// Load configuration from environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            strict: lookup(ENV_STRICT)
                .and_then(|v| parse_bool(&v))
                .unwrap_or(defaults.strict),
            redirect_fixed_path: lookup(ENV_REDIRECT_FIXED_PATH)
                .and_then(|v| parse_bool(&v))
                .unwrap_or(defaults.redirect_fixed_path),
        }
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
