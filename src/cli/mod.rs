//! # CLI Module
//!
//! Inspection commands for TOML route tables (see
//! [`routes_file`](crate::routes_file)).
//!
//! ## Commands
//!
//! ### `list`
//!
//! Print every route the table registers, one per line, or as JSON:
//!
//! ```bash
//! chainroute list --routes routes.toml
//! chainroute list --routes routes.toml --json
//! ```
//!
//! ### `match`
//!
//! Build the router with echo handlers, dispatch one request and print the
//! outcome as JSON (`status`, `location`, `handler`, `params`, `trace`):
//!
//! ```bash
//! chainroute match --routes routes.toml GET /api/users/42
//! chainroute match --routes routes.toml --strict false GET /api/users/42/
//! ```

mod commands;

pub use commands::{execute, run_cli, Cli, Commands};
