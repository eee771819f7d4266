use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use http::header::LOCATION;
use std::io::Write;
use std::path::PathBuf;

use crate::context::{Request, Response};
use crate::routes_file::{RoutesFile, TRACE_HEADER};

/// Command-line interface for inspecting route tables.
#[derive(Parser, Debug)]
#[command(name = "chainroute")]
#[command(about = "Inspect and exercise chainroute route tables", long_about = None)]
pub struct Cli {
    /// The subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List the routes a table registers
    List {
        /// Path to the TOML route table
        #[arg(short, long, env = "CHAINROUTE_ROUTES")]
        routes: PathBuf,

        /// Print a JSON array instead of text
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Dispatch one request against a table and print the outcome
    Match {
        /// Path to the TOML route table
        #[arg(short, long, env = "CHAINROUTE_ROUTES")]
        routes: PathBuf,

        /// Override the table's strict trailing-slash setting
        #[arg(long)]
        strict: Option<bool>,

        /// HTTP method, e.g. GET
        method: String,

        /// Request target, e.g. /users/42?verbose=1
        path: String,
    },
}

/// Parse the process arguments and run the selected command on stdout.
///
/// # Errors
///
/// Returns an error if the route table cannot be read, parsed or
/// registered, or if stdout cannot be written.
pub fn run_cli() -> Result<()> {
    let cli = Cli::parse();
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    execute(&cli.command, &mut out)
}

/// Run one command, writing its output to `out`.
pub fn execute(command: &Commands, out: &mut impl Write) -> Result<()> {
    match command {
        Commands::List { routes, json } => {
            let table = RoutesFile::load(routes)?;
            let router = table.build()?;
            let listed = router.routes();
            if *json {
                let entries: Vec<serde_json::Value> = listed
                    .iter()
                    .map(|r| {
                        serde_json::json!({
                            "method": r.method.as_str(),
                            "path": r.path,
                            "group": if r.group.is_empty() { "/" } else { r.group.as_str() },
                            "plugins": r.plugins,
                        })
                    })
                    .collect();
                serde_json::to_writer_pretty(&mut *out, &entries)?;
                writeln!(out)?;
            } else {
                for route in &listed {
                    writeln!(out, "{:<7} {}", route.method.as_str(), route.path)?;
                }
            }
            Ok(())
        }
        Commands::Match {
            routes,
            strict,
            method,
            path,
        } => {
            let table = RoutesFile::load(routes)?;
            let mut config = table.router;
            if let Some(strict) = strict {
                config.strict = *strict;
            }
            let router = table.build_with(config)?;
            let method = http::Method::from_bytes(method.to_uppercase().as_bytes())
                .with_context(|| format!("invalid HTTP method '{method}'"))?;

            let mut req = Request::new(method, path);
            let mut resp = Response::new();
            router.dispatch(&mut req, &mut resp);

            serde_json::to_writer_pretty(&mut *out, &outcome(&resp))?;
            writeln!(out)?;
            Ok(())
        }
    }
}

fn outcome(resp: &Response) -> serde_json::Value {
    let echoed: Option<serde_json::Value> = serde_json::from_str(&resp.body).ok();
    let trace: Vec<&str> = resp
        .headers
        .get_all(TRACE_HEADER)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .collect();
    let location = resp.headers.get(LOCATION).and_then(|v| v.to_str().ok());
    match echoed {
        Some(echoed) => serde_json::json!({
            "status": resp.status.as_u16(),
            "location": location,
            "handler": echoed["handler"],
            "params": echoed["params"],
            "trace": trace,
        }),
        None => serde_json::json!({
            "status": resp.status.as_u16(),
            "location": location,
            "handler": null,
            "params": {},
            "trace": trace,
            "body": resp.body,
        }),
    }
}
