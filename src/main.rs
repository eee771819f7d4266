use chainroute::cli::run_cli;
use chainroute::logging::{init_logging, LogConfig};

fn main() -> anyhow::Result<()> {
    let mut config = LogConfig::from_env();
    if std::env::var_os("CHAINROUTE_LOG_LEVEL").is_none() {
        // Registration chatter is noise for a one-shot inspection command.
        config.log_level = "warn".to_string();
    }
    init_logging(&config)?;
    run_cli()
}
