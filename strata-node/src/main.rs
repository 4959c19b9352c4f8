use clap::Parser;
use strata_node::cli;
use strata_node::config::NodeConfig;
use tracing_subscriber::EnvFilter;

/// `RUST_LOG` wins; otherwise the config file's `logging.level`, otherwise
/// `info`.
fn env_filter(cli: &cli::Cli) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = cli
            .config_path()
            .and_then(|path| NodeConfig::load(path).ok())
            .map(|config| config.logging.level)
            .unwrap_or_else(|| "info".to_string());
        EnvFilter::try_new(&level).unwrap_or_else(|_| EnvFilter::new("info"))
    })
}

fn main() {
    let cli = cli::Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(env_filter(&cli))
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = cli::run(cli) {
        tracing::error!("{}", e);
        std::process::exit(1);
    }
}
