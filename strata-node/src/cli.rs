use clap::{Parser, Subcommand};
use strata_precompiles::outpost::memo::SwapMemo;
use strata_types::constants::{DEFAULT_SLIPPAGE_PERCENT, DEFAULT_WINDOW_SECONDS};
use strata_types::primitives::parse_address;
use tracing::info;

use crate::call::{execute_call, CallRequest};
use crate::config::{NodeConfig, CONFIG_FILE_NAME};
use crate::error::NodeError;
use crate::genesis::{apply_genesis, build_precompiles, resolve_precompile};
use crate::ui;

#[derive(Parser)]
#[command(
    name = "strata",
    about = "Strata precompile bridge: ERC-20 and swap precompiles over a native ledger",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Write a development configuration
    Init {
        /// Output directory
        #[arg(short, long, default_value = ".")]
        dir: String,
    },
    /// List the methods a precompile exposes
    Methods {
        /// Path to config file; the dev configuration when omitted
        #[arg(short, long)]
        config: Option<String>,
        /// `erc20:<denom>`, `outpost`, or a hex address; all when omitted
        #[arg(short, long)]
        precompile: Option<String>,
    },
    /// Apply genesis and run one precompile call
    Call {
        /// Path to config file
        #[arg(short, long, default_value = CONFIG_FILE_NAME)]
        config: String,
        /// `erc20:<denom>`, `outpost`, or a hex address
        #[arg(short, long)]
        precompile: String,
        /// Immediate caller (hex address)
        #[arg(long)]
        caller: String,
        /// Transaction origin; defaults to the caller
        #[arg(long)]
        origin: Option<String>,
        /// ABI-encoded call data (hex)
        #[arg(short, long)]
        data: String,
        #[arg(short, long, default_value_t = 10_000_000)]
        gas: u64,
        /// Run as a static call
        #[arg(long)]
        read_only: bool,
    },
    /// Print the memo document a swap would carry
    Memo {
        #[arg(long)]
        output_denom: String,
        /// Receiver on the destination chain
        #[arg(long)]
        receiver: String,
        /// Swap contract on the destination chain
        #[arg(long)]
        contract: String,
        #[arg(long, default_value_t = DEFAULT_SLIPPAGE_PERCENT)]
        slippage: u64,
        #[arg(long, default_value_t = DEFAULT_WINDOW_SECONDS)]
        window: u64,
    },
}

impl Cli {
    /// Config file named on the command line, if any.
    pub fn config_path(&self) -> Option<&str> {
        match &self.command {
            Command::Methods { config, .. } => config.as_deref(),
            Command::Call { config, .. } => Some(config),
            Command::Init { .. } | Command::Memo { .. } => None,
        }
    }
}

fn parse_hex_address(field: &str, value: &str) -> Result<[u8; 20], NodeError> {
    parse_address(value).map_err(|e| NodeError::ConfigError {
        reason: format!("invalid --{}: {}", field, e),
    })
}

pub fn run(cli: Cli) -> Result<(), NodeError> {
    match cli.command {
        Command::Init { dir } => {
            NodeConfig::init(&dir)?;
            info!(dir = %dir, "configuration written");
            println!("Wrote {}/{}", dir, CONFIG_FILE_NAME);
        }
        Command::Methods { config, precompile } => {
            let config = match config {
                Some(path) => NodeConfig::load(&path)?,
                None => NodeConfig::dev(),
            };
            let ledger = apply_genesis(&config)?;
            let set = build_precompiles(&config, &ledger)?;
            match precompile {
                Some(name) => ui::print_methods(resolve_precompile(&set, &name)?.as_ref()),
                None => {
                    for precompile in set.iter() {
                        ui::print_methods(precompile.as_ref());
                    }
                }
            }
        }
        Command::Call {
            config,
            precompile,
            caller,
            origin,
            data,
            gas,
            read_only,
        } => {
            let config = NodeConfig::load(&config)?;
            let caller = parse_hex_address("caller", &caller)?;
            let origin = match origin {
                Some(origin) => parse_hex_address("origin", &origin)?,
                None => caller,
            };
            let input = hex::decode(data.trim_start_matches("0x")).map_err(|e| {
                NodeError::ConfigError {
                    reason: format!("invalid --data: {}", e),
                }
            })?;

            let ledger = apply_genesis(&config)?;
            let set = build_precompiles(&config, &ledger)?;
            let target = resolve_precompile(&set, &precompile)?;
            let report = execute_call(
                &ledger,
                target.as_ref(),
                CallRequest {
                    caller,
                    origin,
                    input,
                    gas,
                    read_only,
                },
            );
            println!("{}", serde_json::to_string_pretty(&report)?);
            if let Some(reason) = report.error {
                return Err(NodeError::Reverted { reason });
            }
        }
        Command::Memo {
            output_denom,
            receiver,
            contract,
            slippage,
            window,
        } => {
            let memo = SwapMemo::new(
                &output_denom,
                &receiver,
                &contract,
                &slippage.to_string(),
                window,
            );
            memo.validate()?;
            println!("{}", memo.to_json()?);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_call_command() {
        let cli = Cli::try_parse_from([
            "strata",
            "call",
            "--precompile",
            "erc20:abridge",
            "--caller",
            "0x0101010101010101010101010101010101010101",
            "--data",
            "0x18160ddd",
            "--read-only",
        ])
        .unwrap();
        assert_eq!(cli.config_path(), Some(CONFIG_FILE_NAME));
        match cli.command {
            Command::Call {
                gas,
                read_only,
                origin,
                ..
            } => {
                assert_eq!(gas, 10_000_000);
                assert!(read_only);
                assert!(origin.is_none());
            }
            _ => panic!("expected call"),
        }
    }

    #[test]
    fn test_memo_defaults() {
        let cli = Cli::try_parse_from([
            "strata",
            "memo",
            "--output-denom",
            "uosmo",
            "--receiver",
            "osmo1receiver",
            "--contract",
            "osmo1contract",
        ])
        .unwrap();
        assert!(cli.config_path().is_none());
        match cli.command {
            Command::Memo {
                slippage, window, ..
            } => {
                assert_eq!(slippage, 5);
                assert_eq!(window, 10);
            }
            _ => panic!("expected memo"),
        }
    }

    #[test]
    fn test_memo_rejects_wide_window() {
        let cli = Cli::try_parse_from([
            "strata",
            "memo",
            "--output-denom",
            "uosmo",
            "--receiver",
            "osmo1receiver",
            "--contract",
            "osmo1contract",
            "--window",
            "61",
        ])
        .unwrap();
        let err = run(cli).unwrap_err();
        assert!(matches!(err, NodeError::PrecompileError(_)));
    }

    #[test]
    fn test_bad_caller_is_config_error() {
        let err = parse_hex_address("caller", "0xzz").unwrap_err();
        assert!(err.to_string().contains("invalid --caller"));
    }
}
