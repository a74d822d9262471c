//! Command-line front-end for the Windows port proxy table

mod commands;
mod table;

use anyhow::{Context, Result};
use clap::{Args as ClapArgs, Parser, Subcommand};
use commands::{Commands, DeleteTarget, NewRule, RuleEdit};
use portproxy_core::rule::{validate_connect_address, validate_listen_address};
use portproxy_core::{
    elevation, AddOptions, ConfigLoader, ConfiguredInvoker, PortProxyRepository, RuleGroup,
    RuleKey,
};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "portproxy",
    about = "Manage Windows port proxy rules through netsh",
    version
)]
struct Args {
    /// Enable debug logging
    #[arg(long, short, global = true)]
    verbose: bool,

    /// Config file path (TOML format)
    #[arg(long, short = 'c', value_name = "PATH", global = true)]
    config: Option<PathBuf>,

    /// Do not list the table again after a change
    #[arg(long, global = true)]
    no_refresh: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show all port proxy rules (default)
    List,

    /// Add a rule
    Add(AddArgs),

    /// Add a rule using the group and addresses of a listed rule
    Copy {
        /// Position of the template rule in `list` output
        index: usize,

        /// Listen port of the new rule
        #[arg(long, short = 'p')]
        listen_port: u16,

        /// Connect port (default: same as listen port)
        #[arg(long)]
        connect_port: Option<u16>,
    },

    /// Delete rules by listed position or by key
    Delete(DeleteArgs),

    /// Delete a listed rule and add an edited copy in its place
    Replace(ReplaceArgs),
}

#[derive(ClapArgs, Debug)]
struct AddArgs {
    /// Address family pairing
    #[arg(long, short, value_enum, default_value_t = RuleGroup::V4ToV4)]
    group: RuleGroup,

    /// Local port to listen on
    #[arg(long, short = 'p')]
    listen_port: u16,

    /// Address to forward to
    #[arg(long, short = 'a', value_parser = parse_connect_address)]
    connect_address: String,

    /// Port to forward to (default: same as listen port)
    #[arg(long)]
    connect_port: Option<u16>,

    /// Local address to listen on, an IP or `*`
    #[arg(long, value_parser = parse_listen_address)]
    listen_address: Option<String>,
}

#[derive(ClapArgs, Debug)]
struct DeleteArgs {
    /// Positions of the rules in `list` output
    #[arg(conflicts_with_all = ["group", "listen_port", "listen_address"])]
    indices: Vec<usize>,

    /// Address family pairing of the rule to delete
    #[arg(long, short, value_enum, default_value_t = RuleGroup::V4ToV4)]
    group: RuleGroup,

    /// Listen port of the rule to delete
    #[arg(long, short = 'p', required_unless_present = "indices")]
    listen_port: Option<u16>,

    /// Listen address of the rule to delete
    #[arg(long, value_parser = parse_listen_address)]
    listen_address: Option<String>,

    /// Do not ask for confirmation
    #[arg(long, short)]
    yes: bool,
}

#[derive(ClapArgs, Debug)]
struct ReplaceArgs {
    /// Position of the rule in `list` output
    index: usize,

    #[arg(long, short, value_enum)]
    group: Option<RuleGroup>,

    #[arg(long, value_parser = parse_listen_address)]
    listen_address: Option<String>,

    #[arg(long, short = 'p')]
    listen_port: Option<u16>,

    #[arg(long, short = 'a', value_parser = parse_connect_address)]
    connect_address: Option<String>,

    #[arg(long)]
    connect_port: Option<u16>,

    /// Do not ask for confirmation
    #[arg(long, short)]
    yes: bool,
}

fn parse_listen_address(value: &str) -> std::result::Result<String, String> {
    validate_listen_address(value).map_err(|e| e.to_string())
}

fn parse_connect_address(value: &str) -> std::result::Result<String, String> {
    validate_connect_address(value).map_err(|e| e.to_string())
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        "debug".to_string()
    } else {
        std::env::var("PORTPROXY_LOG").unwrap_or_else(|_| "warn".to_string())
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(args.verbose);

    let config = ConfigLoader::load_with_priority(args.config.clone())
        .context("Failed to load configuration")?;
    tracing::debug!("Configuration: {:?}", config);

    if !elevation::is_elevated() {
        eprintln!(
            "warning: not running as administrator; netsh will refuse to change port proxy rules"
        );
    }

    let invoker = ConfiguredInvoker::new(config.netsh.timeout());
    let repo = PortProxyRepository::with_program(invoker, config.netsh.program.clone());
    let commands = Commands::new(repo, config.cli.refresh_after_change && !args.no_refresh);
    let confirm_delete = config.cli.confirm_delete;

    let code = match args.command.unwrap_or(Command::List) {
        Command::List => commands.list().await?,
        Command::Add(add) => {
            let rule = NewRule {
                group: add.group,
                listen_port: add.listen_port,
                connect_address: add.connect_address,
                options: AddOptions {
                    connect_port: add.connect_port,
                    listen_address: add.listen_address,
                },
            };
            commands.add(&rule).await?
        }
        Command::Copy {
            index,
            listen_port,
            connect_port,
        } => commands.copy(index, listen_port, connect_port).await?,
        Command::Delete(delete) => {
            let target = match delete.listen_port {
                Some(listen_port) => DeleteTarget::Key(RuleKey {
                    group: delete.group,
                    listen_port,
                    listen_address: delete.listen_address,
                }),
                None => DeleteTarget::Indices(delete.indices),
            };
            commands
                .delete(target, confirm_delete && !delete.yes)
                .await?
        }
        Command::Replace(replace) => {
            let edit = RuleEdit {
                group: replace.group,
                listen_address: replace.listen_address,
                listen_port: replace.listen_port,
                connect_address: replace.connect_address,
                connect_port: replace.connect_port,
            };
            commands
                .replace(replace.index, &edit, confirm_delete && !replace.yes)
                .await?
        }
    };

    std::process::exit(code)
}
