use clap::{CommandFactory, Parser};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use redisnodes_cli::config::ToolConfig;
use redisnodes_cli::fetch::{ClusterNodesClient, ReportSource};
use redisnodes_cli::{build_tree, host_resolver, output};

/// redisnodes: print the master/replica tree of a Redis Cluster
///
/// Sends CLUSTER NODES to one node and prints every master followed by its
/// replicas.
///
/// Example usage:
///   redisnodes
///   redisnodes -s 10.0.0.1:7000
///   redisnodes -c cluster.toml --set target.read_timeout=10s
///   redisnodes -s :7000 --no-resolve --order id
#[derive(Parser)]
#[command(name = "redisnodes")]
#[command(version, about = "Print the master/replica tree of a Redis Cluster", long_about = None)]
struct Cli {
    /// Cluster node to query (host:port, ":port" for localhost)
    #[arg(short = 's', long, value_name = "HOST:PORT")]
    server: Option<String>,

    /// Path to a TOML configuration file
    #[arg(short = 'c', long)]
    config: Option<PathBuf>,

    /// Override any configuration value using dot notation (can be specified multiple times)
    ///
    /// Examples:
    ///   --set target.address=127.0.0.1:7000
    ///   --set target.read_timeout=10s
    ///   --set resolve.enabled=false
    #[arg(long = "set", value_name = "KEY=VALUE")]
    set: Vec<String>,

    /// Print raw hosts instead of reverse-resolved names
    #[arg(long)]
    no_resolve: bool,

    /// Master order: report (as listed by the node) or id
    #[arg(long, value_name = "ORDER")]
    order: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short = 'l', long, default_value = "warn")]
    log_level: String,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr, the tree owns stdout
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| cli.log_level.clone().into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = load_config(&cli)?;
    tracing::debug!("Configuration: {:?}", config);

    let mut client = ClusterNodesClient::tcp(
        &config.target.address,
        config.target.connect_timeout,
        config.target.read_timeout,
    )?;

    let report = match client.fetch_report() {
        Ok(report) => report,
        Err(e) => {
            eprintln!("{e:#}");
            eprintln!("{}", Cli::command().render_help());
            std::process::exit(1);
        }
    };

    let resolver = host_resolver(&config);
    let lines = build_tree(&report, resolver.as_ref(), config.master_order()?)?;
    output::print_tree(&lines)
}

/// Defaults, then the config file, then --set, then dedicated flags
fn load_config(cli: &Cli) -> anyhow::Result<ToolConfig> {
    let mut config = ToolConfig::load(cli.config.as_deref(), &cli.set)?;

    if let Some(server) = &cli.server {
        config.target.address = server.clone();
    }
    if cli.no_resolve {
        config.resolve.enabled = false;
    }
    if let Some(order) = &cli.order {
        config.output.order = order.clone();
    }

    config.validate()?;
    Ok(config)
}
