//! redisnodes CLI library
//!
//! This library exposes the configuration, report fetching and output pieces of
//! the `redisnodes` binary for testing and reuse.

pub mod config;
pub mod fetch;
pub mod output;

use anyhow::Result;
use redisnodes_protocols::{
    parse_cluster_nodes, render_tree, HostResolver, MasterOrder, NoopResolver, SystemResolver,
};

use config::ToolConfig;
use fetch::ReportSource;

/// Resolver selected by the `[resolve]` section
pub fn host_resolver(config: &ToolConfig) -> Box<dyn HostResolver> {
    if config.resolve.enabled {
        Box::new(SystemResolver::new(config.resolve.timeout))
    } else {
        Box::new(NoopResolver)
    }
}

/// Parse a raw report and render it as tree lines
pub fn build_tree(
    report: &str,
    resolver: &dyn HostResolver,
    order: MasterOrder,
) -> Result<Vec<String>> {
    let mut topology = parse_cluster_nodes(report, resolver)?;
    topology.sort_masters(order);

    tracing::info!(
        "Cluster has {} masters and {} replicas",
        topology.master_count(),
        topology.replica_count()
    );
    Ok(render_tree(&topology))
}

/// Fetch the report from `source` and render it
pub fn fetch_tree(
    source: &mut dyn ReportSource,
    resolver: &dyn HostResolver,
    order: MasterOrder,
) -> Result<Vec<String>> {
    let report = source.fetch_report()?;
    build_tree(&report, resolver, order)
}
