//! CLUSTER NODES report parsing
//!
//! Each line of the report describes one cluster member with space-separated
//! fields:
//!
//! ```text
//! <id> <ip:port@cport> <flags> <master> <ping-sent> <pong-recv> <config-epoch> <link-state> <slot> ...
//! ```
//!
//! Only the id, address, flags, master and first slot fields are used.

use super::resolve::{display_host, HostResolver};
use super::topology::{ClusterTopology, MasterOrder, NodeRecord, NodeRole, TopologyError};

const FIELD_ID: usize = 0;
const FIELD_ADDRESS: usize = 1;
const FIELD_FLAGS: usize = 2;
const FIELD_MASTER: usize = 3;
const FIELD_SLOTS: usize = 8;

/// Fewer fields than this ends the report
const MIN_FIELDS: usize = 3;

/// A report line that passed the field-count check
struct NodeLine<'a> {
    position: usize,
    fields: Vec<&'a str>,
    role: NodeRole,
}

/// Parse a `CLUSTER NODES` report into a topology
///
/// Parsing stops at the first line with fewer than three fields (normally the
/// empty line after the final newline); anything after it is ignored. Masters
/// keep their report order. Host names are looked up through `resolver`, and
/// lookup failures fall back to the raw host.
///
/// # Errors
///
/// Fails on flags other than `master`/`slave`, on duplicate ids, and on a
/// replica whose master is not part of the report.
///
/// # Example
///
/// ```
/// use redisnodes_protocols::{parse_cluster_nodes, NoopResolver};
///
/// let report = "\
/// a1 10.0.0.1:6379@16379 myself,master - 0 0 1 connected 0-8191
/// b1 10.0.0.2:6379@16379 slave a1 0 0 1 connected
/// ";
/// let topology = parse_cluster_nodes(report, &NoopResolver).unwrap();
/// assert_eq!(topology.master_count(), 1);
/// assert_eq!(topology.get("a1").unwrap().replica_ids, vec!["b1".to_string()]);
/// ```
pub fn parse_cluster_nodes(
    report: &str,
    resolver: &dyn HostResolver,
) -> Result<ClusterTopology, TopologyError> {
    let lines = split_report(report)?;

    // Stable partition: every master is registered before any replica links to it
    let (masters, replicas): (Vec<NodeLine>, Vec<NodeLine>) =
        lines.into_iter().partition(|line| line.role == NodeRole::Master);

    let mut topology = ClusterTopology::new();
    for line in &masters {
        topology.insert_master(build_record(line, resolver)?)?;
    }
    for line in &replicas {
        topology.link_replica(build_record(line, resolver)?)?;
    }
    topology.sort_masters(MasterOrder::Report);

    tracing::debug!(
        "Parsed {} masters and {} replicas",
        topology.master_count(),
        topology.replica_count()
    );
    Ok(topology)
}

/// Split the report into field lists, stopping at the first short line
fn split_report(report: &str) -> Result<Vec<NodeLine<'_>>, TopologyError> {
    let mut lines = Vec::new();

    for (position, raw) in report.split('\n').enumerate() {
        let raw = raw.strip_suffix('\r').unwrap_or(raw);
        let fields: Vec<&str> = raw.split(' ').collect();

        if fields.len() < MIN_FIELDS {
            tracing::debug!("Report ends at line {} ({} fields)", position + 1, fields.len());
            break;
        }

        let role = NodeRole::from_flags(fields[FIELD_FLAGS]).ok_or_else(|| {
            TopologyError::UnknownRole {
                line: position + 1,
                flags: fields[FIELD_FLAGS].to_string(),
            }
        })?;

        lines.push(NodeLine { position, fields, role });
    }

    Ok(lines)
}

fn build_record(line: &NodeLine, resolver: &dyn HostResolver) -> Result<NodeRecord, TopologyError> {
    let address = line.fields[FIELD_ADDRESS];

    let (master_id, slot_range) = match line.role {
        NodeRole::Master => {
            // Field 3 holds a "-" placeholder for masters
            let slots = line.fields.get(FIELD_SLOTS).copied().unwrap_or_default();
            (None, slots.to_string())
        }
        NodeRole::Replica => {
            let master = line.fields.get(FIELD_MASTER).ok_or(TopologyError::MissingField {
                line: line.position + 1,
                field: "master id",
            })?;
            (Some(master.to_string()), String::new())
        }
    };

    Ok(NodeRecord {
        id: line.fields[FIELD_ID].to_string(),
        address: address.to_string(),
        display_host: display_host(address, resolver),
        role: line.role,
        master_id,
        slot_range,
        replica_ids: Vec::new(),
        position: line.position,
    })
}
