//! Text tree rendering of a cluster topology
//!
//! ```text
//! 07c3... 10.0.0.1 0-5460
//! ├─ 6ec2... 10.0.0.4
//! └─ 824f... 10.0.0.5
//!
//! 67ed... 10.0.0.2 5461-10922
//! └─ 292f... 10.0.0.6
//! ```

use super::topology::{ClusterTopology, NodeRecord};

/// Glyph for a replica with more siblings below it
pub const BRANCH: &str = "├─";
/// Glyph for the last replica of a master
pub const TERMINAL: &str = "└─";

/// Render masters and their replicas, one line per node
///
/// Master blocks are separated by an empty line; there is none after the
/// last block.
pub fn render_tree(topology: &ClusterTopology) -> Vec<String> {
    let master_count = topology.master_count();
    let mut lines = Vec::with_capacity(topology.node_count() + master_count);

    for (index, master) in topology.masters().enumerate() {
        lines.push(master_line(master));

        let replica_count = master.replica_ids.len();
        for (slot, replica_id) in master.replica_ids.iter().enumerate() {
            let Some(replica) = topology.get(replica_id) else {
                continue;
            };
            let glyph = if slot + 1 == replica_count { TERMINAL } else { BRANCH };
            lines.push(replica_line(glyph, replica));
        }

        if index + 1 < master_count {
            lines.push(String::new());
        }
    }

    lines
}

fn master_line(master: &NodeRecord) -> String {
    format!("{} {} {}", master.id, master.display_host, master.slot_range)
}

fn replica_line(glyph: &str, replica: &NodeRecord) -> String {
    format!("{} {} {}", glyph, replica.id, replica.display_host)
}
