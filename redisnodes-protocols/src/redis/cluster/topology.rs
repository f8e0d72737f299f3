//! Redis Cluster membership model
//!
//! A [`ClusterTopology`] maps node ids to [`NodeRecord`]s and remembers the
//! order in which masters should be displayed. Replicas are linked to their
//! master by id while the topology is built; once built it is read-only.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// Role of a cluster member
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeRole {
    Master,
    /// Reported as `slave` on the wire
    Replica,
}

impl NodeRole {
    /// Parse the role out of a `CLUSTER NODES` flags field
    ///
    /// The `myself,` marker of the queried node is stripped first; the rest
    /// must be exactly `master` or `slave`.
    pub fn from_flags(flags: &str) -> Option<Self> {
        match flags.replacen("myself,", "", 1).as_str() {
            "master" => Some(NodeRole::Master),
            "slave" => Some(NodeRole::Replica),
            _ => None,
        }
    }
}

impl fmt::Display for NodeRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeRole::Master => write!(f, "master"),
            NodeRole::Replica => write!(f, "replica"),
        }
    }
}

/// One cluster member, as reported by `CLUSTER NODES`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeRecord {
    /// Node id (40-char hex string on a real cluster)
    pub id: String,
    /// `host:port[@cport[,hostname]]` as reported
    pub address: String,
    /// Resolved host name, or the raw host when resolution failed
    pub display_host: String,
    pub role: NodeRole,
    /// Owning master, replicas only
    pub master_id: Option<String>,
    /// Slot range description, masters only (empty when no slots are owned)
    pub slot_range: String,
    /// Replicas of this master in report order
    pub replica_ids: Vec<String>,
    /// Zero-based line index in the raw report
    pub position: usize,
}

impl NodeRecord {
    pub fn is_master(&self) -> bool {
        self.role == NodeRole::Master
    }
}

/// Order in which masters are rendered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MasterOrder {
    /// First-seen order in the report
    #[default]
    Report,
    /// Lexicographic by node id
    Id,
}

impl FromStr for MasterOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "report" => Ok(MasterOrder::Report),
            "id" => Ok(MasterOrder::Id),
            other => Err(format!("Invalid master order '{other}'. Valid options: report, id")),
        }
    }
}

impl fmt::Display for MasterOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MasterOrder::Report => write!(f, "report"),
            MasterOrder::Id => write!(f, "id"),
        }
    }
}

/// Errors raised while building a topology from a report
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TopologyError {
    /// The flags field names neither `master` nor `slave`
    UnknownRole { line: usize, flags: String },
    /// A field required for the node's role is absent
    MissingField { line: usize, field: &'static str },
    /// Two records share an id
    DuplicateNode { id: String },
    /// A replica points at a master that is not in the report
    UnknownMaster { replica: String, master: String },
}

impl fmt::Display for TopologyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TopologyError::UnknownRole { line, flags } => {
                write!(f, "line {line}: unsupported node flags '{flags}'")
            }
            TopologyError::MissingField { line, field } => {
                write!(f, "line {line}: missing {field} field")
            }
            TopologyError::DuplicateNode { id } => {
                write!(f, "node {id} appears more than once in the report")
            }
            TopologyError::UnknownMaster { replica, master } => {
                write!(f, "replica {replica} references unknown master {master}")
            }
        }
    }
}

impl std::error::Error for TopologyError {}

/// Masters and their replicas, keyed by node id
#[derive(Debug, Clone, Default)]
pub struct ClusterTopology {
    nodes: HashMap<String, NodeRecord>,
    /// Master ids in display order
    masters: Vec<String>,
}

impl ClusterTopology {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a master
    ///
    /// Masters must all be registered before the first replica is linked.
    pub fn insert_master(&mut self, record: NodeRecord) -> Result<(), TopologyError> {
        debug_assert!(record.is_master());
        if self.nodes.contains_key(&record.id) {
            return Err(TopologyError::DuplicateNode { id: record.id });
        }

        self.masters.push(record.id.clone());
        self.nodes.insert(record.id.clone(), record);
        Ok(())
    }

    /// Register a replica and append it to its master's replica list
    pub fn link_replica(&mut self, record: NodeRecord) -> Result<(), TopologyError> {
        debug_assert!(!record.is_master());
        if self.nodes.contains_key(&record.id) {
            return Err(TopologyError::DuplicateNode { id: record.id });
        }

        let master_id = record.master_id.clone().unwrap_or_default();
        match self.nodes.get_mut(&master_id) {
            Some(master) if master.is_master() => master.replica_ids.push(record.id.clone()),
            _ => {
                return Err(TopologyError::UnknownMaster { replica: record.id, master: master_id })
            }
        }

        self.nodes.insert(record.id.clone(), record);
        Ok(())
    }

    /// Reorder masters for display
    pub fn sort_masters(&mut self, order: MasterOrder) {
        match order {
            MasterOrder::Report => {
                let nodes = &self.nodes;
                self.masters.sort_by_key(|id| nodes.get(id).map(|n| n.position));
            }
            MasterOrder::Id => self.masters.sort(),
        }
    }

    pub fn get(&self, id: &str) -> Option<&NodeRecord> {
        self.nodes.get(id)
    }

    /// Masters in display order
    pub fn masters(&self) -> impl Iterator<Item = &NodeRecord> + '_ {
        self.masters.iter().filter_map(move |id| self.nodes.get(id))
    }

    /// Replicas of `master_id` in report order
    pub fn replicas_of<'a>(
        &'a self,
        master_id: &str,
    ) -> impl Iterator<Item = &'a NodeRecord> + 'a {
        self.nodes
            .get(master_id)
            .map(|master| master.replica_ids.as_slice())
            .unwrap_or_default()
            .iter()
            .filter_map(move |id| self.nodes.get(id))
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn master_count(&self) -> usize {
        self.masters.len()
    }

    pub fn replica_count(&self) -> usize {
        self.nodes.len() - self.masters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn master(id: &str, position: usize) -> NodeRecord {
        NodeRecord {
            id: id.to_string(),
            address: format!("10.0.0.{position}:6379"),
            display_host: format!("10.0.0.{position}"),
            role: NodeRole::Master,
            master_id: None,
            slot_range: String::new(),
            replica_ids: Vec::new(),
            position,
        }
    }

    fn replica(id: &str, master_id: &str, position: usize) -> NodeRecord {
        NodeRecord {
            role: NodeRole::Replica,
            master_id: Some(master_id.to_string()),
            ..master(id, position)
        }
    }

    #[test]
    fn test_role_from_flags() {
        assert_eq!(NodeRole::from_flags("master"), Some(NodeRole::Master));
        assert_eq!(NodeRole::from_flags("myself,master"), Some(NodeRole::Master));
        assert_eq!(NodeRole::from_flags("slave"), Some(NodeRole::Replica));
        assert_eq!(NodeRole::from_flags("myself,slave"), Some(NodeRole::Replica));
        assert_eq!(NodeRole::from_flags("master,fail"), None);
        assert_eq!(NodeRole::from_flags("handshake"), None);
    }

    #[test]
    fn test_link_replicas_in_order() {
        let mut topology = ClusterTopology::new();
        topology.insert_master(master("m1", 0)).unwrap();
        topology.link_replica(replica("r2", "m1", 2)).unwrap();
        topology.link_replica(replica("r1", "m1", 1)).unwrap();

        let ids: Vec<&str> = topology.replicas_of("m1").map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["r2", "r1"]);
        assert_eq!(topology.node_count(), 3);
        assert_eq!(topology.master_count(), 1);
        assert_eq!(topology.replica_count(), 2);
    }

    #[test]
    fn test_unknown_master_rejected() {
        let mut topology = ClusterTopology::new();
        topology.insert_master(master("m1", 0)).unwrap();

        let err = topology.link_replica(replica("r1", "nope", 1)).unwrap_err();
        assert_eq!(
            err,
            TopologyError::UnknownMaster { replica: "r1".to_string(), master: "nope".to_string() }
        );
    }

    #[test]
    fn test_replica_of_replica_rejected() {
        let mut topology = ClusterTopology::new();
        topology.insert_master(master("m1", 0)).unwrap();
        topology.link_replica(replica("r1", "m1", 1)).unwrap();

        let err = topology.link_replica(replica("r2", "r1", 2)).unwrap_err();
        assert!(matches!(err, TopologyError::UnknownMaster { .. }));
    }

    #[test]
    fn test_duplicate_rejected() {
        let mut topology = ClusterTopology::new();
        topology.insert_master(master("m1", 0)).unwrap();
        let err = topology.insert_master(master("m1", 1)).unwrap_err();
        assert_eq!(err, TopologyError::DuplicateNode { id: "m1".to_string() });
    }

    #[test]
    fn test_sort_masters() {
        let mut topology = ClusterTopology::new();
        topology.insert_master(master("c", 2)).unwrap();
        topology.insert_master(master("a", 5)).unwrap();
        topology.insert_master(master("b", 0)).unwrap();

        topology.sort_masters(MasterOrder::Report);
        let ids: Vec<&str> = topology.masters().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "c", "a"]);

        topology.sort_masters(MasterOrder::Id);
        let ids: Vec<&str> = topology.masters().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_master_order_from_str() {
        assert_eq!("report".parse::<MasterOrder>(), Ok(MasterOrder::Report));
        assert_eq!("id".parse::<MasterOrder>(), Ok(MasterOrder::Id));
        assert!("alpha".parse::<MasterOrder>().is_err());
        assert_eq!(MasterOrder::default().to_string(), "report");
    }

    #[test]
    fn test_empty_topology() {
        let topology = ClusterTopology::new();
        assert!(topology.is_empty());
        assert_eq!(topology.masters().count(), 0);
        assert_eq!(topology.replicas_of("missing").count(), 0);
    }
}
