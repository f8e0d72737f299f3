//! Redis Cluster topology
//!
//! This module turns a `CLUSTER NODES` report into a master/replica model and
//! renders it as a tree:
//! - Membership model and referential checks ([`topology`])
//! - Report parsing ([`nodes_parser`])
//! - Best-effort reverse lookups for node hosts ([`resolve`])
//! - Tree rendering ([`render`])

pub mod nodes_parser;
pub mod render;
pub mod resolve;
pub mod topology;

pub use nodes_parser::parse_cluster_nodes;
pub use render::{render_tree, BRANCH, TERMINAL};
pub use resolve::{display_host, HostResolver, NoopResolver, SystemResolver};
pub use topology::{ClusterTopology, MasterOrder, NodeRecord, NodeRole, TopologyError};
