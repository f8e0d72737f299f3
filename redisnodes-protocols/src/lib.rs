//! redisnodes protocol implementations
//!
//! This crate holds everything `redisnodes` knows about Redis itself: RESP
//! framing for the single command it sends, and the Redis Cluster topology
//! model built from the `CLUSTER NODES` report.

pub mod redis;

pub use redis::cluster::{
    display_host, parse_cluster_nodes, render_tree, ClusterTopology, HostResolver, MasterOrder,
    NodeRecord, NodeRole, NoopResolver, SystemResolver, TopologyError,
};
pub use redis::resp::{cluster_nodes_command, decode_text_reply, find_reply_end};
