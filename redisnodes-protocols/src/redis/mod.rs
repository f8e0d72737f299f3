//! Redis protocol support
//!
//! - [`resp`]: RESP framing for the `CLUSTER NODES` request and its reply
//! - [`cluster`]: the master/replica topology parsed from that reply

pub mod cluster;
pub mod resp;
