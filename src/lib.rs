//! Filing Nets
//!
//! Builds an undirected relationship network from secured-transaction
//! filings and analyses it: connected components ("sub-networks") and
//! centrality distributions over the participants.
//!
//! # Architecture
//!
//! - [`dispatch`]: turns one filing into node and edge declarations,
//!   resolving participant identity and removing within-record duplicates
//! - [`graph`]: the [`Network`] arena that applies declarations, keeps
//!   adjacency and cross-checks itself against another network
//! - [`algo`]: projects a network into a dense view for the connectivity and
//!   ranking engines of the `filing-nets-algorithms` crate
//! - [`persistence`]: save and reload networks (RocksDB)
//! - [`config`]: YAML-loadable tunables for all of the above
//!
//! The network is built single-threaded and is read-only afterwards; the
//! concurrent algorithms share an immutable view.
//!
//! ## Example Usage
//!
//! ```rust
//! use filing_nets::algo::{build_view, crunch_network, CrunchConfig};
//! use filing_nets::dispatch::{Agent, Filing};
//! use filing_nets::graph::Network;
//!
//! let filing = Filing {
//!     original_file_number: 1,
//!     debtors: vec![Agent::individual("Ann", "Lee", "02139")],
//!     securers: vec![Agent::organization("First Bank, Inc.")],
//!     ..Filing::default()
//! };
//!
//! let mut network = Network::new("filings");
//! let stats = network.ingest([filing]);
//! assert_eq!(stats.edges_created, 1);
//!
//! let view = build_view(&network);
//! let partition = crunch_network(&view, &CrunchConfig::default()).unwrap();
//! assert_eq!(partition.len(), 1);
//! ```

#![allow(missing_docs)]
#![warn(clippy::all)]

pub mod algo;
pub mod config;
pub mod dispatch;
pub mod graph;
pub mod persistence;

// Re-export main types for convenience
pub use graph::{
    Edge, EdgeId, EdgeKind, GraphError, GraphResult, IngestStats, Network, Node, NodeId, NodeKind,
    PropertyMap, PropertyValue,
};

pub use dispatch::{Agent, Dispatcher, Filing};

pub use config::{AnalysisConfig, ConfigError};

pub use persistence::{GraphStorage, RocksStorage, StorageError, StorageResult};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Get version string
pub fn version() -> &'static str {
    VERSION
}
