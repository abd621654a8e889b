//! Persistence layer for filing networks
//!
//! The network core only knows the [`GraphStorage`] capability: save a whole
//! network, load it back by name. How records are laid out and batched is
//! the backend's business; [`RocksStorage`] is the RocksDB backend.

pub mod storage;

pub use storage::{RocksStorage, StorageError, StorageResult};

use crate::graph::Network;

/// Durable home for networks.
///
/// A `load` right after a `save` must rebuild a network that
/// [`Network::compare`] reports identical to the saved one.
pub trait GraphStorage {
    /// Persist every node and edge, replacing whatever was stored under the same name
    fn save(&self, network: &Network) -> StorageResult<()>;

    /// Rebuild a network; an unknown name yields an empty network
    fn load(&self, name: &str) -> StorageResult<Network>;
}
